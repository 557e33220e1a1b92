//! Server error types.

use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use planning_core::EncodeError;
use planning_source::SourceError;
use thiserror::Error;

/// Body sent when the planning page cannot be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "Erreur lors de la récupération du planning";

/// Body sent when the feed cannot be encoded.
pub const ENCODE_FAILED_MESSAGE: &str = "Erreur ICS";

/// Body sent for any other failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Erreur interne du serveur ICS";

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket or file access failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file or flags are invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The planning page could not be obtained.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The calendar could not be produced.
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status and body returned to feed clients.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Source(_) => (StatusCode::BAD_GATEWAY, FETCH_FAILED_MESSAGE),
            Self::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, ENCODE_FAILED_MESSAGE),
            Self::Io(_) | Self::Config { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.status_and_message().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planning_source::SourceErrorCode;

    #[test]
    fn source_failures_are_bad_gateway() {
        let err = ServerError::from(SourceError::new(SourceErrorCode::Timeout, "slow"));
        assert_eq!(
            err.status_and_message(),
            (StatusCode::BAD_GATEWAY, FETCH_FAILED_MESSAGE)
        );
    }

    #[test]
    fn encode_failures_are_internal() {
        let err = ServerError::from(EncodeError::UnknownZone {
            zone: "Mars/Olympus".to_string(),
        });
        assert_eq!(
            err.status_and_message(),
            (StatusCode::INTERNAL_SERVER_ERROR, ENCODE_FAILED_MESSAGE)
        );
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn other_failures_use_generic_message() {
        let err = ServerError::config("bad route");
        assert_eq!(err.status_and_message().1, INTERNAL_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "Configuration error: bad route");
    }
}
