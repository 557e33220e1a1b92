//! Errors raised while fetching the planning page.

use std::fmt;
use thiserror::Error;

/// The category of a source error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorCode {
    /// Connection refused, DNS failure, TLS failure.
    Network,
    /// No complete response within the configured timeout.
    Timeout,
    /// Upstream answered with a non-success status other than 5xx.
    UpstreamStatus,
    /// Upstream answered with a 5xx status.
    ServerError,
    /// The response body could not be read or decoded.
    InvalidBody,
    /// The source is misconfigured (bad URL, client setup failure).
    Configuration,
}

impl SourceErrorCode {
    /// Returns true if the fetch may succeed when attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::ServerError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network_error",
            Self::Timeout => "timeout",
            Self::UpstreamStatus => "upstream_status",
            Self::ServerError => "server_error",
            Self::InvalidBody => "invalid_body",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure to obtain the planning HTML.
#[derive(Debug, Error)]
pub struct SourceError {
    code: SourceErrorCode,
    message: String,
    /// Location that was being fetched.
    url: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            url: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::Timeout, message)
    }

    pub fn upstream_status(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::UpstreamStatus, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ServerError, message)
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InvalidBody, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::Configuration, message)
    }

    /// Sets the URL that was being fetched.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> SourceErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref url) = self.url {
            write!(f, " ({})", url)?;
        }
        Ok(())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_codes() {
        assert!(SourceErrorCode::Network.is_retryable());
        assert!(SourceErrorCode::Timeout.is_retryable());
        assert!(SourceErrorCode::ServerError.is_retryable());
        assert!(!SourceErrorCode::UpstreamStatus.is_retryable());
        assert!(!SourceErrorCode::InvalidBody.is_retryable());
        assert!(!SourceErrorCode::Configuration.is_retryable());
    }

    #[test]
    fn display_includes_url() {
        let err = SourceError::server("status 503").with_url("https://example.org/planning.htm");
        assert_eq!(
            err.to_string(),
            "server_error: status 503 (https://example.org/planning.htm)"
        );
        assert_eq!(SourceError::timeout("slow").to_string(), "timeout: slow");
    }

    #[test]
    fn chained_cause() {
        use std::error::Error;
        let err = SourceError::invalid_body("unreadable").with_source(std::io::Error::other("reset"));
        assert_eq!(err.code(), SourceErrorCode::InvalidBody);
        assert!(err.source().is_some());
        assert!(err.url().is_none());
    }
}
