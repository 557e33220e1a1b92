//! Encoding error types.
//!
//! Malformed planning rows are never errors (they are skipped during
//! extraction). The only failures the pipeline reports are the ones that
//! prevent producing a valid calendar document.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that make it impossible to produce a calendar document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The configured timezone is not a known IANA zone identifier.
    #[error("unknown timezone: {zone}")]
    UnknownZone { zone: String },

    /// A local time could not be mapped to an instant in the zone.
    #[error("local time {local} cannot be represented in {zone}")]
    UnrepresentableTime { local: NaiveDateTime, zone: String },
}

impl EncodeError {
    /// Creates an unknown zone error.
    pub fn unknown_zone(zone: impl Into<String>) -> Self {
        Self::UnknownZone { zone: zone.into() }
    }
}
