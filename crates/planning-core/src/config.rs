//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::extract::DateRange;
use crate::schema::RoomSchema;
use crate::zone::OutputMode;

/// Default zone of the clinic.
pub const DEFAULT_ZONE: &str = "Europe/Paris";

/// Default tracked marker token.
pub const DEFAULT_MARKER: &str = "JR";

/// Default domain part of event UIDs.
pub const DEFAULT_UID_DOMAIN: &str = "planning-ics";

/// Options of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// IANA zone the planning's wall-clock times are in.
    pub zone: String,
    /// How event times are written.
    pub output_mode: OutputMode,
    /// Token identifying the tracked physician in table cells.
    pub marker: String,
    /// Only keep shifts within this range.
    pub date_range: Option<DateRange>,
    /// Domain part of event UIDs.
    pub uid_domain: String,
    /// Table layout.
    pub schema: RoomSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zone: DEFAULT_ZONE.to_string(),
            output_mode: OutputMode::default(),
            marker: DEFAULT_MARKER.to_string(),
            date_range: None,
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
            schema: RoomSchema::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the zone.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Builder: set the output mode.
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Builder: set the marker token.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Builder: set the date range.
    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    /// Builder: set the UID domain.
    pub fn with_uid_domain(mut self, domain: impl Into<String>) -> Self {
        self.uid_domain = domain.into();
        self
    }

    /// Builder: set the table layout.
    pub fn with_schema(mut self, schema: RoomSchema) -> Self {
        self.schema = schema;
        self
    }
}
