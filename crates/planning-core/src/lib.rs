//! Core pipeline: schedule table parsing, shift extraction, timezone
//! normalization and ICS encoding.
//!
//! The pipeline is a pure, synchronous transform from the published planning
//! HTML to `text/calendar` output:
//!
//! ```text
//! HTML ──parse_rows()──▶ RowRecord ──ShiftExtractor──▶ ShiftAssignment
//!                                                          │
//!                             ZoneResolver::normalize() ◀──┘
//!                                        │
//!                                        ▼
//!                            CalendarDocument::encode() ──▶ ICS text
//! ```
//!
//! [`CalendarPipeline`] wires the stages together from a [`PipelineConfig`].

pub mod config;
pub mod error;
pub mod extract;
pub mod ics;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod tracing;
pub mod zone;

pub use config::{DEFAULT_MARKER, DEFAULT_UID_DOMAIN, DEFAULT_ZONE, PipelineConfig};
pub use error::{EncodeError, EncodeResult};
pub use extract::{DateRange, RowSkip, ShiftAssignment, ShiftExtractor, marker_matches, parse_civil_date};
pub use ics::{CalendarDocument, CalendarEvent, DecodedEvent, VTimezone, decode_events};
pub use pipeline::CalendarPipeline;
pub use schema::{RoomSchema, ShiftWindow};
pub use table::{RowRecord, parse_rows};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use zone::{OffsetTransition, OutputMode, ZoneOffset, ZoneResolver, ZonedInstant};
