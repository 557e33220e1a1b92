//! Where the planning HTML comes from.
//!
//! - [`ScheduleSource`] - the trait the server fetches through
//! - [`HttpSource`] - GET with timeout and exponential-backoff retry
//! - [`StaticSource`], [`FailingSource`] - fixed outcomes for tests and offline runs
//! - [`SourceError`] - failure taxonomy, every variant meaning "no planning available"
//!
//! ```ignore
//! use planning_source::{HttpSource, HttpSourceConfig, ScheduleSource};
//!
//! let source = HttpSource::new(HttpSourceConfig::clinic()?)?;
//! let html = source.fetch_html().await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod source;

pub use config::{DEFAULT_PLANNING_URL, HttpSourceConfig, RetryPolicy};
pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use http::HttpSource;
pub use source::{BoxFuture, FailingSource, ScheduleSource, StaticSource};
