//! HTTP service and CLI for the planning calendar feed.
//!
//! The service fetches the published planning page on every request and
//! answers with a freshly rendered ICS document:
//!
//! ```text
//! client ──GET /jr.ics──▶ calendar_feed ──fetch_html()──▶ ScheduleSource
//!                              │
//!                              ▼
//!                       CalendarPipeline::render_at() ──▶ text/calendar
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use routes::{AppState, build_router, render_feed};
