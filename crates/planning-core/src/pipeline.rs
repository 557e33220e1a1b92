//! HTML-to-ICS pipeline.
//!
//! [`CalendarPipeline`] owns one validated [`PipelineConfig`] and runs the
//! four stages on demand. Each run is independent; nothing is cached.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::EncodeResult;
use crate::extract::{DateRange, ShiftAssignment, ShiftExtractor};
use crate::ics::{CalendarDocument, CalendarEvent, VTimezone, event_uid};
use crate::table::parse_rows;
use crate::zone::{OutputMode, ZoneResolver, ZonedInstant};

/// Furthest the `VTIMEZONE` block reaches from the generation year, either way.
pub const TIMEZONE_SPAN_YEARS: i32 = 5;

/// Turns planning HTML into a calendar feed.
#[derive(Debug, Clone)]
pub struct CalendarPipeline {
    config: PipelineConfig,
    zone: ZoneResolver,
}

impl CalendarPipeline {
    /// Creates a pipeline, validating the configured zone.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EncodeError::UnknownZone`] for an unknown zone identifier.
    pub fn new(config: PipelineConfig) -> EncodeResult<Self> {
        let zone = ZoneResolver::new(&config.zone)?;
        Ok(Self { config, zone })
    }

    /// Returns a copy of this pipeline restricted to `range`.
    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.config.date_range = range;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The resolved zone.
    pub fn zone(&self) -> &ZoneResolver {
        &self.zone
    }

    /// Runs the table parser and shift extractor.
    pub fn extract(&self, html: &str) -> Vec<ShiftAssignment> {
        let rows = parse_rows(html);
        ShiftExtractor::new(&self.config.schema, &self.config.marker)
            .with_range(self.config.date_range)
            .extract(&rows)
    }

    /// Builds the calendar document for `assignments`, stamped with `now`.
    pub fn build_document(
        &self,
        assignments: &[ShiftAssignment],
        now: DateTime<Utc>,
    ) -> EncodeResult<CalendarDocument> {
        let mode = self.config.output_mode;
        let mut ordinals: HashMap<DateTime<Utc>, usize> = HashMap::new();
        let mut events = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let start_utc = self.zone.to_utc(assignment.local_start())?;
            let ordinal = ordinals.entry(start_utc).or_insert(0);
            let uid = event_uid(start_utc, *ordinal, &self.config.uid_domain);
            *ordinal += 1;

            let start = match mode {
                OutputMode::Utc => ZonedInstant::Utc(start_utc),
                OutputMode::LocalWithZoneId => {
                    self.zone.normalize(assignment.local_start(), mode)?
                }
            };
            let end = self.zone.normalize(assignment.local_end(), mode)?;

            events.push(CalendarEvent {
                uid,
                title: assignment.title(&self.config.marker),
                start,
                end,
            });
        }

        let mut document = CalendarDocument::new(now).with_events(events);
        if mode == OutputMode::LocalWithZoneId {
            let (from_year, to_year) = self.timezone_years(assignments, now);
            document = document.with_timezone(VTimezone::for_years(&self.zone, from_year, to_year));
        }
        Ok(document)
    }

    /// Renders `html` as ICS text, stamped with the current time.
    pub fn render(&self, html: &str) -> EncodeResult<String> {
        self.render_at(html, Utc::now())
    }

    /// Renders `html` as ICS text, stamped with `now`.
    pub fn render_at(&self, html: &str, now: DateTime<Utc>) -> EncodeResult<String> {
        let assignments = self.extract(html);
        let document = self.build_document(&assignments, now)?;
        info!(
            marker = %self.config.marker,
            events = document.events.len(),
            mode = %self.config.output_mode,
            "Rendered planning calendar"
        );
        Ok(document.encode())
    }

    /// Years the `VTIMEZONE` block must cover: from the year before the
    /// first shift through the year of the last one, clamped to
    /// [`TIMEZONE_SPAN_YEARS`] around the generation year.
    fn timezone_years(&self, assignments: &[ShiftAssignment], now: DateTime<Utc>) -> (i32, i32) {
        let year = now.year();
        let years = assignments.iter().map(|a| a.date.year());
        match (years.clone().min(), years.max()) {
            (Some(first), Some(last)) => {
                let (low, high) = (year - TIMEZONE_SPAN_YEARS, year + TIMEZONE_SPAN_YEARS);
                ((first - 1).clamp(low, high), last.clamp(low, high))
            }
            _ => (year, year),
        }
    }
}
