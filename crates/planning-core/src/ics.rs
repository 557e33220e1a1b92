//! iCalendar (RFC 5545) encoding and decoding.
//!
//! [`CalendarDocument::encode`] writes the feed: CRLF line endings, content
//! lines folded at 75 octets, TEXT values escaped. [`decode_events`] reads a
//! feed back with the `icalendar` crate.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event};
use tracing::{debug, warn};

use crate::zone::{OffsetTransition, ZoneOffset, ZoneResolver, ZonedInstant};

/// Default `PRODID` of generated feeds.
pub const DEFAULT_PRODID: &str = "-//planning-ics//Planning JR//FR";

/// Maximum length of a content line, in octets, before folding.
const FOLD_WIDTH: usize = 75;

/// A single non-recurring event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Stable unique identifier.
    pub uid: String,
    /// `SUMMARY` text.
    pub title: String,
    /// `DTSTART`.
    pub start: ZonedInstant,
    /// `DTEND`.
    pub end: ZonedInstant,
}

/// Builds the UID of an event from its UTC start and its position among
/// events sharing that start.
pub fn event_uid(start: DateTime<Utc>, ordinal: usize, domain: &str) -> String {
    format!("{}-{}@{}", start.format("%Y%m%dT%H%M%SZ"), ordinal, domain)
}

/// A `VTIMEZONE` definition built from a zone's offset changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTimezone {
    /// Zone identifier, referenced by `TZID` parameters.
    pub tzid: String,
    /// Offset changes, oldest first.
    pub transitions: Vec<OffsetTransition>,
    /// Offset used when there are no changes in the covered years.
    pub fallback: ZoneOffset,
}

impl VTimezone {
    /// Describes `resolver`'s zone from January 1st of `from_year` through `to_year`.
    pub fn for_years(resolver: &ZoneResolver, from_year: i32, to_year: i32) -> Self {
        let fallback_at = NaiveDate::from_ymd_opt(from_year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or_default();
        Self {
            tzid: resolver.id().to_string(),
            transitions: resolver.transitions(from_year, to_year),
            fallback: resolver.offset_at(fallback_at),
        }
    }

    fn write(&self, out: &mut ContentWriter) {
        out.line("BEGIN", "VTIMEZONE");
        out.line("TZID", &self.tzid);
        if self.transitions.is_empty() {
            out.line("BEGIN", "STANDARD");
            out.line("DTSTART", "19700101T000000");
            out.line("TZOFFSETFROM", &format_utc_offset(self.fallback.utc_offset_secs));
            out.line("TZOFFSETTO", &format_utc_offset(self.fallback.utc_offset_secs));
            out.line("TZNAME", &escape_text(&self.fallback.name));
            out.line("END", "STANDARD");
        }
        for transition in &self.transitions {
            let kind = if transition.to.is_daylight { "DAYLIGHT" } else { "STANDARD" };
            out.line("BEGIN", kind);
            out.line("DTSTART", &transition.local_onset().format("%Y%m%dT%H%M%S").to_string());
            out.line("TZOFFSETFROM", &format_utc_offset(transition.from.utc_offset_secs));
            out.line("TZOFFSETTO", &format_utc_offset(transition.to.utc_offset_secs));
            out.line("TZNAME", &escape_text(&transition.to.name));
            out.line("END", kind);
        }
        out.line("END", "VTIMEZONE");
    }
}

/// A complete calendar feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument {
    /// `PRODID` value.
    pub prodid: String,
    /// Optional zone definition, emitted before the events.
    pub timezone: Option<VTimezone>,
    /// Events in output order.
    pub events: Vec<CalendarEvent>,
    /// Written as every event's `DTSTAMP`.
    pub generated_at: DateTime<Utc>,
}

impl CalendarDocument {
    /// Creates an empty document stamped with `generated_at`.
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            prodid: DEFAULT_PRODID.to_string(),
            timezone: None,
            events: Vec::new(),
            generated_at,
        }
    }

    /// Sets the `PRODID`.
    pub fn with_prodid(mut self, prodid: impl Into<String>) -> Self {
        self.prodid = prodid.into();
        self
    }

    /// Sets the `VTIMEZONE` block.
    pub fn with_timezone(mut self, timezone: VTimezone) -> Self {
        self.timezone = Some(timezone);
        self
    }

    /// Appends events.
    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events.extend(events);
        self
    }

    /// Serializes the document.
    pub fn encode(&self) -> String {
        let mut out = ContentWriter::default();
        out.line("BEGIN", "VCALENDAR");
        out.line("VERSION", "2.0");
        out.line("CALSCALE", "GREGORIAN");
        out.line("METHOD", "PUBLISH");
        out.line("PRODID", &self.prodid);

        if let Some(timezone) = &self.timezone {
            timezone.write(&mut out);
        }

        let stamp = self.generated_at.format("%Y%m%dT%H%M%SZ").to_string();
        for event in &self.events {
            out.line("BEGIN", "VEVENT");
            out.line("UID", &escape_text(&event.uid));
            out.line("DTSTAMP", &stamp);
            out.line("SUMMARY", &escape_text(&event.title));
            out.line(&date_time_name("DTSTART", &event.start), &event.start.format_value());
            out.line(&date_time_name("DTEND", &event.end), &event.end.format_value());
            out.line("END", "VEVENT");
        }

        out.line("END", "VCALENDAR");
        debug!(
            events = self.events.len(),
            bytes = out.buf.len(),
            "Encoded calendar document"
        );
        out.buf
    }
}

/// Property name plus `TZID` parameter when the instant is local.
fn date_time_name(name: &str, instant: &ZonedInstant) -> String {
    match instant.tzid() {
        Some(tzid) => format!("{};TZID={}", name, param_value(tzid)),
        None => name.to_string(),
    }
}

/// Accumulates folded, CRLF-terminated content lines.
#[derive(Default)]
struct ContentWriter {
    buf: String,
}

impl ContentWriter {
    fn line(&mut self, name: &str, value: &str) {
        let mut width = 0;
        for ch in name.chars().chain(std::iter::once(':')).chain(value.chars()) {
            let len = ch.len_utf8();
            if width + len > FOLD_WIDTH {
                self.buf.push_str("\r\n ");
                width = 1;
            }
            self.buf.push(ch);
            width += len;
        }
        self.buf.push_str("\r\n");
    }
}

/// Escapes a TEXT value: backslash, semicolon, comma and line breaks.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    escaped.push_str("\\n");
                }
            }
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Quotes a parameter value when it contains `:`, `;` or `,`.
fn param_value(value: &str) -> String {
    if value.contains([':', ';', ',']) {
        format!("\"{}\"", value.replace('"', ""))
    } else {
        value.to_string()
    }
}

/// Formats a UTC offset as `+HHMM` (or `+HHMMSS` when seconds are present).
fn format_utc_offset(secs: i32) -> String {
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs();
    let mut formatted = format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60);
    if abs % 60 != 0 {
        let _ = write!(formatted, "{:02}", abs % 60);
    }
    formatted
}

/// An event read back from a calendar feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// `UID`.
    pub uid: String,
    /// `SUMMARY`, empty when absent.
    pub title: String,
    /// `DTSTART`.
    pub start: ZonedInstant,
    /// `DTEND`, or `DTSTART` when absent.
    pub end: ZonedInstant,
}

/// Parses ICS content and returns its timed events.
///
/// Events without a `UID` or `DTSTART`, all-day events and floating times are
/// left out.
pub fn decode_events(ics: &str) -> Vec<DecodedEvent> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(error = %e, "Failed to parse ICS content");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => decode_event(event),
            _ => None,
        })
        .collect()
}

fn decode_event(event: &Event) -> Option<DecodedEvent> {
    let uid = event.get_uid()?;
    let start = convert_date_time(event.get_start()?)?;
    let end = match event.get_end() {
        Some(end) => convert_date_time(end)?,
        None => start.clone(),
    };

    Some(DecodedEvent {
        uid: uid.to_string(),
        title: event.get_summary().unwrap_or_default().to_string(),
        start,
        end,
    })
}

fn convert_date_time(dt: DatePerhapsTime) -> Option<ZonedInstant> {
    match dt {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(ZonedInstant::Utc(dt)),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            Some(ZonedInstant::Local {
                local: date_time,
                tzid,
            })
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(_)) | DatePerhapsTime::Date(_) => {
            None
        }
    }
}
