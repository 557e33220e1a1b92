//! Timezone normalization for shift times.
//!
//! Shift windows are wall-clock times in the clinic's zone. This module turns
//! them into what the calendar output needs:
//! - [`OutputMode::Utc`]: absolute instants, with the zone's daylight-saving
//!   rules applied for the actual year (rules come from the IANA database
//!   compiled into `chrono-tz`)
//! - [`OutputMode::LocalWithZoneId`]: the unchanged wall-clock time tagged
//!   with the zone identifier, leaving resolution to the calendar client
//!
//! [`ZoneResolver::transitions`] exposes the offset changes of the zone, used
//! to describe it in a `VTIMEZONE` block.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, EncodeResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// How event times are written to the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// UTC instants (`20250315T070000Z`).
    Utc,
    /// Local wall-clock time with a `TZID` parameter and a `VTIMEZONE` block.
    #[default]
    LocalWithZoneId,
}

impl OutputMode {
    /// Name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utc => "utc",
            Self::LocalWithZoneId => "local-with-zone-id",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local-with-zone-id" | "local" | "tzid" => Ok(Self::LocalWithZoneId),
            other => Err(format!(
                "unknown output mode '{}' (expected 'utc' or 'local-with-zone-id')",
                other
            )),
        }
    }
}

/// A point in time as it will be written to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ZonedInstant {
    /// An absolute UTC instant.
    Utc(DateTime<Utc>),
    /// A wall-clock time in the named zone.
    Local { local: NaiveDateTime, tzid: String },
}

impl ZonedInstant {
    /// The iCalendar DATE-TIME value (`YYYYMMDDTHHMMSS`, `Z`-suffixed for UTC).
    pub fn format_value(&self) -> String {
        match self {
            Self::Utc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            Self::Local { local, .. } => local.format("%Y%m%dT%H%M%S").to_string(),
        }
    }

    /// The zone identifier for local instants.
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Utc(_) => None,
            Self::Local { tzid, .. } => Some(tzid),
        }
    }
}

/// The UTC offset in force at some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneOffset {
    /// Total offset from UTC, in seconds.
    pub utc_offset_secs: i32,
    /// Whether daylight-saving time is in effect.
    pub is_daylight: bool,
    /// Abbreviation such as `CET` or `CEST`.
    pub name: String,
}

/// A change of UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetTransition {
    /// First instant with the new offset.
    pub at: DateTime<Utc>,
    /// Offset in force before.
    pub from: ZoneOffset,
    /// Offset in force from `at` on.
    pub to: ZoneOffset,
}

impl OffsetTransition {
    /// The onset as wall-clock time under the previous offset.
    ///
    /// This is how `VTIMEZONE` components express `DTSTART`: the Paris spring
    /// change at 01:00 UTC is written as 02:00.
    pub fn local_onset(&self) -> NaiveDateTime {
        self.at.naive_utc() + Duration::seconds(i64::from(self.from.utc_offset_secs))
    }
}

/// Resolves wall-clock times against one zone's rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneResolver {
    tz: Tz,
}

impl ZoneResolver {
    /// Creates a resolver for an IANA zone identifier such as `Europe/Paris`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownZone`] if the identifier is not known.
    pub fn new(zone: &str) -> EncodeResult<Self> {
        let tz = zone
            .trim()
            .parse::<Tz>()
            .map_err(|_| EncodeError::unknown_zone(zone))?;
        Ok(Self { tz })
    }

    /// The canonical zone identifier.
    pub fn id(&self) -> &'static str {
        self.tz.name()
    }

    /// Converts a wall-clock time to a UTC instant.
    ///
    /// Times repeated by a backward change resolve to the earlier instant.
    /// Times skipped by a forward change are read with the offset in force
    /// before the change, landing as far past it as they were into the gap.
    pub fn to_utc(&self, local: NaiveDateTime) -> EncodeResult<DateTime<Utc>> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => {
                let unrepresentable = || EncodeError::UnrepresentableTime {
                    local,
                    zone: self.id().to_string(),
                };
                let probe = local
                    .checked_sub_signed(Duration::days(1))
                    .ok_or_else(unrepresentable)?;
                let before = self.tz.offset_from_utc_datetime(&probe).fix();
                let utc = local
                    .checked_sub_signed(Duration::seconds(i64::from(before.local_minus_utc())))
                    .ok_or_else(unrepresentable)?;
                Ok(Utc.from_utc_datetime(&utc))
            }
        }
    }

    /// Converts a wall-clock time to the representation required by `mode`.
    pub fn normalize(&self, local: NaiveDateTime, mode: OutputMode) -> EncodeResult<ZonedInstant> {
        match mode {
            OutputMode::Utc => self.to_utc(local).map(ZonedInstant::Utc),
            OutputMode::LocalWithZoneId => Ok(ZonedInstant::Local {
                local,
                tzid: self.id().to_string(),
            }),
        }
    }

    /// Wall-clock date in the zone at `at`.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// The offset in force at `at`.
    pub fn offset_at(&self, at: DateTime<Utc>) -> ZoneOffset {
        let offset = self.tz.offset_from_utc_datetime(&at.naive_utc());
        ZoneOffset {
            utc_offset_secs: offset.fix().local_minus_utc(),
            is_daylight: offset.dst_offset() != Duration::zero(),
            name: offset.to_string(),
        }
    }

    /// All offset changes from January 1st of `from_year` to the end of `to_year`.
    ///
    /// Offsets are sampled daily, then each change is narrowed down to the
    /// second. Two changes within the same day that cancel out are not seen.
    pub fn transitions(&self, from_year: i32, to_year: i32) -> Vec<OffsetTransition> {
        let (Some(start), Some(end)) = (year_start(from_year), year_start(to_year + 1)) else {
            return Vec::new();
        };

        let mut transitions = Vec::new();
        let mut t = start;
        let mut prev = self.offset_at_secs(t);
        while t < end {
            let next = t + SECONDS_PER_DAY;
            let current = self.offset_at_secs(next);
            if !same_offset(&current, &prev) {
                let at = self.bisect(t, next, &prev);
                transitions.push(OffsetTransition {
                    at: instant(at),
                    from: prev,
                    to: self.offset_at_secs(at),
                });
            }
            t = next;
            prev = current;
        }
        transitions
    }

    /// First second in `(lo, hi]` whose offset differs from `before`.
    fn bisect(&self, mut lo: i64, mut hi: i64, before: &ZoneOffset) -> i64 {
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if same_offset(&self.offset_at_secs(mid), before) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    }

    fn offset_at_secs(&self, secs: i64) -> ZoneOffset {
        self.offset_at(instant(secs))
    }
}

fn same_offset(a: &ZoneOffset, b: &ZoneOffset) -> bool {
    a.utc_offset_secs == b.utc_offset_secs && a.is_daylight == b.is_daylight
}

fn year_start(year: i32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn instant(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
