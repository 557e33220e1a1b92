//! Shift extraction from planning rows.
//!
//! A [`ShiftExtractor`] walks [`RowRecord`]s, resolves each row's date and
//! finds the cells carrying the tracked marker token. Rows that do not fit
//! the table layout are skipped (see [`RowSkip`]), never reported as errors.
//!
//! When the marker shows up in several rooms for the same window, the room
//! that comes last in schema order wins.

use std::fmt;

use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{RoomSchema, ShiftWindow};
use crate::table::RowRecord;

/// One tracked shift on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    /// Calendar date of the shift.
    pub date: NaiveDate,
    /// Which window of the day.
    pub window: ShiftWindow,
    /// Room for morning/afternoon shifts; `None` for the evening on-call.
    pub room: Option<String>,
}

impl ShiftAssignment {
    /// Local wall-clock start.
    pub fn local_start(&self) -> NaiveDateTime {
        self.date.and_time(self.window.start_time())
    }

    /// Local wall-clock end.
    pub fn local_end(&self) -> NaiveDateTime {
        self.date.and_time(self.window.end_time())
    }

    /// Event title, `"{marker} — {window}"` plus `" — {room}"` when there is one.
    pub fn title(&self, marker: &str) -> String {
        match &self.room {
            Some(room) => format!("{} — {} — {}", marker, self.window.label(), room),
            None => format!("{} — {}", marker, self.window.label()),
        }
    }
}

/// Why a row was left out of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    /// Fewer cells than the schema requires.
    TooFewCells { found: usize },
    /// Empty date cell.
    MissingDate,
    /// Date cell is not a valid `dd/mm/yyyy` date.
    InvalidDate { raw: String },
    /// Valid date outside the requested range.
    OutOfRange { date: NaiveDate },
}

impl fmt::Display for RowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewCells { found } => write!(f, "too few cells ({})", found),
            Self::MissingDate => write!(f, "missing date"),
            Self::InvalidDate { raw } => write!(f, "invalid date {:?}", raw),
            Self::OutOfRange { date } => write!(f, "date {} outside range", date),
        }
    }
}

/// Inclusive range of dates to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date kept.
    pub from: NaiveDate,
    /// Last date kept.
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a new range. Bounds are swapped if given in reverse.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// From `today` through `today + months`.
    ///
    /// Month arithmetic clamps to the end of shorter months (31/08 + 6 → 28/02).
    pub fn months_ahead(today: NaiveDate, months: u32) -> Self {
        let to = today
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);
        Self::new(today, to)
    }

    /// Returns `true` if `date` is within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Parses a `dd/mm/yyyy` date.
///
/// Components may carry surrounding whitespace. Returns `None` for anything
/// that is not a real calendar date (31/02/2025, 01/13/2025, ...).
pub fn parse_civil_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !(1..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Returns `true` if `marker` is one of the whitespace-separated tokens of `cell`.
///
/// `"JR"` matches `"AB JR"` but not `"JRX"` or `"AB/JR"`.
pub fn marker_matches(cell: &str, marker: &str) -> bool {
    cell.split_whitespace().any(|token| token == marker)
}

/// Turns planning rows into shift assignments for one marker.
#[derive(Debug, Clone)]
pub struct ShiftExtractor<'a> {
    schema: &'a RoomSchema,
    marker: &'a str,
    range: Option<DateRange>,
}

impl<'a> ShiftExtractor<'a> {
    /// Creates an extractor for `marker` against `schema`.
    pub fn new(schema: &'a RoomSchema, marker: &'a str) -> Self {
        Self {
            schema,
            marker,
            range: None,
        }
    }

    /// Only keep rows whose date falls in `range`.
    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }

    /// Extracts assignments from all rows, in row order then window order.
    pub fn extract(&self, rows: &[RowRecord]) -> Vec<ShiftAssignment> {
        let mut assignments = Vec::new();
        let mut skipped = 0usize;

        for (index, row) in rows.iter().enumerate() {
            match self.extract_row(row) {
                Ok(found) => assignments.extend(found),
                Err(reason) => {
                    skipped += 1;
                    debug!(row = index, reason = %reason, "Skipping planning row");
                }
            }
        }

        debug!(
            rows = rows.len(),
            skipped,
            assignments = assignments.len(),
            marker = self.marker,
            "Extracted shift assignments"
        );
        assignments
    }

    /// Extracts the assignments of a single row.
    ///
    /// Returns the reason when the row does not qualify. A qualifying row
    /// without the marker yields an empty list.
    pub fn extract_row(&self, row: &RowRecord) -> Result<Vec<ShiftAssignment>, RowSkip> {
        let date = self.row_date(row)?;

        let mut morning: Option<&str> = None;
        let mut afternoon: Option<&str> = None;

        for (index, room) in self.schema.rooms().iter().enumerate() {
            if marker_matches(row.cell(self.schema.morning_cell(index)), self.marker) {
                self.note_overwrite(date, ShiftWindow::Morning, morning, room);
                morning = Some(room.as_str());
            }
            if marker_matches(row.cell(self.schema.afternoon_cell(index)), self.marker) {
                self.note_overwrite(date, ShiftWindow::Afternoon, afternoon, room);
                afternoon = Some(room.as_str());
            }
        }
        let evening = marker_matches(row.cell(self.schema.evening_cell), self.marker);

        let mut found = Vec::new();
        if let Some(room) = morning {
            found.push(ShiftAssignment {
                date,
                window: ShiftWindow::Morning,
                room: Some(room.to_string()),
            });
        }
        if let Some(room) = afternoon {
            found.push(ShiftAssignment {
                date,
                window: ShiftWindow::Afternoon,
                room: Some(room.to_string()),
            });
        }
        if evening {
            found.push(ShiftAssignment {
                date,
                window: ShiftWindow::Evening,
                room: None,
            });
        }
        Ok(found)
    }

    fn row_date(&self, row: &RowRecord) -> Result<NaiveDate, RowSkip> {
        if row.len() < self.schema.min_cells {
            return Err(RowSkip::TooFewCells { found: row.len() });
        }

        let raw = row.cell(self.schema.date_cell);
        if raw.is_empty() {
            return Err(RowSkip::MissingDate);
        }

        let date = parse_civil_date(raw).ok_or_else(|| RowSkip::InvalidDate {
            raw: raw.to_string(),
        })?;

        match self.range {
            Some(range) if !range.contains(date) => Err(RowSkip::OutOfRange { date }),
            _ => Ok(date),
        }
    }

    fn note_overwrite(&self, date: NaiveDate, window: ShiftWindow, previous: Option<&str>, room: &str) {
        if let Some(previous) = previous {
            debug!(
                %date,
                window = ?window,
                previous,
                room,
                "Marker found in several rooms, keeping the later one"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A 35-cell row dated `day`, with `marks` as `(cell index, text)`.
    fn row(day: &str, marks: &[(usize, &str)]) -> RowRecord {
        let mut cells = vec![String::new(); 35];
        cells[0] = "Lun".to_string();
        cells[1] = day.to_string();
        for (index, text) in marks {
            cells[*index] = text.to_string();
        }
        RowRecord::new(cells)
    }

    fn extract(rows: &[RowRecord]) -> Vec<ShiftAssignment> {
        let schema = RoomSchema::default();
        ShiftExtractor::new(&schema, "JR").extract(rows)
    }

    mod civil_date {
        use super::*;

        #[test]
        fn parses_day_month_year() {
            assert_eq!(parse_civil_date("15/03/2025"), Some(date(2025, 3, 15)));
            assert_eq!(parse_civil_date("1/2/2025"), Some(date(2025, 2, 1)));
            assert_eq!(parse_civil_date(" 29/02/2024 "), Some(date(2024, 2, 29)));
        }

        #[test]
        fn rejects_impossible_dates() {
            assert_eq!(parse_civil_date("31/02/2025"), None);
            assert_eq!(parse_civil_date("29/02/2025"), None);
            assert_eq!(parse_civil_date("01/13/2025"), None);
            assert_eq!(parse_civil_date("00/01/2025"), None);
            assert_eq!(parse_civil_date("01/01/0"), None);
        }

        #[test]
        fn rejects_malformed_text() {
            assert_eq!(parse_civil_date(""), None);
            assert_eq!(parse_civil_date("Lundi"), None);
            assert_eq!(parse_civil_date("15/03"), None);
            assert_eq!(parse_civil_date("15/03/2025/1"), None);
            assert_eq!(parse_civil_date("aa/03/2025"), None);
            assert_eq!(parse_civil_date("2025-03-15"), None);
        }
    }

    mod marker {
        use super::*;

        #[test]
        fn whole_token_only() {
            assert!(marker_matches("JR", "JR"));
            assert!(marker_matches("AB JR CD", "JR"));
            assert!(marker_matches("AB\u{a0}JR", "JR"));
            assert!(!marker_matches("JRX", "JR"));
            assert!(!marker_matches("XJR", "JR"));
            assert!(!marker_matches("AB/JR", "JR"));
            assert!(!marker_matches("jr", "JR"));
            assert!(!marker_matches("", "JR"));
        }
    }

    mod range {
        use super::*;

        #[test]
        fn inclusive_bounds() {
            let range = DateRange::new(date(2025, 3, 1), date(2025, 3, 31));
            assert!(range.contains(date(2025, 3, 1)));
            assert!(range.contains(date(2025, 3, 31)));
            assert!(!range.contains(date(2025, 2, 28)));
            assert!(!range.contains(date(2025, 4, 1)));
        }

        #[test]
        fn reversed_bounds_are_swapped() {
            let range = DateRange::new(date(2025, 3, 31), date(2025, 3, 1));
            assert_eq!(range.from, date(2025, 3, 1));
            assert_eq!(range.to, date(2025, 3, 31));
        }

        #[test]
        fn months_ahead_clamps_month_end() {
            let range = DateRange::months_ahead(date(2025, 8, 31), 6);
            assert_eq!(range.from, date(2025, 8, 31));
            assert_eq!(range.to, date(2026, 2, 28));
        }
    }

    #[test]
    fn morning_in_third_room() {
        let rows = [row("15/03/2025", &[(6, "JR")])];
        let found = extract(&rows);
        assert_eq!(
            found,
            vec![ShiftAssignment {
                date: date(2025, 3, 15),
                window: ShiftWindow::Morning,
                room: Some("SCANNER1".to_string()),
            }]
        );
    }

    #[test]
    fn windows_in_canonical_order() {
        let rows = [row("15/03/2025", &[(34, "JR"), (5, "JR"), (2, "AB JR")])];
        let windows: Vec<_> = extract(&rows).iter().map(|a| a.window).collect();
        assert_eq!(
            windows,
            [ShiftWindow::Morning, ShiftWindow::Afternoon, ShiftWindow::Evening]
        );
    }

    #[test]
    fn evening_has_no_room() {
        let rows = [row("15/03/2025", &[(34, "JR")])];
        let found = extract(&rows);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].window, ShiftWindow::Evening);
        assert_eq!(found[0].room, None);
    }

    #[test]
    fn later_room_wins_tie_break() {
        // Afternoon cells of ANGIO (5) and IRM1 (15).
        let rows = [row("15/03/2025", &[(5, "JR"), (15, "JR")])];
        let found = extract(&rows);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].window, ShiftWindow::Afternoon);
        assert_eq!(found[0].room.as_deref(), Some("IRM1"));
    }

    #[test]
    fn substring_marker_is_ignored() {
        let rows = [row("15/03/2025", &[(2, "JRX"), (3, "XJR"), (34, "JR2")])];
        assert!(extract(&rows).is_empty());
    }

    #[test]
    fn date_does_not_depend_on_marked_rooms() {
        for cell in 2..=34 {
            let rows = [row("07/11/2025", &[(cell, "JR")])];
            let found = extract(&rows);
            assert_eq!(found.len(), 1, "cell {}", cell);
            assert_eq!(found[0].date, date(2025, 11, 7));
        }
    }

    #[test]
    fn rows_without_marker_yield_nothing() {
        let rows = [row("15/03/2025", &[(2, "AB"), (3, "CD")])];
        assert!(extract(&rows).is_empty());
    }

    #[test]
    fn ineligible_rows_are_skipped() {
        let schema = RoomSchema::default();
        let extractor = ShiftExtractor::new(&schema, "JR");

        let short: RowRecord = ["Lun", "15/03/2025", "JR"].into_iter().collect();
        assert_eq!(
            extractor.extract_row(&short),
            Err(RowSkip::TooFewCells { found: 3 })
        );
        assert_eq!(
            extractor.extract_row(&row("", &[(2, "JR")])),
            Err(RowSkip::MissingDate)
        );
        assert_eq!(
            extractor.extract_row(&row("32/01/2025", &[(2, "JR")])),
            Err(RowSkip::InvalidDate {
                raw: "32/01/2025".to_string()
            })
        );

        let rows = [
            short,
            row("", &[(2, "JR")]),
            row("Semaine 12", &[(2, "JR")]),
            row("16/03/2025", &[(2, "JR")]),
        ];
        let found = extract(&rows);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, date(2025, 3, 16));
    }

    #[test]
    fn range_filters_rows() {
        let schema = RoomSchema::default();
        let range = DateRange::new(date(2025, 3, 10), date(2025, 3, 20));
        let extractor = ShiftExtractor::new(&schema, "JR").with_range(Some(range));

        let rows = [
            row("09/03/2025", &[(2, "JR")]),
            row("10/03/2025", &[(2, "JR")]),
            row("21/03/2025", &[(2, "JR")]),
        ];
        let found = extractor.extract(&rows);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, date(2025, 3, 10));
        assert_eq!(
            extractor.extract_row(&rows[0]),
            Err(RowSkip::OutOfRange {
                date: date(2025, 3, 9)
            })
        );
    }

    #[test]
    fn custom_marker() {
        let schema = RoomSchema::default();
        let rows = [row("15/03/2025", &[(2, "JR"), (3, "MB")])];
        let found = ShiftExtractor::new(&schema, "MB").extract(&rows);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].window, ShiftWindow::Afternoon);
        assert_eq!(found[0].room.as_deref(), Some("RADIO MERMOZ"));
    }

    #[test]
    fn titles() {
        let morning = ShiftAssignment {
            date: date(2025, 3, 15),
            window: ShiftWindow::Morning,
            room: Some("SCANNER1".to_string()),
        };
        assert_eq!(morning.title("JR"), "JR — Matin — SCANNER1");

        let evening = ShiftAssignment {
            date: date(2025, 3, 15),
            window: ShiftWindow::Evening,
            room: None,
        };
        assert_eq!(evening.title("JR"), "JR — Astreinte du soir");
        assert_eq!(evening.local_start(), date(2025, 3, 15).and_hms_opt(19, 0, 0).unwrap());
        assert_eq!(evening.local_end(), date(2025, 3, 15).and_hms_opt(21, 0, 0).unwrap());
    }
}
