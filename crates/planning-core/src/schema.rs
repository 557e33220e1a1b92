//! Fixed layout of the published planning table.
//!
//! [`RoomSchema`] describes where each room's half-day cells live in a table
//! row, and [`ShiftWindow`] the three daily time ranges that are tracked.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Rooms in the order the planning table lays them out.
const CLINIC_ROOMS: [&str; 16] = [
    "RADIO MERMOZ",
    "ANGIO",
    "SCANNER1",
    "SCANNER2",
    "SCANNER3",
    "MAMMO",
    "IRM1",
    "IRM2",
    "IRM3",
    "SANTY",
    "ST PRIEST",
    "GERLAND",
    "ADMIN",
    "OFF",
    "VACANCES",
    "ABSENCES TP",
];

/// One of the three daily shift windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftWindow {
    /// 08:00 to 13:00.
    Morning,
    /// 13:00 to 19:00.
    Afternoon,
    /// Evening on-call, 19:00 to 21:00.
    Evening,
}

impl ShiftWindow {
    /// All windows in emission order.
    pub const ALL: [ShiftWindow; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    /// Local wall-clock start of the window.
    pub fn start_time(&self) -> NaiveTime {
        match self {
            Self::Morning => hm(8),
            Self::Afternoon => hm(13),
            Self::Evening => hm(19),
        }
    }

    /// Local wall-clock end of the window.
    pub fn end_time(&self) -> NaiveTime {
        match self {
            Self::Morning => hm(13),
            Self::Afternoon => hm(19),
            Self::Evening => hm(21),
        }
    }

    /// Label used in event titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Matin",
            Self::Afternoon => "Après-midi",
            Self::Evening => "Astreinte du soir",
        }
    }

    /// Returns `true` if assignments in this window carry a room.
    pub fn has_room(&self) -> bool {
        !matches!(self, Self::Evening)
    }
}

fn hm(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()
}

/// Column layout of a planning row.
///
/// Room `i` occupies `base_offset + 2i` (morning) and `base_offset + 2i + 1`
/// (afternoon). The evening on-call marker sits in its own cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSchema {
    /// Room identifiers in table order.
    pub rooms: Vec<String>,
    /// Index of the first room's morning cell.
    pub base_offset: usize,
    /// Index of the `dd/mm/yyyy` date cell.
    pub date_cell: usize,
    /// Index of the evening on-call cell.
    pub evening_cell: usize,
    /// Rows shorter than this are discarded.
    pub min_cells: usize,
}

impl Default for RoomSchema {
    fn default() -> Self {
        Self {
            rooms: CLINIC_ROOMS.iter().map(|r| r.to_string()).collect(),
            base_offset: 2,
            date_cell: 1,
            evening_cell: 34,
            min_cells: 35,
        }
    }
}

impl RoomSchema {
    /// Room identifiers in table order.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Cell index holding room `index`'s morning assignments.
    pub fn morning_cell(&self, index: usize) -> usize {
        self.base_offset + 2 * index
    }

    /// Cell index holding room `index`'s afternoon assignments.
    pub fn afternoon_cell(&self, index: usize) -> usize {
        self.morning_cell(index) + 1
    }
}
