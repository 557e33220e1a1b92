//! Inspect command: lists the events of an ICS file.

use std::fmt::Write as _;

use planning_core::{DecodedEvent, ZonedInstant, decode_events};

use crate::cli::InspectArgs;
use crate::error::ServerResult;

pub fn run(args: &InspectArgs) -> ServerResult<()> {
    let content = std::fs::read_to_string(&args.file)?;
    let events = decode_events(&content);
    print!("{}", format_events(&events));
    Ok(())
}

/// One line per event, followed by a count.
pub fn format_events(events: &[DecodedEvent]) -> String {
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "{}  {}  {}  [{}]",
            format_instant(&event.start),
            format_instant(&event.end),
            event.title,
            event.uid
        );
    }
    let _ = writeln!(
        out,
        "{} event{}",
        events.len(),
        if events.len() == 1 { "" } else { "s" }
    );
    out
}

fn format_instant(instant: &ZonedInstant) -> String {
    match instant {
        ZonedInstant::Utc(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        ZonedInstant::Local { local, tzid } => {
            format!("{} {}", local.format("%Y-%m-%d %H:%M"), tzid)
        }
    }
}
