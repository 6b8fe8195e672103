//! Turns free-text pipeline output into structured progress events.
//!
//! Classification is a pure function of one line so it can be checked
//! against literal fixtures without running a pipeline.

use crate::job::LogKind;
use serde::Serialize;

/// `(phase number, marker printed by the pipeline, announcement logged)`.
pub const PHASE_MARKERS: [(u8, &str, &str); 6] = [
    (
        1,
        "PHASE 1: SUBDOMAIN ENUMERATION",
        "Phase 1: Subdomain Enumeration started",
    ),
    (
        2,
        "PHASE 2: LIVE HOST DETECTION",
        "Phase 2: Live Host Detection started",
    ),
    (
        3,
        "PHASE 3: JAVASCRIPT FILE EXTRACTION",
        "Phase 3: JavaScript Extraction started",
    ),
    (
        4,
        "PHASE 4: WAYBACK MACHINE ENUMERATION",
        "Phase 4: Wayback Machine Enumeration started",
    ),
    (
        5,
        "PHASE 5: VULNERABILITY SCANNING",
        "Phase 5: Vulnerability Scanning started",
    ),
    (
        6,
        "PHASE 6: REPORT GENERATION",
        "Phase 6: Report Generation started",
    ),
];

pub const SUCCESS_MARKER: &str = "[+]";
pub const ERROR_MARKER: &str = "[!]";
pub const ERROR_LABEL: &str = "Error:";
pub const INFO_MARKER: &str = "[*]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LineEvent {
    Phase { phase: u8 },
    Log { kind: LogKind, message: String },
}

impl LineEvent {
    fn log(kind: LogKind, message: impl Into<String>) -> Self {
        LineEvent::Log {
            kind,
            message: message.into(),
        }
    }
}

/// Classifies a single line whose ANSI escapes were already stripped.
///
/// A phase header yields a `Phase` event followed by an info announcement.
/// Independently, the first matching marker in precedence order
/// `[+]` > `[!]`/`Error:` > `[*]` yields one log event carrying the text
/// after the marker. Lines without a marker produce no log event.
pub fn classify_line(line: &str) -> Vec<LineEvent> {
    let mut events = Vec::new();
    if line.is_empty() {
        return events;
    }

    if let Some((phase, _, announcement)) = PHASE_MARKERS
        .iter()
        .find(|(_, marker, _)| line.contains(marker))
    {
        events.push(LineEvent::Phase { phase: *phase });
        events.push(LineEvent::log(LogKind::Info, *announcement));
    }

    if let Some(message) = after_marker(line, SUCCESS_MARKER) {
        events.push(LineEvent::log(LogKind::Success, message));
    } else if let Some(message) =
        after_marker(line, ERROR_MARKER).or_else(|| after_marker(line, ERROR_LABEL))
    {
        events.push(LineEvent::log(LogKind::Error, message));
    } else if let Some(message) = after_marker(line, INFO_MARKER) {
        events.push(LineEvent::log(LogKind::Info, message));
    }

    events
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.split_once(marker).map(|(_, rest)| rest.trim())
}
