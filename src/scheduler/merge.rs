//! Result merge: scheduler calendar output → bookings on the task tree.
//!
//! The scheduler's calendar report is an iCalendar file with one `VEVENT`
//! per scheduled task. Only `DTSTART`, `DTEND` and `UID` are read; the task
//! identifier is the last `-`-separated segment of the UID (host suffix after
//! `@` removed), which is unambiguous because encoded identifiers never
//! contain `-`. A `Z` suffix on `DTSTART` marks the booking as UTC.
//!
//! # Algorithm
//!
//! 1. Unfold continuation lines (leading space or tab).
//! 2. Collect `BEGIN:VEVENT` … `END:VEVENT` blocks, ignoring property
//!    parameters except `VALUE=DATE`.
//! 3. For each event, decode the identifier and look the task up. Unknown
//!    tasks and tasks without an allocation are logged and skipped.
//! 4. Attach `booking <resource> <start> - <end>` to the task. A booking with
//!    the same resource and interval replaces the existing one, so merging
//!    the same file twice is a no-op.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::{ParseError, Result};
use crate::ident;
use crate::models::{keyword, Interval, Node};

/// One scheduled task as reported by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `DTSTART` carried a `Z` suffix.
    pub utc: bool,
    /// Line the event starts on.
    pub line: usize,
}

impl CalendarEvent {
    /// Encoded task identifier carried by the UID.
    pub fn task_identifier(&self) -> &str {
        let local = self.uid.split('@').next().unwrap_or_default();
        local.rsplit('-').next().unwrap_or(local)
    }
}

/// Outcome of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Bookings attached.
    pub attached: usize,
    /// Task keys present in the result but not in the tree.
    pub dangling: Vec<String>,
    /// Task keys that were scheduled but have no allocated resource.
    pub unallocated: Vec<String>,
}

#[derive(Default)]
struct PartialEvent {
    line: usize,
    uid: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    utc: bool,
}

impl PartialEvent {
    fn finish(self) -> std::result::Result<CalendarEvent, ParseError> {
        let missing = |name: &str| ParseError::new(self.line, format!("event has no {name}"));
        Ok(CalendarEvent {
            uid: self.uid.clone().ok_or_else(|| missing("UID"))?,
            start: self.start.ok_or_else(|| missing("DTSTART"))?,
            end: self.end.ok_or_else(|| missing("DTEND"))?,
            utc: self.utc,
            line: self.line,
        })
    }
}

/// Joins folded lines, keeping the number of the line each entry starts on.
fn unfold(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let raw = raw.trim_end_matches('\r');
        if let Some(rest) = raw.strip_prefix([' ', '\t']) {
            if let Some((_, last)) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !raw.is_empty() {
            lines.push((idx + 1, raw.to_string()));
        }
    }
    lines
}

/// Parses a date or date-time value; the flag is set for UTC (`Z`) values.
fn parse_instant(
    value: &str,
    date_only: bool,
    line: usize,
    name: &str,
) -> std::result::Result<(NaiveDateTime, bool), ParseError> {
    let value = value.trim();
    let invalid = || ParseError::new(line, format!("invalid {name} value `{value}`"));
    if date_only || value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(|d| (d.and_time(NaiveTime::MIN), false))
            .map_err(|_| invalid());
    }
    let (local, utc) = match value.strip_suffix('Z') {
        Some(local) => (local, true),
        None => (value, false),
    };
    NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S")
        .map(|t| (t, utc))
        .map_err(|_| invalid())
}

/// Parses the events of an iCalendar document.
///
/// # Errors
/// [`ParseError`] for an event missing `UID`, `DTSTART` or `DTEND`, an
/// unparseable instant, nested or unterminated events.
pub fn parse_calendar(text: &str) -> std::result::Result<Vec<CalendarEvent>, ParseError> {
    let mut events = Vec::new();
    let mut current: Option<PartialEvent> = None;

    for (line, entry) in unfold(text) {
        let Some((head, value)) = entry.split_once(':') else {
            continue;
        };
        let mut params = head.split(';');
        let name = params.next().unwrap_or_default().to_ascii_uppercase();
        let date_only = params.any(|p| p.eq_ignore_ascii_case("VALUE=DATE"));

        let is_event = value.trim().eq_ignore_ascii_case("VEVENT");
        match name.as_str() {
            "BEGIN" if is_event => {
                if current.is_some() {
                    return Err(ParseError::new(line, "nested VEVENT"));
                }
                current = Some(PartialEvent {
                    line,
                    ..PartialEvent::default()
                });
            }
            "END" if is_event => match current.take() {
                Some(event) => events.push(event.finish()?),
                None => return Err(ParseError::new(line, "END:VEVENT without BEGIN:VEVENT")),
            },
            "UID" => {
                if let Some(event) = current.as_mut() {
                    event.uid = Some(value.trim().to_string());
                }
            }
            "DTSTART" | "DTEND" => {
                if let Some(event) = current.as_mut() {
                    let (instant, utc) = parse_instant(value, date_only, line, &name)?;
                    if name == "DTSTART" {
                        event.start = Some(instant);
                        event.utc = utc;
                    } else {
                        event.end = Some(instant);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(event) = current {
        return Err(ParseError::new(event.line, "unterminated VEVENT"));
    }
    Ok(events)
}

/// Merges calendar text into the tree.
pub fn merge_calendar(tree: &mut Node, text: &str) -> std::result::Result<MergeReport, ParseError> {
    let events = parse_calendar(text)?;
    let mut report = MergeReport::default();

    for event in &events {
        let key = ident::decode(event.task_identifier());
        let Some(task) = tree.find_node_mut(keyword::TASK, &key) else {
            warn!(task = %key, uid = %event.uid, line = event.line, "result for unknown task, skipping");
            report.dangling.push(key);
            continue;
        };
        let Some(resource) = task.allocated_resource().map(str::to_string) else {
            warn!(task = %key, "scheduled task has no allocation, skipping booking");
            report.unallocated.push(key);
            continue;
        };
        debug!(task = %key, %resource, start = %event.start, end = %event.end, "attaching booking");
        let mut interval = Interval::new(event.start, event.end);
        if event.utc {
            interval = interval.in_utc();
        }
        task.set_property(Node::booking_over(resource, interval));
        report.attached += 1;
    }

    info!(
        events = events.len(),
        attached = report.attached,
        dangling = report.dangling.len(),
        unallocated = report.unallocated.len(),
        "merged scheduler results"
    );
    Ok(report)
}

/// Reads and merges a calendar file.
pub fn merge(tree: &mut Node, path: &Path) -> Result<MergeReport> {
    let text = fs::read_to_string(path)?;
    Ok(merge_calendar(tree, &text)?)
}
