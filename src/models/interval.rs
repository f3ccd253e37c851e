//! Time intervals and TaskJuggler time literals.
//!
//! TaskJuggler writes dates as `YYYY-MM-DD` and points in time as
//! `YYYY-MM-DD-HH:MM:SS`. Sub-second parts are truncated, never rounded.
//! Timezone is a project-wide declaration, so instants are stored naive;
//! an interval only remembers whether its source gave them in UTC.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date literal format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Date-time literal format.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Rendering precision of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// Whole days (project horizon).
    Date,
    /// Seconds (bookings).
    DateTime,
}

/// A time interval [start, end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
    /// How the interval renders.
    pub precision: Precision,
    /// Start and end are UTC instants rather than project wall time.
    #[serde(default)]
    pub utc: bool,
}

impl Interval {
    /// Creates a date-time interval.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            precision: Precision::DateTime,
            utc: false,
        }
    }

    /// Marks start and end as UTC instants.
    pub fn in_utc(mut self) -> Self {
        self.utc = true;
        self
    }

    /// Creates a whole-day interval.
    pub fn dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
            precision: Precision::Date,
            utc: false,
        }
    }

    /// Renders as `start - end`.
    pub fn render(&self) -> String {
        match self.precision {
            Precision::Date => format!(
                "{} - {}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            ),
            Precision::DateTime => format!(
                "{} - {}",
                format_instant(&self.start),
                format_instant(&self.end)
            ),
        }
    }
}

/// Formats a point in time as a TaskJuggler date-time literal.
pub fn format_instant(instant: &NaiveDateTime) -> String {
    instant.format(DATETIME_FORMAT).to_string()
}
