//! External scheduler round trip.
//!
//! Scheduling itself is delegated to TaskJuggler (`tj3`). This module runs
//! it over a rendered tree and merges the computed bookings back.
//!
//! # Flow
//!
//! 1. [`SchedulerRunner`] renders the tree to a scoped `.tjp` file and runs
//!    the binary with the output directory as working directory.
//! 2. The calendar report is parsed by [`parse_calendar`].
//! 3. [`merge_calendar`] attaches one booking per event to the matching task
//!    and returns a [`MergeReport`].
//!
//! # References
//!
//! - TaskJuggler 3 manual, "icalreport"
//! - RFC 5545, "Internet Calendaring and Scheduling Core Object Specification"

mod config;
mod merge;
mod runner;

pub use config::{RunConfig, DEFAULT_BINARY};
pub use merge::{merge, merge_calendar, parse_calendar, CalendarEvent, MergeReport};
pub use runner::SchedulerRunner;
