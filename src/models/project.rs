//! Project and source-file skeleton.
//!
//! A rendered source file is a root container holding, in order:
//! the project declaration (horizon, timezone, output directory), the
//! resource pool, the calendar report declaration, and then the tasks.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::keyword;
use super::node::{Clause, Node};
use super::property::Property;
use super::resource::{DEFAULT_RESOURCE_ID, DEFAULT_RESOURCE_NAME};

/// Comment block emitted once at the top of every source file.
pub const COMMENTS_HEADER: &str = "\
// TaskJuggler 3 source
// generated by schedule-juggler";

/// Project-level declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Project identifier.
    pub id: String,
    /// Project display name.
    pub name: String,
    /// Horizon start. `None` = today.
    pub start: Option<NaiveDate>,
    /// Horizon end.
    pub end: NaiveDate,
    /// `timezone` declaration.
    pub timezone: String,
    /// `outputdir` declaration (relative to the scheduler's working dir).
    pub outputdir: String,
    /// `icalreport` name; the scheduler writes `<report>.ics`.
    pub report: String,
    /// Resource allocated when a record names none.
    pub default_resource: String,
    /// Display name of the default resource.
    pub default_resource_name: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default Project".to_string(),
            start: None,
            end: NaiveDate::from_ymd_opt(2035, 10, 10).unwrap_or(NaiveDate::MAX),
            timezone: "Europe/Dublin".to_string(),
            outputdir: "REPORT".to_string(),
            report: "calendar".to_string(),
            default_resource: DEFAULT_RESOURCE_ID.to_string(),
            default_resource_name: DEFAULT_RESOURCE_NAME.to_string(),
        }
    }
}

impl ProjectSettings {
    /// Sets a fixed horizon start.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Horizon as a date interval, starting today when no start is set.
    pub fn horizon(&self) -> Interval {
        let start = self.start.unwrap_or_else(|| Local::now().date_naive());
        Interval::dates(start, self.end)
    }
}

impl Node {
    /// Creates the project declaration.
    pub fn project(settings: &ProjectSettings) -> Self {
        Node::new(keyword::PROJECT, settings.id.as_str())
            .singleton()
            .with_text(settings.name.as_str())
            .with_clause(Clause::Interval(settings.horizon()))
            .with_property(Property::declaration(
                keyword::TIMEZONE,
                settings.timezone.as_str(),
            ))
            .with_property(Property::declaration(
                keyword::OUTPUTDIR,
                settings.outputdir.as_str(),
            ))
    }

    /// Creates the root of a source file with the default declarations:
    /// project, default resource and calendar report. Tasks and further
    /// resources are attached afterwards.
    pub fn source(settings: &ProjectSettings) -> Self {
        Node::container()
            .with_header(COMMENTS_HEADER)
            .with_property(Node::project(settings))
            .with_property(Node::resource(
                settings.default_resource.as_str(),
                settings.default_resource_name.as_str(),
            ))
            .with_property(Property::declaration(
                keyword::ICALREPORT,
                settings.report.as_str(),
            ))
    }
}
