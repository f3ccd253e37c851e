//! Source profiles.
//!
//! A [`SourceProfile`] describes where each task capability lives inside a
//! raw record and how to coerce it. Profiles are plain data, so new sources
//! are supported by writing a table (in code or in the configuration file)
//! rather than a new type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Effort, EffortUnit, DEFAULT_RESOURCE_ID};

/// What a record field contributes to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// External key; becomes the task identifier.
    Identifier,
    /// Display text.
    Summary,
    /// Planned work.
    Effort,
    /// Prerequisite task keys.
    Depends,
    /// Assigned resource.
    Allocate,
    /// Earliest start.
    Start,
    /// Scheduling priority.
    Priority,
}

/// How a raw field value is turned into a typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Coercion {
    /// Strings as-is, numbers and booleans stringified.
    Text,
    /// Whole number (numeric text accepted).
    Integer,
    /// Number divided by `divisor`, rounded up to a whole `unit`.
    Effort {
        #[serde(default = "unit_divisor")]
        divisor: f64,
        #[serde(default)]
        unit: EffortUnit,
    },
    /// Array of keys, or text scanned for key-like words.
    IdList,
    /// Tracker issue links of type `Blocker`, yielding the inward issue keys.
    BlockerLinks,
    /// RFC 3339 or `YYYY-MM-DD[ HH:MM[:SS]]`.
    Timestamp,
    /// `low`/`high`/`critical` levels, numbers pass through.
    PriorityLevel,
}

fn unit_divisor() -> f64 {
    1.0
}

/// One row of a profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub capability: Capability,
    /// Dotted path into the record (`fields.assignee.name`).
    pub path: String,
    pub coercion: Coercion,
}

impl FieldBinding {
    pub fn new(capability: Capability, path: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            capability,
            path: path.into(),
            coercion,
        }
    }

    /// Resolves the binding's path in `record`. JSON `null` counts as absent.
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        lookup_path(record, &self.path)
    }
}

/// Resolves a dotted path in `record`; `null` counts as absent.
pub(crate) fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let found = path
        .split('.')
        .try_fold(record, |value, segment| value.get(segment))?;
    (!found.is_null()).then_some(found)
}

/// Record-level priority adjustments applied on top of the priority field.
///
/// The bound priority field is read with its own coercion, then:
/// 1. a present `cleared_by` field removes the priority entirely
/// 2. an absent priority becomes `default_level`, an unrecognized one
///    `unknown_level`
/// 3. `preference_field` is added to recognized and default levels
/// 4. below `overdue_exempt_from`, every whole day past `deadline_field`
///    adds `overdue_step`, and the result is capped at `overdue_cap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityRules {
    pub default_level: i64,
    pub unknown_level: i64,
    pub preference_field: Option<String>,
    pub deadline_field: Option<String>,
    pub cleared_by: Option<String>,
    pub overdue_step: i64,
    pub overdue_cap: i64,
    pub overdue_exempt_from: i64,
}

impl Default for PriorityRules {
    fn default() -> Self {
        Self {
            default_level: 100,
            unknown_level: 1,
            preference_field: Some("preference".to_string()),
            deadline_field: Some("deadline".to_string()),
            cleared_by: Some("appointment".to_string()),
            overdue_step: 3,
            overdue_cap: 250,
            overdue_exempt_from: 300,
        }
    }
}

/// Field table plus defaults for one kind of record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub name: String,
    /// Effort assumed when a record carries none.
    #[serde(default = "default_effort")]
    pub default_effort: Effort,
    /// Resource allocated when a record names none.
    #[serde(default = "default_resource")]
    pub default_resource: String,
    pub fields: Vec<FieldBinding>,
    /// Record-level priority rules; without them the priority field is
    /// used as coerced.
    #[serde(default)]
    pub priority: Option<PriorityRules>,
}

fn default_effort() -> Effort {
    Effort::hours(1)
}

fn default_resource() -> String {
    DEFAULT_RESOURCE_ID.to_string()
}

impl SourceProfile {
    /// Creates an empty profile with default effort and resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_effort: default_effort(),
            default_resource: default_resource(),
            fields: Vec::new(),
            priority: None,
        }
    }

    /// Adds a binding.
    pub fn with_field(
        mut self,
        capability: Capability,
        path: impl Into<String>,
        coercion: Coercion,
    ) -> Self {
        self.fields.push(FieldBinding::new(capability, path, coercion));
        self
    }

    pub fn with_default_effort(mut self, effort: Effort) -> Self {
        self.default_effort = effort;
        self
    }

    pub fn with_priority_rules(mut self, rules: PriorityRules) -> Self {
        self.priority = Some(rules);
        self
    }

    pub fn with_default_resource(mut self, resource: impl Into<String>) -> Self {
        self.default_resource = resource.into();
        self
    }

    /// First binding for `capability`.
    pub fn binding(&self, capability: Capability) -> Option<&FieldBinding> {
        self.fields.iter().find(|f| f.capability == capability)
    }

    /// Flat dictionaries: `id`, `summary`, `effort` (hours), `depends`,
    /// `allocate`, `start`, `priority`.
    pub fn records() -> Self {
        Self::new("records")
            .with_field(Capability::Identifier, "id", Coercion::Text)
            .with_field(Capability::Summary, "summary", Coercion::Text)
            .with_field(Capability::Effort, "effort", hours(1.0))
            .with_field(Capability::Depends, "depends", Coercion::IdList)
            .with_field(Capability::Allocate, "allocate", Coercion::Text)
            .with_field(Capability::Start, "start", Coercion::Timestamp)
            .with_field(Capability::Priority, "priority", Coercion::Integer)
    }

    /// Issue tracker payloads. Estimates are given in seconds.
    pub fn tracker() -> Self {
        Self::new("tracker")
            .with_field(Capability::Identifier, "key", Coercion::Text)
            .with_field(Capability::Summary, "fields.summary", Coercion::Text)
            .with_field(
                Capability::Effort,
                "fields.aggregatetimeoriginalestimate",
                hours(3600.0),
            )
            .with_field(Capability::Depends, "fields.issuelinks", Coercion::BlockerLinks)
            .with_field(Capability::Allocate, "fields.assignee.name", Coercion::Text)
    }

    /// Spreadsheet rows: textual dependency lists, `appointment` as start,
    /// named priority levels adjusted by [`PriorityRules::default`].
    pub fn tabular() -> Self {
        Self::new("tabular")
            .with_field(Capability::Identifier, "id", Coercion::Text)
            .with_field(Capability::Summary, "name", Coercion::Text)
            .with_field(Capability::Effort, "effort", hours(1.0))
            .with_field(Capability::Depends, "depends", Coercion::IdList)
            .with_field(Capability::Allocate, "allocate", Coercion::Text)
            .with_field(Capability::Start, "appointment", Coercion::Timestamp)
            .with_field(Capability::Priority, "priority", Coercion::PriorityLevel)
            .with_priority_rules(PriorityRules::default())
    }

    /// Built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "records" => Some(Self::records()),
            "tracker" => Some(Self::tracker()),
            "tabular" => Some(Self::tabular()),
            _ => None,
        }
    }
}

impl Default for SourceProfile {
    fn default() -> Self {
        Self::records()
    }
}

fn hours(divisor: f64) -> Coercion {
    Coercion::Effort {
        divisor,
        unit: EffortUnit::Hour,
    }
}
