//! Field coercions.
//!
//! Every coercion is total: it returns `None` instead of failing, and the
//! builder falls back to the capability's default.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use super::profile::{lookup_path, Coercion, FieldBinding, PriorityRules};
use crate::models::{Effort, EffortUnit};

/// Words in a free-text dependency list (`"1, 2 and PRJ-3"`).
static KEY_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w'-]+").expect("valid key-word regex"));

/// Tolerance applied before rounding efforts up, so that values which are
/// whole numbers up to float noise do not gain a unit.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Named priority levels.
const PRIORITY_LEVELS: [(&str, i64); 3] = [("low", 100), ("high", 200), ("critical", 300)];

/// Result of applying a [`Coercion`].
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Text(String),
    Integer(i64),
    Effort(Effort),
    Ids(Vec<String>),
    Instant(NaiveDateTime),
}

impl Coercion {
    /// Applies the coercion to a raw field value.
    pub fn apply(&self, value: &Value) -> Option<Coerced> {
        match self {
            Self::Text => text(value).map(Coerced::Text),
            Self::Integer => integer(value).map(Coerced::Integer),
            Self::Effort { divisor, unit } => effort(value, *divisor, *unit).map(Coerced::Effort),
            Self::IdList => id_list(value).map(Coerced::Ids),
            Self::BlockerLinks => blocker_links(value).map(Coerced::Ids),
            Self::Timestamp => timestamp(value).map(Coerced::Instant),
            Self::PriorityLevel => priority_level(value).map(Coerced::Integer),
        }
    }
}

impl Coerced {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn into_integer(self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(i),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Plain integers are read as hours.
    pub fn into_effort(self) -> Option<Effort> {
        match self {
            Self::Effort(e) => Some(e),
            Self::Integer(i) => Some(Effort::hours(u32::try_from(i.max(0)).unwrap_or(u32::MAX))),
            _ => None,
        }
    }

    pub fn into_ids(self) -> Option<Vec<String>> {
        match self {
            Self::Ids(ids) => Some(ids),
            Self::Text(s) => Some(vec![s]),
            Self::Integer(i) => Some(vec![i.to_string()]),
            _ => None,
        }
    }

    pub fn into_instant(self) -> Option<NaiveDateTime> {
        match self {
            Self::Instant(t) => Some(t),
            _ => None,
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rounds `raw / divisor` up to a whole number of units, clamping negatives
/// to zero.
pub fn round_effort(raw: f64, divisor: f64) -> Option<u32> {
    if divisor <= 0.0 || !raw.is_finite() {
        return None;
    }
    let units = (raw / divisor - ROUNDING_EPSILON).ceil().max(0.0);
    Some(units.min(f64::from(u32::MAX)) as u32)
}

fn effort(value: &Value, divisor: f64, unit: EffortUnit) -> Option<Effort> {
    let amount = round_effort(number(value)?, divisor)?;
    Some(Effort { amount, unit })
}

fn id_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(text).collect()),
        Value::String(s) => Some(KEY_WORD.find_iter(s).map(|m| m.as_str().to_string()).collect()),
        Value::Number(n) => Some(vec![n.to_string()]),
        _ => None,
    }
}

fn blocker_links(value: &Value) -> Option<Vec<String>> {
    let links = value.as_array()?;
    let keys = links
        .iter()
        .filter(|link| link.pointer("/type/name").and_then(Value::as_str) == Some("Blocker"))
        .filter_map(|link| link.pointer("/inwardIssue/key").and_then(text))
        .collect();
    Some(keys)
}

fn timestamp(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(t);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

impl PriorityRules {
    /// Final priority of `record`, or `None` when it must carry none.
    ///
    /// `binding` is the profile's priority field; `now` anchors overdue days.
    pub fn resolve(&self, binding: Option<&FieldBinding>, record: &Value, now: NaiveDateTime) -> Option<i64> {
        let present = |path: &Option<String>| path.as_deref().and_then(|p| lookup_path(record, p));

        if present(&self.cleared_by).is_some() {
            return None;
        }

        let preference = present(&self.preference_field).and_then(integer).unwrap_or(0);
        let raw = binding.and_then(|b| b.lookup(record).map(|value| (b, value)));
        let mut priority = match raw {
            None => self.default_level + preference,
            Some((binding, value)) => match binding.coercion.apply(value).and_then(Coerced::into_integer) {
                Some(level) => level + preference,
                None => self.unknown_level,
            },
        };

        if priority < self.overdue_exempt_from {
            if let Some(deadline) = present(&self.deadline_field).and_then(timestamp) {
                let overdue = (now - deadline).num_days().max(0);
                priority = (priority + overdue * self.overdue_step).min(self.overdue_cap);
            }
        }
        Some(priority)
    }
}

fn priority_level(value: &Value) -> Option<i64> {
    if let Some(level) = value.as_str() {
        let level = level.trim().to_lowercase();
        if let Some((_, p)) = PRIORITY_LEVELS.iter().find(|(name, _)| *name == level) {
            return Some(*p);
        }
    }
    integer(value)
}
