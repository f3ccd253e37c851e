//! Builder: raw records → task nodes.
//!
//! Records are JSON objects from any source. A [`SourceProfile`] says where
//! each capability lives and how to coerce it. Building is total for
//! optional fields (absent or malformed values fall back to defaults and
//! are logged) and strict for the identifier.
//!
//! # Defaults
//!
//! | Capability | When absent or invalid |
//! |------------|------------------------|
//! | Summary | the record key |
//! | Effort | `profile.default_effort` (also for a zero estimate) |
//! | Allocate | `profile.default_resource` |
//! | Depends, Start | omitted |
//! | Priority | omitted, or per `profile.priority` rules |

mod coerce;
mod profile;

pub use coerce::{round_effort, Coerced};
pub use profile::{Capability, Coercion, FieldBinding, PriorityRules, SourceProfile};

use chrono::Local;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::ident;
use crate::models::Node;

/// A record that could not be built, by position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub index: usize,
    pub error: LoadError,
}

/// Outcome of loading a batch of records.
#[derive(Debug, Clone, Default)]
pub struct LoadedTasks {
    /// Tasks in input order.
    pub tasks: Vec<Node>,
    pub rejected: Vec<RejectedRecord>,
}

/// Builds one task from a record.
///
/// # Errors
/// - [`LoadError::NotAnObject`] when the record is not a JSON object.
/// - [`LoadError::MissingIdentifier`] when the identifier field is absent.
/// - [`LoadError::InvalidKey`] when the key cannot be encoded losslessly.
pub fn build_task(profile: &SourceProfile, record: &Value) -> Result<Node, LoadError> {
    if !record.is_object() {
        return Err(LoadError::NotAnObject);
    }

    let key = identifier(profile, record)?;
    ident::check_key(&key)?;

    let mut task = Node::task(key.as_str());

    if let Some(summary) = field(profile, record, Capability::Summary, &key)
        .and_then(Coerced::into_text)
    {
        task.set_text(summary);
    }

    let effort = match field(profile, record, Capability::Effort, &key) {
        Some(value) => match value.into_effort() {
            Some(effort) if effort.amount > 0 => effort,
            Some(_) => {
                debug!(task = %key, "zero estimate, assuming default effort");
                profile.default_effort
            }
            None => {
                warn!(task = %key, "unusable estimate, assuming default effort");
                profile.default_effort
            }
        },
        None => {
            debug!(task = %key, effort = profile.default_effort.amount, "no estimate, assuming default effort");
            profile.default_effort
        }
    };
    task = task.with_effort(effort);

    let resource = match field(profile, record, Capability::Allocate, &key)
        .and_then(Coerced::into_text)
    {
        Some(resource) if ident::check_key(&resource).is_ok() => resource,
        Some(resource) => {
            warn!(task = %key, %resource, "resource cannot be used as an identifier, allocating default");
            profile.default_resource.clone()
        }
        None => profile.default_resource.clone(),
    };
    task = task.with_allocation(resource);

    if let Some(depends) = field(profile, record, Capability::Depends, &key)
        .and_then(Coerced::into_ids)
    {
        if !depends.is_empty() {
            task = task.with_depends(depends);
        }
    }

    if let Some(start) = field(profile, record, Capability::Start, &key)
        .and_then(Coerced::into_instant)
    {
        task = task.with_start(start);
    }

    let priority = match &profile.priority {
        Some(rules) => rules.resolve(
            profile.binding(Capability::Priority),
            record,
            Local::now().naive_local(),
        ),
        None => field(profile, record, Capability::Priority, &key).and_then(Coerced::into_integer),
    };
    if let Some(priority) = priority {
        task = task.with_priority(priority);
    }

    Ok(task)
}

/// Builds every record, skipping (and reporting) those that fail.
pub fn load_tasks<'a, I>(profile: &SourceProfile, records: I) -> LoadedTasks
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut loaded = LoadedTasks::default();
    for (index, record) in records.into_iter().enumerate() {
        match build_task(profile, record) {
            Ok(task) => {
                debug!(task = %task.id(), "loaded record");
                loaded.tasks.push(task);
            }
            Err(error) => {
                warn!(index, profile = %profile.name, %error, "skipping record");
                loaded.rejected.push(RejectedRecord { index, error });
            }
        }
    }
    loaded
}

fn identifier(profile: &SourceProfile, record: &Value) -> Result<String, LoadError> {
    let binding = profile
        .binding(Capability::Identifier)
        .ok_or_else(|| LoadError::MissingIdentifier {
            field: "<unbound>".to_string(),
        })?;
    binding
        .lookup(record)
        .and_then(|value| binding.coercion.apply(value))
        .and_then(Coerced::into_text)
        .ok_or_else(|| LoadError::MissingIdentifier {
            field: binding.path.clone(),
        })
}

/// Looks up and coerces a capability; a present but uncoercible value is
/// logged and treated as absent.
fn field(profile: &SourceProfile, record: &Value, capability: Capability, key: &str) -> Option<Coerced> {
    let binding = profile.binding(capability)?;
    let raw = binding.lookup(record)?;
    let coerced = binding.coercion.apply(raw);
    if coerced.is_none() {
        warn!(task = %key, field = %binding.path, value = %raw, "ignoring uncoercible field");
    }
    coerced
}
