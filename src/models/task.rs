//! Task nodes.
//!
//! A task is a [`Node`] with keyword `task` whose identifier is the external
//! record key. It is created by the loader, corrected by validation, and
//! receives bookings from the result merge.

use chrono::NaiveDateTime;

use super::keyword;
use super::node::Node;
use super::property::{Allocate, Depends, Effort, Property};

/// Identifier of a task that was never loaded from a record.
pub const UNINITIALIZED_TASK_ID: &str = "unknown_task";
/// Display text of a task that was never loaded from a record.
pub const UNINITIALIZED_TASK_TEXT: &str = "Task is not initialized";

impl Node {
    /// Creates a task named after its key.
    pub fn task(key: impl Into<String>) -> Self {
        let key = key.into();
        Node::new(keyword::TASK, key.clone()).with_text(key)
    }

    /// Creates the uninitialized placeholder task.
    pub fn placeholder_task() -> Self {
        Node::new(keyword::TASK, UNINITIALIZED_TASK_ID).with_text(UNINITIALIZED_TASK_TEXT)
    }

    /// Sets the effort.
    pub fn with_effort(self, effort: Effort) -> Self {
        self.with_property(effort)
    }

    /// Allocates a resource.
    pub fn with_allocation(self, resource: impl Into<String>) -> Self {
        self.with_property(Allocate::new(resource))
    }

    /// Sets the dependency list.
    pub fn with_depends<I, S>(self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_property(Depends::new(tasks))
    }

    /// Sets the scheduling priority.
    pub fn with_priority(self, priority: i64) -> Self {
        self.with_property(Property::Priority(priority))
    }

    /// Sets the earliest start.
    pub fn with_start(self, start: NaiveDateTime) -> Self {
        self.with_property(Property::Start(start))
    }

    /// Whether this node is a task.
    pub fn is_task(&self) -> bool {
        self.keyword() == keyword::TASK
    }

    /// Whether this task still carries the placeholder identifier.
    pub fn is_placeholder(&self) -> bool {
        self.is_task() && self.id() == UNINITIALIZED_TASK_ID
    }

    /// Planned effort.
    pub fn effort(&self) -> Option<Effort> {
        match self.property(keyword::EFFORT)? {
            Property::Effort(e) => Some(*e),
            _ => None,
        }
    }

    /// Dependency identifiers (empty when none are declared).
    pub fn depends(&self) -> &[String] {
        match self.property(keyword::DEPENDS) {
            Some(Property::Depends(d)) => &d.tasks,
            _ => &[],
        }
    }

    /// The resource bookings are attributed to.
    pub fn allocated_resource(&self) -> Option<&str> {
        match self.property(keyword::ALLOCATE)? {
            Property::Allocate(a) => a.primary(),
            _ => None,
        }
    }

    /// All allocated resources.
    pub fn allocations(&self) -> &[String] {
        match self.property(keyword::ALLOCATE) {
            Some(Property::Allocate(a)) => &a.resources,
            _ => &[],
        }
    }

    /// Scheduling priority.
    pub fn priority(&self) -> Option<i64> {
        match self.property(keyword::PRIORITY)? {
            Property::Priority(p) => Some(*p),
            _ => None,
        }
    }

    /// Earliest start.
    pub fn start(&self) -> Option<NaiveDateTime> {
        match self.property(keyword::START)? {
            Property::Start(t) => Some(*t),
            _ => None,
        }
    }
}
