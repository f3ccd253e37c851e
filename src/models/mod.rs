//! Project object model.
//!
//! A TaskJuggler source is a tree of [`Node`]s. Each node owns an ordered
//! set of [`Property`] values; a property is either a typed leaf attribute
//! or another node.
//!
//! # Construct Mappings
//!
//! | Node | TaskJuggler | Created by |
//! |------|-------------|------------|
//! | `Node::source` | whole `.tjp` file | pipeline |
//! | `Node::project` | `project` | pipeline |
//! | `Node::resource` | `resource` | pipeline |
//! | `Node::task` | `task` | loader |
//! | `Node::booking` | `booking` | result merge |

mod booking;
mod interval;
pub mod keyword;
mod node;
mod project;
mod property;
mod resource;
mod task;

pub use interval::{format_instant, Interval, Precision, DATETIME_FORMAT, DATE_FORMAT};
pub use node::{Clause, Node, SlotKey};
pub use project::{ProjectSettings, COMMENTS_HEADER};
pub use property::{
    quote, Allocate, Declaration, Depends, Effort, EffortUnit, Property, DEPENDS_MARKER,
};
pub use resource::{DEFAULT_RESOURCE_ID, DEFAULT_RESOURCE_NAME};
pub use task::{UNINITIALIZED_TASK_ID, UNINITIALIZED_TASK_TEXT};
