//! Resource nodes.
//!
//! Resources are the people (or machines) tasks are allocated to. Every
//! allocated resource must be declared before the tasks that use it.

use super::keyword;
use super::node::Node;

/// Resource allocated when a record names none.
pub const DEFAULT_RESOURCE_ID: &str = "me";
/// Display name of the default resource.
pub const DEFAULT_RESOURCE_NAME: &str = "Default Resource";

impl Node {
    /// Creates a resource declaration.
    pub fn resource(id: impl Into<String>, name: impl Into<String>) -> Self {
        Node::new(keyword::RESOURCE, id).with_text(name)
    }

    /// Creates the default resource declaration.
    pub fn default_resource() -> Self {
        Self::resource(DEFAULT_RESOURCE_ID, DEFAULT_RESOURCE_NAME)
    }

    /// Whether this node is a resource.
    pub fn is_resource(&self) -> bool {
        self.keyword() == keyword::RESOURCE
    }
}
