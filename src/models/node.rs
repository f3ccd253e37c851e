//! Generic node tree.
//!
//! Every TaskJuggler construct (project, resource, task, booking, and the
//! root container holding them) is a [`Node`]: keyword, identifier, optional
//! display text, optional inline clause, and an ordered property set.
//!
//! # Invariants
//! - Property order is insertion order, and insertion order is rendering
//!   order. Replacing a property keeps its position.
//! - A property's [`SlotKey`] decides placement: a `Single` key replaces the
//!   previous property with the same keyword, a `Multiple` key lets many
//!   instances coexist.
//! - Identifiers are stored raw (as the external key) and only encoded when
//!   rendered.
//! - The parent handle is the parent's slot key, recorded on attach. It is a
//!   lookup key, never an owning pointer.

use super::interval::Interval;
use super::property::Property;
use crate::error::ModelError;
use crate::ident;

/// Placement key of a property inside its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// At most one property with this keyword.
    Single(String),
    /// Keyword plus discriminator (identifier and clause).
    Multiple {
        keyword: String,
        discriminator: String,
    },
}

/// Trailing positional arguments of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A time interval (project horizon, booking slot).
    Interval(Interval),
    /// Verbatim text.
    Raw(String),
}

impl Clause {
    /// Renders the clause verbatim.
    pub fn render(&self) -> String {
        match self {
            Self::Interval(interval) => interval.render(),
            Self::Raw(text) => text.clone(),
        }
    }

    /// Returns the interval, if this clause is one.
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Self::Interval(interval) => Some(interval),
            Self::Raw(_) => None,
        }
    }
}

/// One renderable construct in the project description tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    keyword: String,
    id: String,
    text: Option<String>,
    clause: Option<Clause>,
    enclosed: bool,
    singleton: bool,
    header: Option<String>,
    properties: Vec<Property>,
    parent: Option<SlotKey>,
}

impl Node {
    /// Creates an enclosed, multiple-slot node.
    pub fn new(keyword: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            id: id.into(),
            text: None,
            clause: None,
            enclosed: true,
            singleton: false,
            header: None,
            properties: Vec::new(),
            parent: None,
        }
    }

    /// Creates a keyword-less root container whose children render as flat
    /// top-level declarations.
    pub fn container() -> Self {
        Self {
            enclosed: false,
            singleton: true,
            ..Self::new("", "")
        }
    }

    /// Sets the display text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the inline clause.
    pub fn with_clause(mut self, clause: Clause) -> Self {
        self.clause = Some(clause);
        self
    }

    /// Sets the header comment block (root only).
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Marks the node as a singleton within its parent.
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Renders properties unwrapped instead of inside `{ }`.
    pub fn flat(mut self) -> Self {
        self.enclosed = false;
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, property: impl Into<Property>) -> Self {
        self.set_property(property);
        self
    }

    /// Declaration keyword (`task`, `booking`, ...); empty for the root
    /// container.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Raw (unencoded) identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display text, rendered quoted after the identifier.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replaces the display text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Inline clause rendered after the text.
    pub fn clause(&self) -> Option<&Clause> {
        self.clause.as_ref()
    }

    /// Whether properties render inside `{ }`.
    pub fn is_enclosed(&self) -> bool {
        self.enclosed
    }

    /// Header comment block.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Properties in rendering order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Slot key of the node this one is attached to.
    pub fn parent(&self) -> Option<&SlotKey> {
        self.parent.as_ref()
    }

    /// This node's placement key inside its parent.
    pub fn slot_key(&self) -> SlotKey {
        if self.singleton {
            return SlotKey::Single(self.keyword.clone());
        }
        let discriminator = match &self.clause {
            Some(clause) => format!("{} {}", self.id, clause.render()),
            None => self.id.clone(),
        };
        SlotKey::Multiple {
            keyword: self.keyword.clone(),
            discriminator,
        }
    }

    /// Inserts or replaces a property according to its slot key.
    ///
    /// Returns the replaced property, which keeps its position.
    pub fn set_property(&mut self, property: impl Into<Property>) -> Option<Property> {
        let mut property = property.into();
        if let Property::Node(child) = &mut property {
            child.parent = Some(self.slot_key());
        }

        let key = property.slot_key();
        match self.properties.iter().position(|p| p.slot_key() == key) {
            Some(pos) => Some(std::mem::replace(&mut self.properties[pos], property)),
            None => {
                self.properties.push(property);
                None
            }
        }
    }

    /// Attaches a child node, refusing identifier collisions.
    ///
    /// # Errors
    /// [`ModelError::IdentifierCollision`] when a sibling with the same
    /// keyword has a different raw identifier that encodes identically.
    pub fn attach(&mut self, child: Node) -> Result<Option<Property>, ModelError> {
        let encoded = ident::encode(&child.id);
        let clash = self
            .child_nodes(&child.keyword)
            .find(|sibling| sibling.id != child.id && ident::encode(&sibling.id) == encoded);
        if let Some(sibling) = clash {
            return Err(ModelError::IdentifierCollision {
                identifier: encoded,
                existing: sibling.id.clone(),
                incoming: child.id,
            });
        }
        Ok(self.set_property(child))
    }

    /// First direct property with `keyword`.
    pub fn property(&self, keyword: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.keyword() == keyword)
    }

    /// First direct property with `keyword`, mutably.
    pub fn property_mut(&mut self, keyword: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.keyword() == keyword)
    }

    /// Removes the first direct property with `keyword`.
    pub fn remove_property(&mut self, keyword: &str) -> Option<Property> {
        let pos = self.properties.iter().position(|p| p.keyword() == keyword)?;
        Some(self.properties.remove(pos))
    }

    /// Direct child nodes with `keyword`.
    pub fn child_nodes<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.properties
            .iter()
            .filter_map(Property::as_node)
            .filter(move |n| n.keyword == keyword)
    }

    /// All descendant properties with `keyword`, depth-first in rendering
    /// order.
    pub fn walk(&self, keyword: &str) -> Vec<&Property> {
        let mut found = Vec::new();
        self.collect(keyword, &mut found);
        found
    }

    /// All descendant nodes with `keyword`.
    pub fn walk_nodes(&self, keyword: &str) -> Vec<&Node> {
        self.walk(keyword)
            .into_iter()
            .filter_map(Property::as_node)
            .collect()
    }

    fn collect<'a>(&'a self, keyword: &str, found: &mut Vec<&'a Property>) {
        for property in &self.properties {
            if property.keyword() == keyword {
                found.push(property);
            }
            if let Property::Node(child) = property {
                child.collect(keyword, found);
            }
        }
    }

    /// First descendant node with `keyword` and raw identifier `id`.
    pub fn find_node_mut(&mut self, keyword: &str, id: &str) -> Option<&mut Node> {
        self.find_descendant_mut(&|n: &Node| n.keyword == keyword && n.id == id)
    }

    /// First descendant node with `keyword`.
    pub fn first_node_mut(&mut self, keyword: &str) -> Option<&mut Node> {
        self.find_descendant_mut(&|n: &Node| n.keyword == keyword)
    }

    fn find_descendant_mut<F>(&mut self, pred: &F) -> Option<&mut Node>
    where
        F: Fn(&Node) -> bool,
    {
        for child in self.properties.iter_mut().filter_map(Property::as_node_mut) {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Value of the first declaration with `keyword` anywhere in the tree.
    pub fn declaration(&self, keyword: &str) -> Option<&str> {
        self.walk(keyword).into_iter().find_map(|p| match p {
            Property::Declaration(d) => Some(d.value.as_str()),
            _ => None,
        })
    }

    /// Replaces the value of the first declaration with `keyword` anywhere in
    /// the tree and returns the previous value. Returns `None` and changes
    /// nothing when no such declaration exists.
    pub fn replace_declaration(&mut self, keyword: &str, value: &str) -> Option<String> {
        for property in &mut self.properties {
            if let Property::Declaration(d) = property {
                if d.keyword == keyword {
                    return Some(std::mem::replace(&mut d.value, value.to_string()));
                }
            }
        }
        self.properties
            .iter_mut()
            .filter_map(Property::as_node_mut)
            .find_map(|child| child.replace_declaration(keyword, value))
    }

    /// Removes the first declaration with `keyword` anywhere in the tree.
    pub fn remove_declaration(&mut self, keyword: &str) -> Option<String> {
        let pos = self.properties.iter().position(
            |p| matches!(p, Property::Declaration(d) if d.keyword == keyword),
        );
        if let Some(pos) = pos {
            if let Property::Declaration(d) = self.properties.remove(pos) {
                return Some(d.value);
            }
        }
        self.properties
            .iter_mut()
            .filter_map(Property::as_node_mut)
            .find_map(|child| child.remove_declaration(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{keyword, Effort};

    #[test]
    fn test_singleton_property_replaced_in_place() {
        let mut node = Node::new("project", "p")
            .with_property(Property::declaration("timezone", "UTC"))
            .with_property(Property::declaration("outputdir", "REPORT"));

        let old = node.set_property(Property::declaration("timezone", "Europe/Dublin"));
        assert_eq!(old, Some(Property::declaration("timezone", "UTC")));
        assert_eq!(node.properties().len(), 2);
        assert_eq!(node.properties()[0].keyword(), "timezone");
        assert_eq!(node.declaration("timezone"), Some("Europe/Dublin"));
    }

    #[test]
    fn test_multiple_properties_coexist_in_order() {
        let mut root = Node::container();
        root.set_property(Node::new("task", "b"));
        root.set_property(Node::new("task", "a"));
        root.set_property(Node::new("task", "b").with_text("again"));

        let ids: Vec<&str> = root.walk_nodes("task").iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(root.walk_nodes("task")[0].text(), Some("again"));
    }

    #[test]
    fn test_parent_handle_set_on_attach() {
        let mut task = Node::new("task", "t1");
        task.set_property(Node::new("booking", "me"));
        let booking = task.walk_nodes("booking")[0];
        assert_eq!(
            booking.parent(),
            Some(&SlotKey::Multiple {
                keyword: "task".into(),
                discriminator: "t1".into()
            })
        );
    }

    #[test]
    fn test_attach_detects_collision() {
        let mut root = Node::container();
        root.attach(Node::new("task", "a-b")).unwrap();
        let err = root.attach(Node::new("task", "a_d_b")).unwrap_err();
        assert_eq!(
            err,
            ModelError::IdentifierCollision {
                identifier: "a_d_b".into(),
                existing: "a-b".into(),
                incoming: "a_d_b".into(),
            }
        );
        assert_eq!(root.walk_nodes("task").len(), 1);
    }

    #[test]
    fn test_attach_same_key_replaces() {
        let mut root = Node::container();
        root.attach(Node::new("task", "x")).unwrap();
        let replaced = root.attach(Node::new("task", "x").with_text("new")).unwrap();
        assert!(replaced.is_some());
        assert_eq!(root.walk_nodes("task").len(), 1);
    }

    #[test]
    fn test_walk_is_recursive() {
        let root = Node::container()
            .with_property(Node::new("task", "a").with_property(Effort::hours(1)))
            .with_property(Node::new("task", "b").with_property(Effort::hours(2)));
        assert_eq!(root.walk(keyword::EFFORT).len(), 2);
        assert_eq!(root.walk(keyword::TASK).len(), 2);
        assert!(root.walk(keyword::BOOKING).is_empty());
    }

    #[test]
    fn test_find_node_mut() {
        let mut root = Node::container().with_property(
            Node::new("project", "p").with_property(Node::new("task", "deep")),
        );
        let deep = root.find_node_mut("task", "deep").unwrap();
        deep.set_text("found");
        assert_eq!(root.walk_nodes("task")[0].text(), Some("found"));
        assert!(root.find_node_mut("task", "missing").is_none());
    }

    #[test]
    fn test_declaration_replace_and_remove() {
        let mut root = Node::container()
            .with_property(
                Node::new("project", "p").with_property(Property::declaration("outputdir", "R")),
            )
            .with_property(Property::declaration("icalreport", "calendar"));

        assert_eq!(root.replace_declaration("outputdir", "/tmp/x"), Some("R".into()));
        assert_eq!(root.declaration("outputdir"), Some("/tmp/x"));
        assert_eq!(root.replace_declaration("missing", "v"), None);

        assert_eq!(root.remove_declaration("outputdir"), Some("/tmp/x".into()));
        assert_eq!(root.declaration("outputdir"), None);
        assert_eq!(root.declaration("icalreport"), Some("calendar"));
    }

    #[test]
    fn test_remove_property() {
        let mut task = Node::new("task", "t").with_property(Effort::hours(3));
        assert!(task.remove_property("effort").is_some());
        assert!(task.property("effort").is_none());
        assert!(task.remove_property("effort").is_none());
    }
}
