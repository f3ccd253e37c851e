//! Typed node properties.
//!
//! A [`Property`] is either a leaf attribute (scalar or list) or a nested
//! [`Node`]. Leaf kinds know how to render their own value; layout and
//! recursion live in [`crate::render`].
//!
//! | Kind | Value | Renders as |
//! |------|-------|------------|
//! | `Allocate` | resource ids | `allocate me` |
//! | `Effort` | whole units + unit | `effort 2h` |
//! | `Depends` | task ids | `depends !a, !b` |
//! | `Priority` | integer | `priority 300` |
//! | `Start` | point in time | `start 2024-01-02-09:00:00` |
//! | `Declaration` | quoted string | `timezone "Europe/Dublin"` |

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::interval::format_instant;
use super::keyword;
use super::node::{Node, SlotKey};
use crate::ident;

/// Marker prefixed to every dependency reference.
pub const DEPENDS_MARKER: &str = "!";

/// Unit of an [`Effort`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortUnit {
    /// Working hours (`h`).
    #[default]
    Hour,
    /// Working days (`d`).
    Day,
}

impl EffortUnit {
    /// TaskJuggler unit suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Hour => "h",
            Self::Day => "d",
        }
    }
}

/// Planned work, in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effort {
    /// Number of units.
    pub amount: u32,
    /// Unit.
    #[serde(default)]
    pub unit: EffortUnit,
}

impl Effort {
    /// Effort in hours.
    pub fn hours(amount: u32) -> Self {
        Self {
            amount,
            unit: EffortUnit::Hour,
        }
    }

    /// Effort in days.
    pub fn days(amount: u32) -> Self {
        Self {
            amount,
            unit: EffortUnit::Day,
        }
    }
}

/// Resources allocated to a task. Only the first one is used when
/// bookings are merged back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocate {
    pub resources: Vec<String>,
}

impl Allocate {
    /// Allocates a single resource.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resources: vec![resource.into()],
        }
    }

    /// The resource bookings are attributed to.
    pub fn primary(&self) -> Option<&str> {
        self.resources.first().map(String::as_str)
    }
}

/// Tasks that must finish before this one starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Depends {
    pub tasks: Vec<String>,
}

impl Depends {
    /// Creates a dependency list.
    pub fn new<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }
}

/// A singleton string declaration (`timezone`, `outputdir`, `icalreport`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub keyword: String,
    pub value: String,
}

/// A property attached to a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Allocate(Allocate),
    Effort(Effort),
    Depends(Depends),
    Priority(i64),
    Start(NaiveDateTime),
    Declaration(Declaration),
    Node(Node),
}

impl Property {
    /// Creates a string declaration.
    pub fn declaration(keyword: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Declaration(Declaration {
            keyword: keyword.into(),
            value: value.into(),
        })
    }

    /// The property's keyword.
    pub fn keyword(&self) -> &str {
        match self {
            Self::Allocate(_) => keyword::ALLOCATE,
            Self::Effort(_) => keyword::EFFORT,
            Self::Depends(_) => keyword::DEPENDS,
            Self::Priority(_) => keyword::PRIORITY,
            Self::Start(_) => keyword::START,
            Self::Declaration(d) => &d.keyword,
            Self::Node(n) => n.keyword(),
        }
    }

    /// Slot key: leaf attributes are singletons, nodes decide themselves.
    pub fn slot_key(&self) -> SlotKey {
        match self {
            Self::Node(n) => n.slot_key(),
            other => SlotKey::Single(other.keyword().to_string()),
        }
    }

    /// Whether the property renders to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Allocate(a) => a.resources.is_empty(),
            Self::Depends(d) => d.tasks.is_empty(),
            Self::Declaration(d) => d.value.is_empty(),
            _ => false,
        }
    }

    /// Renders the value part of a leaf property.
    ///
    /// Returns `None` for nested nodes and for empty properties.
    pub fn render_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Self::Allocate(a) => Some(
                a.resources
                    .iter()
                    .map(|r| ident::encode(r))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Self::Effort(e) => Some(format!("{}{}", e.amount, e.unit.suffix())),
            Self::Depends(d) => Some(
                d.tasks
                    .iter()
                    .map(|t| format!("{DEPENDS_MARKER}{}", ident::encode(t)))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Self::Priority(p) => Some(p.to_string()),
            Self::Start(t) => Some(format_instant(t)),
            Self::Declaration(d) => Some(quote(&d.value)),
            Self::Node(_) => None,
        }
    }

    /// Returns the nested node, if any.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the nested node mutably, if any.
    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Node> for Property {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Effort> for Property {
    fn from(effort: Effort) -> Self {
        Self::Effort(effort)
    }
}

impl From<Allocate> for Property {
    fn from(allocate: Allocate) -> Self {
        Self::Allocate(allocate)
    }
}

impl From<Depends> for Property {
    fn from(depends: Depends) -> Self {
        Self::Depends(depends)
    }
}

/// Quotes a string literal, escaping backslashes and double quotes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
