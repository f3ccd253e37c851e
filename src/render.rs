//! Serializer: node tree → TaskJuggler source text.
//!
//! # Algorithm
//!
//! 1. Emit the header comment block of the node being rendered (only the
//!    root carries one), followed by a blank line.
//! 2. For each node with a keyword emit `keyword identifier`, the identifier
//!    encoded at this point, then `"text"` and the inline clause when set.
//! 3. An enclosed node with at least one non-empty property wraps its
//!    properties in `{ }` one indentation level deeper. Otherwise the
//!    properties render unwrapped at the node's own level, which is how the
//!    keyword-less root lays out its children as top-level declarations.
//! 4. Properties render in slot-insertion order; empty ones render nothing.
//!
//! Rendering is a pure function of the tree: the same tree always yields
//! byte-identical text.

use std::fmt;

use crate::ident;
use crate::models::{quote, Node, Property};

/// One indentation level.
pub const INDENT: &str = "    ";

/// Renders a node (normally the source root) to TaskJuggler text.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    if let Some(header) = node.header() {
        out.push_str(header);
        out.push_str("\n\n");
    }
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    let has_content = node.properties().iter().any(|p| !p.is_empty());

    if node.keyword().is_empty() {
        render_properties(node, depth, out);
        return;
    }

    push_indent(depth, out);
    out.push_str(node.keyword());
    if !node.id().is_empty() {
        out.push(' ');
        out.push_str(&ident::encode(node.id()));
    }
    if let Some(text) = node.text() {
        out.push(' ');
        out.push_str(&quote(text));
    }
    if let Some(clause) = node.clause() {
        out.push(' ');
        out.push_str(&clause.render());
    }

    if node.is_enclosed() && has_content {
        out.push_str(" {\n");
        render_properties(node, depth + 1, out);
        push_indent(depth, out);
        out.push_str("}\n");
    } else {
        out.push('\n');
        render_properties(node, depth, out);
    }
}

fn render_properties(node: &Node, depth: usize, out: &mut String) {
    for property in node.properties() {
        match property {
            Property::Node(child) => render_node(child, depth, out),
            leaf => {
                if let Some(value) = leaf.render_value() {
                    push_indent(depth, out);
                    out.push_str(leaf.keyword());
                    out.push(' ');
                    out.push_str(&value);
                    out.push('\n');
                }
            }
        }
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}
