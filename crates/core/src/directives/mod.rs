//! Directive syntax layered on top of Markdown.
//!
//! Three forms are recognized:
//!
//! ```text
//! :::name[label]{key="value"}     container, closed by a fence of the same length
//! ::name[label]{key="value"}      leaf, one line
//! :name[label]{key="value"}       text, inline inside a paragraph
//! ```
//!
//! Only the names in [`DirectiveName`] become directive nodes. Anything else
//! stays literal Markdown.

mod attrs;
pub(crate) mod inline;
mod syntax;

pub use attrs::{Attributes, parse_attributes};
pub use syntax::{DirectiveSyntax, FenceLine, classify_line, parse_directive_syntax};

use crate::document::Block;
use markdown::mdast::Node;

/// Directive form, as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectiveKind {
    /// `:::name` block with children.
    Container,
    /// `::name` single-line block.
    Leaf,
    /// `:name[...]` inline.
    Text,
}

/// The closed set of directive names the transform understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectiveName {
    /// Grid container; `layout` selects the column template.
    Section,
    /// Column inside a section.
    Column,
    /// Bordered card.
    Card,
    /// Link styled as a button.
    Button,
}

impl DirectiveName {
    /// All recognized names.
    pub const ALL: [DirectiveName; 4] = [
        DirectiveName::Section,
        DirectiveName::Column,
        DirectiveName::Card,
        DirectiveName::Button,
    ];

    /// Looks up a recognized name. Names are case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "section" => Some(DirectiveName::Section),
            "column" => Some(DirectiveName::Column),
            "card" => Some(DirectiveName::Card),
            "button" => Some(DirectiveName::Button),
            _ => None,
        }
    }

    /// Source spelling of the name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveName::Section => "section",
            DirectiveName::Column => "column",
            DirectiveName::Card => "card",
            DirectiveName::Button => "button",
        }
    }
}

impl std::fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized directive node.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Source form.
    pub kind: DirectiveKind,
    /// Directive name.
    pub name: DirectiveName,
    /// Attributes from the `{...}` block.
    pub attributes: Attributes,
    /// Parsed `[label]` content (phrasing nodes), if a label was written.
    pub label: Option<Vec<Node>>,
    /// Child blocks. Always empty for leaf and text directives.
    pub children: Vec<Block>,
    /// Number of colons in the opening fence.
    pub fence_length: usize,
    /// 1-indexed source line of the directive.
    pub line: usize,
}

impl Directive {
    /// Returns an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Plain text of the label, if any.
    pub fn label_text(&self) -> Option<String> {
        self.label.as_ref().map(|nodes| plain_text(nodes))
    }
}

/// Concatenated text content of phrasing nodes.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        collect_text(node, &mut out);
    }
    out
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::InlineCode(code) => out.push_str(&code.value),
        other => {
            if let Some(children) = other.children() {
                for child in children {
                    collect_text(child, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_source_spelling() {
        for name in DirectiveName::ALL {
            assert_eq!(DirectiveName::parse(name.as_str()), Some(name));
        }
    }

    #[test]
    fn unknown_and_differently_cased_names_are_rejected() {
        assert_eq!(DirectiveName::parse("note"), None);
        assert_eq!(DirectiveName::parse("Section"), None);
        assert_eq!(DirectiveName::parse(""), None);
    }
}
