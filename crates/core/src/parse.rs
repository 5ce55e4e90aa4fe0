//! markdown-rs adapter: parse options and chunk parsing.

use crate::{LitemarkError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};

/// Parser switches for the page pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs (tables, strikethrough,
    /// autolink literals, task lists, footnotes).
    pub gfm: bool,
    /// Parse raw HTML into HTML nodes.
    pub raw_html: bool,
    /// Recognize `:::` / `::` / `:` directives.
    pub directives: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
}

impl ParseOptions {
    /// Page defaults: GFM, raw HTML, and directives.
    pub const fn page() -> Self {
        Self {
            gfm: true,
            raw_html: true,
            directives: true,
            code_indented: true,
        }
    }

    /// The same grammar with directive recognition switched off.
    pub const fn plain() -> Self {
        Self {
            directives: false,
            ..Self::page()
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::page()
    }
}

/// Parse markdown into an MDAST tree using core options.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, LitemarkError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, LitemarkError> {
    markdown::to_mdast(input, options).map_err(|err| LitemarkError::MarkdownAdapter {
        message: err.to_string(),
        location: message_location(&err),
    })
}

/// Parses a directive label as phrasing content.
///
/// Labels that do not form a paragraph (for example `# x`) are kept as text.
pub fn parse_label(label: &str, options: &markdown::ParseOptions) -> Vec<Node> {
    if label.trim().is_empty() {
        return Vec::new();
    }
    let parsed = markdown::to_mdast(label, options).ok();
    let paragraph = parsed.and_then(|root| match root {
        Node::Root(root) => root.children.into_iter().next(),
        _ => None,
    });
    match paragraph {
        Some(Node::Paragraph(paragraph)) => paragraph.children,
        _ => vec![Node::Text(markdown::mdast::Text {
            value: label.to_string(),
            position: None,
        })],
    }
}

/// Source slices of the link reference and footnote definitions at the top
/// level of `input`.
///
/// Definitions are resolved per parse, so the directive pipeline appends
/// these to every chunk it parses separately.
pub fn definition_sources(input: &str, options: &markdown::ParseOptions) -> Vec<String> {
    if !input.contains("]:") {
        return Vec::new();
    }
    let Ok(Node::Root(root)) = markdown::to_mdast(input, options) else {
        return Vec::new();
    };
    root.children
        .iter()
        .filter(|node| matches!(node, Node::Definition(_) | Node::FootnoteDefinition(_)))
        .filter_map(|node| {
            let position = node.position()?;
            input
                .get(position.start.offset..position.end.offset)
                .map(str::to_string)
        })
        .collect()
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_options_enable_gfm_and_html() {
        let options = ParseOptions::page().to_markdown();
        assert!(options.constructs.gfm_table);
        assert!(options.constructs.gfm_strikethrough);
        assert!(options.constructs.html_flow);
        assert!(!options.constructs.frontmatter);
    }

    #[test]
    fn plain_differs_only_in_directives() {
        let plain = ParseOptions::plain();
        assert!(!plain.directives);
        assert_eq!(
            ParseOptions {
                directives: true,
                ..plain
            },
            ParseOptions::page()
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"raw_html": false}"#).unwrap();
        assert!(!options.raw_html);
        assert!(options.gfm);
    }

    #[test]
    fn label_parses_as_phrasing() {
        let nodes = parse_label("Read *more*", &ParseOptions::page().to_markdown());
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[1], Node::Emphasis(_)));
    }

    #[test]
    fn non_paragraph_label_is_literal() {
        let nodes = parse_label("# big", &ParseOptions::page().to_markdown());
        assert!(matches!(&nodes[0], Node::Text(t) if t.value == "# big"));
    }

    #[test]
    fn collects_definition_slices() {
        let input = "Intro [docs].\n\n[docs]: https://example.com \"Docs\"\n\n[^1]: A note.\n";
        let sources = definition_sources(input, &ParseOptions::page().to_markdown());
        assert_eq!(
            sources,
            vec![
                "[docs]: https://example.com \"Docs\"".to_string(),
                "[^1]: A note.".to_string()
            ]
        );
    }
}
