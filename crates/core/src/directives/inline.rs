//! Inline `:name[label]{attrs}` directives.
//!
//! markdown-rs knows nothing about directives, so recognized inline
//! directives are swapped for private-use markers before parsing. After
//! parsing, markers found in text nodes become directive references; markers
//! that landed anywhere else (code, raw HTML, URLs) are turned back into the
//! original source.

use markdown::mdast::{AttributeContent, AttributeValue, MdxJsxAttribute, MdxJsxTextElement, Node, Text};

use super::syntax::parse_directive_syntax;
use super::{DirectiveName, DirectiveSyntax};
use crate::code_fence::CodeFenceTracker;

const MARKER_START: char = '\u{E000}';
const MARKER_END: char = '\u{E001}';

/// Element name of the mdast node that stands in for an inline directive.
pub const INLINE_DIRECTIVE_TAG: &str = "lm-directive";
/// Attribute on the stand-in carrying the index into the document's inline table.
pub const INLINE_DIRECTIVE_REF: &str = "ref";

/// An inline directive that was replaced by a marker.
#[derive(Debug, Clone)]
pub(crate) struct MaskedDirective {
    /// Recognized name.
    pub name: DirectiveName,
    /// Parsed syntax.
    pub syntax: DirectiveSyntax,
    /// Original source text, restored when the marker lands outside text.
    pub raw: String,
}

/// Result of masking one Markdown chunk.
#[derive(Debug, Default)]
pub(crate) struct MaskedChunk {
    /// Chunk text with markers in place of recognized directives.
    pub text: String,
    /// Directives in marker order; marker `n` refers to `base + n`.
    pub directives: Vec<MaskedDirective>,
    /// Names written with inline syntax that are not recognized.
    pub unknown: Vec<String>,
}

/// Replaces recognized inline directives in `chunk` with markers numbered from `base`.
pub(crate) fn mask_inline_directives(chunk: &str, base: usize) -> MaskedChunk {
    let mut masked = MaskedChunk {
        text: String::with_capacity(chunk.len()),
        ..Default::default()
    };
    let mut fences = CodeFenceTracker::new();

    for line in chunk.split_inclusive('\n') {
        if fences.observe(line) {
            masked.text.push_str(line);
            continue;
        }
        mask_line(line, base, &mut masked);
    }

    masked
}

fn mask_line(line: &str, base: usize, masked: &mut MaskedChunk) {
    let bytes = line.as_bytes();
    let mut cursor = 0;
    let mut copied = 0;

    while cursor < bytes.len() {
        match bytes[cursor] {
            b'`' => {
                let run = bytes[cursor..].iter().take_while(|b| **b == b'`').count();
                cursor = skip_code_span(line, cursor, run);
            }
            b'\\' => cursor += 2,
            b'h' | b'H' | b'w' | b'W' if starts_bare_url(bytes, cursor) => {
                cursor = bare_url_end(bytes, cursor);
            }
            b':' if can_open(bytes, cursor) => {
                let Some((syntax, consumed)) = parse_directive_syntax(&line[cursor + 1..]) else {
                    cursor += 1;
                    continue;
                };
                if syntax.label.is_none() {
                    cursor += 1;
                    continue;
                }
                let end = cursor + 1 + consumed;
                match DirectiveName::parse(&syntax.name) {
                    Some(name) => {
                        masked.text.push_str(&line[copied..cursor]);
                        let index = base + masked.directives.len();
                        masked.text.push(MARKER_START);
                        masked.text.push_str(&index.to_string());
                        masked.text.push(MARKER_END);
                        masked.directives.push(MaskedDirective {
                            name,
                            syntax,
                            raw: line[cursor..end].to_string(),
                        });
                        copied = end;
                    }
                    None => masked.unknown.push(syntax.name),
                }
                cursor = end;
            }
            _ => cursor += 1,
        }
    }

    if copied < line.len() {
        masked.text.push_str(&line[copied..]);
    }
}

/// A directive colon must not follow another colon or a word character.
fn can_open(bytes: &[u8], at: usize) -> bool {
    let next_is_alpha = bytes.get(at + 1).is_some_and(u8::is_ascii_alphabetic);
    let prev_ok = at == 0 || !(bytes[at - 1] == b':' || bytes[at - 1].is_ascii_alphanumeric());
    next_is_alpha && prev_ok
}

/// Whether a GFM autolink literal (`http://`, `https://`, `www.`) starts at `at`.
fn starts_bare_url(bytes: &[u8], at: usize) -> bool {
    let boundary = at == 0
        || bytes[at - 1].is_ascii_whitespace()
        || matches!(bytes[at - 1], b'*' | b'_' | b'~' | b'(');
    let rest = &bytes[at..];
    let has_prefix = |prefix: &[u8]| {
        rest.len() > prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
    };
    boundary && (has_prefix(b"http://") || has_prefix(b"https://") || has_prefix(b"www."))
}

/// A bare url runs until whitespace or `<`.
fn bare_url_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'<')
        .map_or(bytes.len(), |len| start + len)
}

/// Returns the index just past a code span opened by `run` backticks at `start`,
/// or just past the backtick run when the span never closes on this line.
fn skip_code_span(line: &str, start: usize, run: usize) -> usize {
    let bytes = line.as_bytes();
    let mut cursor = start + run;
    while cursor < bytes.len() {
        if bytes[cursor] == b'`' {
            let closing = bytes[cursor..].iter().take_while(|b| **b == b'`').count();
            if closing == run {
                return cursor + closing;
            }
            cursor += closing;
        } else {
            cursor += 1;
        }
    }
    start + run
}

/// Builds the stand-in node for inline directive `index`.
pub(crate) fn reference_node(index: usize) -> Node {
    Node::MdxJsxTextElement(MdxJsxTextElement {
        children: Vec::new(),
        position: None,
        name: Some(INLINE_DIRECTIVE_TAG.to_string()),
        attributes: vec![AttributeContent::Property(MdxJsxAttribute {
            name: INLINE_DIRECTIVE_REF.to_string(),
            value: Some(AttributeValue::Literal(index.to_string())),
        })],
    })
}

/// Returns the inline table index if `node` is a directive stand-in.
pub fn reference_index(node: &MdxJsxTextElement) -> Option<usize> {
    if node.name.as_deref() != Some(INLINE_DIRECTIVE_TAG) {
        return None;
    }
    node.attributes.iter().find_map(|attr| match attr {
        AttributeContent::Property(prop) if prop.name == INLINE_DIRECTIVE_REF => match &prop.value {
            Some(AttributeValue::Literal(value)) => value.parse().ok(),
            _ => None,
        },
        _ => None,
    })
}

/// Replaces markers in the tree below `node`.
///
/// `raw_of` maps a global marker index to its original source.
pub(crate) fn splice_markers(node: &mut Node, raw_of: &dyn Fn(usize) -> Option<String>) {
    match node {
        Node::InlineCode(code) => code.value = restore(&code.value, raw_of),
        Node::Code(code) => code.value = restore(&code.value, raw_of),
        Node::Html(html) => html.value = restore(&html.value, raw_of),
        Node::Link(link) => {
            link.url = restore(&link.url, raw_of);
            restore_opt(&mut link.title, raw_of);
        }
        Node::Image(image) => {
            image.url = restore(&image.url, raw_of);
            image.alt = restore(&image.alt, raw_of);
            restore_opt(&mut image.title, raw_of);
        }
        Node::LinkReference(reference) => {
            reference.identifier = restore(&reference.identifier, raw_of);
            restore_opt(&mut reference.label, raw_of);
        }
        Node::ImageReference(image) => {
            image.alt = restore(&image.alt, raw_of);
            image.identifier = restore(&image.identifier, raw_of);
            restore_opt(&mut image.label, raw_of);
        }
        Node::Definition(definition) => {
            definition.url = restore(&definition.url, raw_of);
            definition.identifier = restore(&definition.identifier, raw_of);
            restore_opt(&mut definition.label, raw_of);
            restore_opt(&mut definition.title, raw_of);
        }
        _ => {}
    }

    let Some(children) = node.children_mut() else {
        return;
    };
    if !children.iter().any(|child| matches!(child, Node::Text(t) if t.value.contains(MARKER_START))) {
        for child in children.iter_mut() {
            splice_markers(child, raw_of);
        }
        return;
    }

    let mut spliced = Vec::with_capacity(children.len() + 2);
    for mut child in std::mem::take(children) {
        if let Node::Text(text) = &child
            && text.value.contains(MARKER_START)
        {
            split_text(&text.value, raw_of, &mut spliced);
            continue;
        }
        splice_markers(&mut child, raw_of);
        spliced.push(child);
    }
    *children = spliced;
}

fn split_text(value: &str, raw_of: &dyn Fn(usize) -> Option<String>, out: &mut Vec<Node>) {
    let mut pending = String::new();
    let mut rest = value;
    while let Some(start) = rest.find(MARKER_START) {
        pending.push_str(&rest[..start]);
        let after = &rest[start + MARKER_START.len_utf8()..];
        let Some(end) = after.find(MARKER_END) else {
            pending.push_str(&rest[start..]);
            rest = "";
            break;
        };
        match after[..end].parse::<usize>() {
            Ok(index) if raw_of(index).is_some() => {
                if !pending.is_empty() {
                    out.push(text_node(std::mem::take(&mut pending)));
                }
                out.push(reference_node(index));
            }
            _ => pending.push_str(&rest[start..start + MARKER_START.len_utf8() + end + MARKER_END.len_utf8()]),
        }
        rest = &after[end + MARKER_END.len_utf8()..];
    }
    pending.push_str(rest);
    if !pending.is_empty() {
        out.push(text_node(pending));
    }
}

fn text_node(value: String) -> Node {
    Node::Text(Text {
        value,
        position: None,
    })
}

fn restore_opt(value: &mut Option<String>, raw_of: &dyn Fn(usize) -> Option<String>) {
    if let Some(text) = value {
        *text = restore(text, raw_of);
    }
}

/// Puts original source back in place of markers.
fn restore(value: &str, raw_of: &dyn Fn(usize) -> Option<String>) -> String {
    if !value.contains(MARKER_START) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find(MARKER_START) {
        out.push_str(&rest[..start]);
        let after = &rest[start + MARKER_START.len_utf8()..];
        let replaced = after.find(MARKER_END).and_then(|end| {
            let raw = after[..end].parse::<usize>().ok().and_then(raw_of)?;
            Some((raw, end))
        });
        match replaced {
            Some((raw, end)) => {
                out.push_str(&raw);
                rest = &after[end + MARKER_END.len_utf8()..];
            }
            None => {
                out.push(MARKER_START);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_recognized_inline_directive() {
        let masked = mask_inline_directives("Click :button[Go]{href=\"/go\"} now\n", 0);
        assert_eq!(masked.directives.len(), 1);
        assert_eq!(masked.directives[0].name, DirectiveName::Button);
        assert_eq!(masked.directives[0].raw, ":button[Go]{href=\"/go\"}");
        assert_eq!(masked.text, "Click \u{E000}0\u{E001} now\n");
    }

    #[test]
    fn numbering_starts_at_base() {
        let masked = mask_inline_directives(":button[A] :button[B]", 3);
        assert_eq!(masked.text, "\u{E000}3\u{E001} \u{E000}4\u{E001}");
    }

    #[test]
    fn leaves_unknown_names_and_label_less_forms() {
        let masked = mask_inline_directives("See :kbd[Ctrl] and :button here", 0);
        assert!(masked.directives.is_empty());
        assert_eq!(masked.unknown, vec!["kbd".to_string()]);
        assert_eq!(masked.text, "See :kbd[Ctrl] and :button here");
    }

    #[test]
    fn ignores_colons_inside_words_and_times() {
        let masked = mask_inline_directives("at 10:30 and http:button[x] ::button[y]", 0);
        assert!(masked.directives.is_empty());
    }

    #[test]
    fn skips_code_spans_and_fences() {
        let input = "`:button[a]` and ``x :button[b] x``\n```\n:button[c]\n```\n";
        let masked = mask_inline_directives(input, 0);
        assert!(masked.directives.is_empty());
        assert_eq!(masked.text, input);
    }

    #[test]
    fn escaped_colon_is_literal() {
        let masked = mask_inline_directives(r"\:button[a]", 0);
        assert!(masked.directives.is_empty());
    }

    #[test]
    fn splits_text_nodes_around_markers() {
        let mut root = markdown::to_mdast("Go \u{E000}0\u{E001}!", &markdown::ParseOptions::default())
            .expect("plain markdown parses");
        splice_markers(&mut root, &|index| (index == 0).then(|| ":button[x]".to_string()));

        let Node::Paragraph(paragraph) = &root.children().unwrap()[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.children.len(), 3);
        let Node::MdxJsxTextElement(element) = &paragraph.children[1] else {
            panic!("expected stand-in element");
        };
        assert_eq!(reference_index(element), Some(0));
    }

    #[test]
    fn markers_outside_text_are_restored() {
        let mut root = markdown::to_mdast("`\u{E000}0\u{E001}`", &markdown::ParseOptions::default())
            .expect("plain markdown parses");
        splice_markers(&mut root, &|_| Some(":button[x]".to_string()));
        let Node::Paragraph(paragraph) = &root.children().unwrap()[0] else {
            panic!("expected paragraph");
        };
        let Node::InlineCode(code) = &paragraph.children[0] else {
            panic!("expected inline code");
        };
        assert_eq!(code.value, ":button[x]");
    }

    #[test]
    fn bare_urls_are_left_alone() {
        let masked = mask_inline_directives(
            "See https://ex.com/:button[y] or www.ex.com/:kbd[k] :kbd[K]\n",
            0,
        );
        assert_eq!(masked.directives.len(), 1);
        assert_eq!(masked.directives[0].raw, ":kbd[K]");
        assert!(masked.text.starts_with("See https://ex.com/:button[y] or www.ex.com/:kbd[k] "));

        // a word merely starting with "http" is not a url
        let masked = mask_inline_directives("httpd :kbd[K]\n", 0);
        assert_eq!(masked.directives.len(), 1);
    }

    #[test]
    fn markers_in_link_and_image_titles_are_restored() {
        let mut root = markdown::to_mdast(
            "[a](/u \"\u{E000}0\u{E001}\") ![b](/i \"\u{E000}0\u{E001}\")",
            &markdown::ParseOptions::default(),
        )
        .expect("plain markdown parses");
        splice_markers(&mut root, &|_| Some(":button[x]".to_string()));
        let Node::Paragraph(paragraph) = &root.children().unwrap()[0] else {
            panic!("expected paragraph");
        };
        let Node::Link(link) = &paragraph.children[0] else {
            panic!("expected link");
        };
        assert_eq!(link.title.as_deref(), Some(":button[x]"));
        let Node::Image(image) = &paragraph.children[2] else {
            panic!("expected image");
        };
        assert_eq!(image.title.as_deref(), Some(":button[x]"));
    }
}
