//! Line-level directive syntax: container fences and leaf lines.

use super::attrs::{Attributes, parse_attributes};
use crate::code_fence::leading_indent;

/// Name, label, and attributes following the colons of a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSyntax {
    /// Number of colons before the name.
    pub colons: usize,
    /// Directive name as written.
    pub name: String,
    /// Raw label source between `[` and `]`, if present.
    pub label: Option<String>,
    /// Parsed attributes.
    pub attributes: Attributes,
}

/// Classification of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceLine {
    /// `:::name...` opening a container.
    Open(DirectiveSyntax),
    /// Bare colon fence (3 or more) closing a container.
    Close(usize),
    /// `::name...` leaf directive.
    Leaf(DirectiveSyntax),
    /// Anything else.
    Text,
}

/// Classifies one line (without its line ending).
pub fn classify_line(line: &str) -> FenceLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let (columns, bytes) = leading_indent(line);
    if columns > 3 {
        return FenceLine::Text;
    }
    let body = &line[bytes..];
    let colons = body.bytes().take_while(|b| *b == b':').count();
    if colons < 2 {
        return FenceLine::Text;
    }

    let rest = &body[colons..];
    if colons >= 3 && rest.trim().is_empty() {
        return FenceLine::Close(colons);
    }

    let Some((mut syntax, consumed)) = parse_directive_syntax(rest) else {
        return FenceLine::Text;
    };
    if !rest[consumed..].trim().is_empty() {
        return FenceLine::Text;
    }
    syntax.colons = colons;

    if colons == 2 {
        FenceLine::Leaf(syntax)
    } else {
        FenceLine::Open(syntax)
    }
}

/// Parses `name[label]{attrs}` at the start of `input` (after the colons).
///
/// Returns the syntax (with `colons` left at zero) and the bytes consumed.
pub fn parse_directive_syntax(input: &str) -> Option<(DirectiveSyntax, usize)> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    let name_end = input
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .map(|(index, _)| index)
        .unwrap_or(input.len());
    let name = input[..name_end].to_string();
    let mut cursor = name_end;

    let mut label = None;
    if input[cursor..].starts_with('[') {
        let (text, consumed) = parse_label(&input[cursor..])?;
        label = Some(text.to_string());
        cursor += consumed;
    }

    let mut attributes = Attributes::new();
    if input[cursor..].starts_with('{') {
        let (parsed, consumed) = parse_attributes(&input[cursor..])?;
        attributes = parsed;
        cursor += consumed;
    }

    Some((
        DirectiveSyntax {
            colons: 0,
            name,
            label,
            attributes,
        },
        cursor,
    ))
}

/// Parses a balanced `[...]` label, honoring backslash escapes.
fn parse_label(input: &str) -> Option<(&str, usize)> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (index, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&input[1..index], index + 1));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(line: &str) -> DirectiveSyntax {
        match classify_line(line) {
            FenceLine::Open(syntax) => syntax,
            other => panic!("expected opener for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn container_opener_with_attributes() {
        let syntax = open(r#":::::section{layout="50-50"}"#);
        assert_eq!(syntax.colons, 5);
        assert_eq!(syntax.name, "section");
        assert_eq!(syntax.label, None);
        assert_eq!(
            syntax.attributes.get("layout").map(String::as_str),
            Some("50-50")
        );
    }

    #[test]
    fn container_opener_with_label_and_trailing_space() {
        let syntax = open(":::card[Pricing *plans*]   ");
        assert_eq!(syntax.colons, 3);
        assert_eq!(syntax.label.as_deref(), Some("Pricing *plans*"));
    }

    #[test]
    fn closers_report_their_length() {
        assert_eq!(classify_line(":::"), FenceLine::Close(3));
        assert_eq!(classify_line("  ::::  \r\n"), FenceLine::Close(4));
        assert_eq!(classify_line("::"), FenceLine::Text);
    }

    #[test]
    fn leaf_directive_line() {
        match classify_line(r#"::button[Get started]{href="/start"}"#) {
            FenceLine::Leaf(syntax) => {
                assert_eq!(syntax.name, "button");
                assert_eq!(syntax.label.as_deref(), Some("Get started"));
                assert_eq!(
                    syntax.attributes.get("href").map(String::as_str),
                    Some("/start")
                );
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn nested_brackets_and_escapes_in_label() {
        let (syntax, consumed) = parse_directive_syntax(r"button[a [b] \] c]").unwrap();
        assert_eq!(syntax.label.as_deref(), Some(r"a [b] \] c"));
        assert_eq!(consumed, r"button[a [b] \] c]".len());
    }

    #[test]
    fn malformed_lines_stay_text() {
        // trailing garbage
        assert_eq!(classify_line(":::card extra"), FenceLine::Text);
        // unterminated attribute block
        assert_eq!(classify_line(r#":::card{class="x"#), FenceLine::Text);
        // unterminated label
        assert_eq!(classify_line("::button[Go"), FenceLine::Text);
        // name must start with a letter
        assert_eq!(classify_line(":::1col"), FenceLine::Text);
        // indented code
        assert_eq!(classify_line("    :::card"), FenceLine::Text);
        // single colon is inline territory
        assert_eq!(classify_line(":button[Go]"), FenceLine::Text);
    }
}
