//! `{#id .class key="value"}` attribute blocks.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::CharIndices;

/// Directive attributes. Ordering carries no meaning.
pub type Attributes = BTreeMap<String, String>;

/// Parses an attribute block starting at `{`.
///
/// Returns the attributes and the number of bytes consumed, including the
/// closing brace. Returns `None` when the block is malformed (unterminated
/// brace or quote, stray characters), in which case the caller treats the
/// whole construct as literal text.
///
/// Later duplicates win, except `class`, which accumulates.
pub fn parse_attributes(input: &str) -> Option<(Attributes, usize)> {
    let mut chars = input.char_indices().peekable();
    if !matches!(chars.next(), Some((_, '{'))) {
        return None;
    }

    let mut attrs = Attributes::new();
    loop {
        skip_whitespace(&mut chars);
        let (index, ch) = chars.next()?;
        match ch {
            '}' => return Some((attrs, index + 1)),
            '#' => {
                let value = take_while(input, &mut chars, is_shorthand_char);
                if value.is_empty() {
                    return None;
                }
                attrs.insert("id".to_string(), value.to_string());
            }
            '.' => {
                let value = take_while(input, &mut chars, is_shorthand_char);
                if value.is_empty() {
                    return None;
                }
                push_class(&mut attrs, value);
            }
            c if is_name_start(c) => {
                let rest = take_while(input, &mut chars, is_name_char);
                let key = &input[index..index + c.len_utf8() + rest.len()];
                skip_whitespace(&mut chars);
                let value = if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    skip_whitespace(&mut chars);
                    take_value(input, &mut chars)?
                } else {
                    String::new()
                };
                if key == "class" {
                    push_class(&mut attrs, &value);
                } else {
                    attrs.insert(key.to_string(), value);
                }
            }
            _ => return None,
        }
    }
}

fn push_class(attrs: &mut Attributes, value: &str) {
    if value.is_empty() {
        attrs.entry("class".to_string()).or_default();
        return;
    }
    let entry = attrs.entry("class".to_string()).or_default();
    if !entry.is_empty() {
        entry.push(' ');
    }
    entry.push_str(value);
}

fn take_value(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Option<String> {
    let &(start, first) = chars.peek()?;
    if first == '"' || first == '\'' {
        chars.next();
        for (index, ch) in chars.by_ref() {
            if ch == first {
                return Some(input[start + 1..index].to_string());
            }
        }
        return None;
    }

    let value = take_while(input, chars, is_unquoted_char);
    (!value.is_empty()).then(|| value.to_string())
}

fn take_while<'a>(
    input: &'a str,
    chars: &mut Peekable<CharIndices<'_>>,
    accept: fn(char) -> bool,
) -> &'a str {
    let start = match chars.peek() {
        Some(&(index, _)) => index,
        None => return "",
    };
    let mut end = start;
    while let Some(&(index, ch)) = chars.peek() {
        if !accept(ch) {
            break;
        }
        end = index + ch.len_utf8();
        chars.next();
    }
    &input[start..end]
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
        chars.next();
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

fn is_shorthand_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '#' | '.' | '{' | '}' | '=' | '<' | '>' | '`')
}

fn is_unquoted_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '{' | '}' | '=' | '<' | '>' | '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(input: &str) -> Attributes {
        parse_attributes(input).expect("attributes should parse").0
    }

    #[test]
    fn parses_quoted_and_unquoted_values() {
        let parsed = attrs(r#"{layout="50-50" href='/about' size=lg}"#);
        assert_eq!(parsed.get("layout").map(String::as_str), Some("50-50"));
        assert_eq!(parsed.get("href").map(String::as_str), Some("/about"));
        assert_eq!(parsed.get("size").map(String::as_str), Some("lg"));
    }

    #[test]
    fn reports_consumed_length() {
        let input = r#"{a="1"} trailing"#;
        let (_, consumed) = parse_attributes(input).unwrap();
        assert_eq!(&input[consumed..], " trailing");
    }

    #[test]
    fn shorthand_id_and_classes() {
        let parsed = attrs(r#"{#hero .wide .dark class="extra"}"#);
        assert_eq!(parsed.get("id").map(String::as_str), Some("hero"));
        assert_eq!(
            parsed.get("class").map(String::as_str),
            Some("wide dark extra")
        );
    }

    #[test]
    fn bare_key_has_empty_value() {
        let parsed = attrs("{hidden}");
        assert_eq!(parsed.get("hidden").map(String::as_str), Some(""));
    }

    #[test]
    fn later_duplicate_wins() {
        let parsed = attrs(r#"{href="/a" href="/b"}"#);
        assert_eq!(parsed.get("href").map(String::as_str), Some("/b"));
    }

    #[test]
    fn whitespace_around_equals_is_allowed() {
        let parsed = attrs(r#"{ layout = "60-40" }"#);
        assert_eq!(parsed.get("layout").map(String::as_str), Some("60-40"));
    }

    #[test]
    fn empty_block_is_valid() {
        assert!(attrs("{}").is_empty());
        assert!(attrs("{   }").is_empty());
    }

    #[test]
    fn malformed_blocks_are_rejected() {
        assert!(parse_attributes(r#"{href="/about}"#).is_none());
        assert!(parse_attributes(r#"{href="/about""#).is_none());
        assert!(parse_attributes("{#}").is_none());
        assert!(parse_attributes("{a=}").is_none());
        assert!(parse_attributes("{=x}").is_none());
        assert!(parse_attributes("no brace").is_none());
    }
}
