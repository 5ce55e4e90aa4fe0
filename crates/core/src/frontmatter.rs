//! YAML frontmatter extraction and the typed page schema.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Result returned after extracting frontmatter from page content.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterExtraction {
    /// Parsed frontmatter as a JSON value (always an object).
    pub value: JsonValue,
    /// Byte offset inside the original content where the Markdown body begins.
    pub body_start: usize,
}

impl FrontmatterExtraction {
    fn empty() -> Self {
        Self {
            value: JsonValue::Object(Default::default()),
            body_start: 0,
        }
    }

    /// Returns the Markdown body of `content` (the input this extraction came from).
    pub fn body<'a>(&self, content: &'a str) -> &'a str {
        content.get(self.body_start..).unwrap_or("")
    }
}

/// Errors emitted while parsing or extracting frontmatter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (e.g., missing terminating `---`).
    #[error("Unterminated YAML frontmatter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

impl FrontmatterError {
    /// The parser-reported reason, suitable for showing to the page author.
    pub fn reason(&self) -> String {
        match self {
            FrontmatterError::Parse(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Extracts YAML frontmatter from page content.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction, FrontmatterError> {
    let Some(block) = locate_block(input)? else {
        return Ok(FrontmatterExtraction::empty());
    };

    let value = parse_yaml(&input[block.yaml_start..block.yaml_end])?;
    Ok(FrontmatterExtraction {
        value,
        body_start: block.body_start,
    })
}

/// Splits page content into its typed frontmatter and Markdown body.
pub fn split_page(input: &str) -> Result<(PageFrontmatter, &str), FrontmatterError> {
    let extraction = extract_frontmatter(input)?;
    let frontmatter = PageFrontmatter::from_value(&extraction.value);
    Ok((frontmatter, extraction.body(input)))
}

/// Byte ranges of a located frontmatter block.
struct BlockRange {
    yaml_start: usize,
    yaml_end: usize,
    body_start: usize,
}

fn locate_block(input: &str) -> Result<Option<BlockRange>, FrontmatterError> {
    let offset = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = Lines::new(input, offset);

    // Blank lines may precede the opening fence; anything else means no frontmatter.
    let yaml_start = loop {
        match lines.next() {
            Some((line, _, _)) if line.trim().is_empty() => continue,
            Some((line, _, next)) if is_fence(line) => break next,
            _ => return Ok(None),
        }
    };

    for (line, start, next) in lines {
        if is_fence(line) {
            let yaml_end = trim_newline_end(input, yaml_start, start);
            return Ok(Some(BlockRange {
                yaml_start,
                yaml_end,
                body_start: next,
            }));
        }
    }

    Err(FrontmatterError::Unterminated)
}

fn trim_newline_end(input: &str, start: usize, end: usize) -> usize {
    let trimmed = input[start..end].trim_end_matches(['\r', '\n']);
    start + trimmed.len()
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

/// Iterator over `(line, line_start, next_line_start)` triples.
struct Lines<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str, cursor: usize) -> Self {
        Self { input, cursor }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (&'a str, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.input.len() {
            return None;
        }
        let start = self.cursor;
        let rest = &self.input[start..];
        let (line, next) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], start + pos + 1),
            None => (rest, self.input.len()),
        };
        self.cursor = next;
        Some((line, start, next))
    }
}

fn parse_yaml(block: &str) -> Result<JsonValue, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json =
        serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json {
        JsonValue::Null => Ok(JsonValue::Object(Default::default())),
        JsonValue::Object(_) => Ok(json),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Menu membership flags requested by a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MenuFlags {
    /// Desired Main-menu membership.
    pub main: bool,
    /// Desired Footer-menu membership.
    pub footer: bool,
}

/// Typed view of the recognized frontmatter keys. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PageFrontmatter {
    /// Overrides the computed page title.
    pub title: Option<String>,
    /// Overrides the computed page description.
    pub description: Option<String>,
    /// Label used for menu items.
    pub name: Option<String>,
    /// Menu membership flags; absent means `{main: false, footer: false}`.
    pub menu: MenuFlags,
}

impl PageFrontmatter {
    /// Reads the recognized keys from an extracted frontmatter value.
    ///
    /// Text fields count only when they are non-empty strings. Menu flags count
    /// only when they are the boolean `true`.
    pub fn from_value(value: &JsonValue) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let flag = |key: &str| {
            value
                .get("menu")
                .and_then(|menu| menu.get(key))
                .is_some_and(|v| *v == JsonValue::Bool(true))
        };

        Self {
            title: text("title"),
            description: text("description"),
            name: text("name"),
            menu: MenuFlags {
                main: flag("main"),
                footer: flag("footer"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> FrontmatterExtraction {
        extract_frontmatter(input).expect("frontmatter extraction should succeed")
    }

    #[test]
    fn returns_empty_when_no_frontmatter() {
        let result = extract("# Title\nBody");
        assert_eq!(result.body_start, 0);
        assert_eq!(result.value, JsonValue::Object(Default::default()));
    }

    #[test]
    fn parses_page_keys() {
        let input = "---\ntitle: About\nmenu:\n  main: true\n---\n# Content";
        let result = extract(input);
        assert_eq!(result.body_start, input.find("# Content").unwrap());
        assert_eq!(result.body(input), "# Content");
        assert_eq!(
            result.value.get("title").and_then(JsonValue::as_str),
            Some("About")
        );
    }

    #[test]
    fn handles_empty_block() {
        let input = "---\n---\n# Body";
        let result = extract(input);
        assert_eq!(result.value, JsonValue::Object(Default::default()));
        assert_eq!(result.body(input), "# Body");
    }

    #[test]
    fn skips_bom_and_leading_blank_lines() {
        let input = "\u{feff}\n   \n---\nfoo: bar\n---\nBody";
        let result = extract(input);
        assert_eq!(
            result.value.get("foo").and_then(JsonValue::as_str),
            Some("bar")
        );
        assert_eq!(result.body(input), "Body");
    }

    #[test]
    fn crlf_fences_are_recognized() {
        let input = "---\r\ntitle: Win\r\n---\r\nBody";
        let result = extract(input);
        assert_eq!(
            result.value.get("title").and_then(JsonValue::as_str),
            Some("Win")
        );
        assert_eq!(result.body(input), "Body");
    }

    #[test]
    fn text_before_fence_means_no_frontmatter() {
        let input = "Intro\n---\ntitle: nope\n---\n";
        let result = extract(input);
        assert_eq!(result.body_start, 0);
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let input = "---\ninvalid: [unterminated\n---\n";
        let err = extract_frontmatter(input).unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse(_)), "{err:?}");
        assert!(!err.reason().is_empty());
    }

    #[test]
    fn errors_on_unterminated_block() {
        let err = extract_frontmatter("---\ntitle: test").unwrap_err();
        assert_eq!(err, FrontmatterError::Unterminated);
    }

    #[test]
    fn errors_on_scalar_root() {
        let err = extract_frontmatter("---\njust a string\n---\n").unwrap_err();
        assert_eq!(err, FrontmatterError::InvalidRootType);
    }

    #[test]
    fn typed_schema_reads_recognized_keys() {
        let input = "---\ntitle: About\ndescription: Who we are\nname: About Us\nmenu:\n  main: true\n  footer: false\nextra: ignored\n---\nBody";
        let (frontmatter, body) = split_page(input).unwrap();
        assert_eq!(body, "Body");
        assert_eq!(frontmatter.title.as_deref(), Some("About"));
        assert_eq!(frontmatter.description.as_deref(), Some("Who we are"));
        assert_eq!(frontmatter.name.as_deref(), Some("About Us"));
        assert_eq!(
            frontmatter.menu,
            MenuFlags {
                main: true,
                footer: false
            }
        );
    }

    #[test]
    fn menu_flags_require_boolean_true() {
        let input = "---\nmenu:\n  main: \"true\"\n  footer: 1\n---\n";
        let (frontmatter, _) = split_page(input).unwrap();
        assert_eq!(frontmatter.menu, MenuFlags::default());
    }

    #[test]
    fn missing_menu_block_means_no_membership() {
        let (frontmatter, _) = split_page("---\ntitle: x\n---\n").unwrap();
        assert_eq!(frontmatter.menu, MenuFlags::default());

        let (frontmatter, _) = split_page("---\nmenu: true\n---\n").unwrap();
        assert_eq!(frontmatter.menu, MenuFlags::default());
    }

    #[test]
    fn empty_strings_do_not_override() {
        let (frontmatter, _) = split_page("---\ntitle: \"\"\nname: 42\n---\n").unwrap();
        assert_eq!(frontmatter.title, None);
        assert_eq!(frontmatter.name, None);
    }
}
