//! Name-keyed directive rewrite: which element and classes a directive becomes.

use litemark_core::{Directive, DirectiveKind, DirectiveName};

/// Classes every section carries before its layout columns.
pub const SECTION_CLASS: &str = "w-full my-4 grid gap-4";
/// Column container class.
pub const COLUMN_CLASS: &str = "w-full";
/// Card container class.
pub const CARD_CLASS: &str =
    "border rounded-xl p-6 shadow-sm bg-white dark:bg-neutral-900 dark:border-neutral-800";
/// Button link class.
pub const BUTTON_CLASS: &str = "inline-flex items-center justify-center px-4 py-2 rounded-lg bg-black text-white text-sm font-medium hover:opacity-90 transition-opacity no-underline";

/// Section column templates, selected by the `layout` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Layout {
    /// Single column; the default for absent or unrecognized layouts.
    Full,
    /// `50-50`
    Halves,
    /// `60-40`
    SixtyForty,
    /// `40-60`
    FortySixty,
    /// `33-33-33`
    Thirds,
}

impl Layout {
    /// Maps a `layout` attribute value; anything unrecognized is [`Layout::Full`].
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("50-50") => Layout::Halves,
            Some("60-40") => Layout::SixtyForty,
            Some("40-60") => Layout::FortySixty,
            Some("33-33-33") => Layout::Thirds,
            _ => Layout::Full,
        }
    }

    /// Grid template classes.
    pub fn class(self) -> &'static str {
        match self {
            Layout::Full => "grid-cols-1",
            Layout::Halves => "grid-cols-1 sm:grid-cols-2",
            Layout::SixtyForty => "grid-cols-1 sm:grid-cols-[60%_40%]",
            Layout::FortySixty => "grid-cols-1 sm:grid-cols-[40%_60%]",
            Layout::Thirds => "grid-cols-1 sm:grid-cols-3",
        }
    }
}

/// The element a directive renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// HTML tag name.
    pub tag: &'static str,
    /// Computed class, followed by any user-supplied classes.
    pub class: String,
    /// Allowed attributes in output order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Attribute keys that were not allowed and are not rendered.
    pub dropped: Vec<String>,
}

/// Computes the element for a directive.
///
/// User attributes never override the computed class: a `class` attribute is
/// appended to it, and keys outside the allow-list are dropped.
pub fn present(directive: &Directive) -> Element {
    let name = directive.name;
    let (tag, base) = match name {
        DirectiveName::Section => ("div", SECTION_CLASS),
        DirectiveName::Column => ("div", COLUMN_CLASS),
        DirectiveName::Card => ("div", CARD_CLASS),
        DirectiveName::Button => ("a", BUTTON_CLASS),
    };
    // a div inside a paragraph is invalid HTML
    let tag = if tag == "div" && directive.kind == DirectiveKind::Text {
        "span"
    } else {
        tag
    };

    let mut class = base.to_string();
    if name == DirectiveName::Section {
        class.push(' ');
        class.push_str(Layout::from_attribute(directive.attribute("layout")).class());
    }
    if let Some(extra) = directive.attribute("class").map(str::trim)
        && !extra.is_empty()
    {
        class.push(' ');
        class.push_str(extra);
    }

    let mut attributes = Vec::new();
    if name == DirectiveName::Button {
        let href = directive.attribute("href").unwrap_or("#");
        attributes.push(("href".to_string(), sanitize_href(href)));
    }

    let mut dropped = Vec::new();
    for (key, value) in &directive.attributes {
        match key.as_str() {
            "class" => {}
            "href" if name == DirectiveName::Button => {}
            "layout" if name == DirectiveName::Section => {
                attributes.push(("data-layout".to_string(), value.clone()));
            }
            key if is_allowed(name, key) => attributes.push((key.to_string(), value.clone())),
            _ => dropped.push(key.clone()),
        }
    }

    Element {
        tag,
        class,
        attributes,
        dropped,
    }
}

fn is_allowed(name: DirectiveName, key: &str) -> bool {
    let global = matches!(key, "id" | "title")
        || is_data_key(key, "data-")
        || is_data_key(key, "aria-");
    global || (name == DirectiveName::Button && matches!(key, "target" | "rel"))
}

fn is_data_key(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix).is_some_and(|rest| {
        !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    })
}

/// Replaces script-capable link targets with `#`.
pub fn sanitize_href(href: &str) -> String {
    let trimmed = href.trim();
    if is_script_url(trimmed) {
        log::debug!("unsafe button href replaced: {trimmed}");
        return "#".to_string();
    }
    if trimmed.is_empty() {
        return "#".to_string();
    }
    trimmed.to_string()
}

/// Blanks script-capable link and image urls; others pass through as written.
pub fn safe_url(url: &str) -> &str {
    if is_script_url(url) {
        log::debug!("unsafe url dropped: {}", url.trim());
        return "";
    }
    url
}

fn is_script_url(url: &str) -> bool {
    let trimmed = url.trim();
    let scheme: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take_while(|c| *c != ':')
        .collect::<String>()
        .to_ascii_lowercase();
    let has_scheme = trimmed.contains(':') && !scheme.contains(['/', '?', '#']);
    has_scheme && matches!(scheme.as_str(), "javascript" | "vbscript" | "data")
}
