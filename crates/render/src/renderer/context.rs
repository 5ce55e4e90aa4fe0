//! Rendering state for a single document.

use std::collections::HashMap;

use litemark_core::{Document, ParseDiagnostics, ParseWarning};

use super::RenderOptions;

/// Which element the renderer is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Document root.
    Root,
    /// Inside `<p>`.
    Paragraph,
    /// Inside `<ul>` / `<ol>`.
    List {
        /// Loose lists keep `<p>` around item paragraphs.
        spread: bool,
    },
    /// Inside `<table>`.
    Table,
    /// Inside `<tr>`.
    TableRow,
    /// Inside `<td>` / `<th>`.
    TableCell,
    /// Inside a rendered directive container.
    Directive,
    /// Inside `<a>`; nested links are rendered as their text.
    Link,
}

/// Footnote numbering, assigned in first-reference order.
#[derive(Debug, Default)]
struct Footnotes {
    order: Vec<String>,
    ordinals: HashMap<String, usize>,
    references: HashMap<String, usize>,
}

/// Output buffer plus the scope stack, in the shape the renderer walks.
pub struct Context<'a> {
    html: String,
    stack: Vec<Scope>,
    options: &'a RenderOptions,
    document: &'a Document,
    footnotes: Footnotes,
    diagnostics: ParseDiagnostics,
}

impl<'a> Context<'a> {
    /// Creates a context for `document`.
    pub fn new(document: &'a Document, options: &'a RenderOptions) -> Self {
        Self {
            html: String::with_capacity(4096),
            stack: vec![Scope::Root],
            options,
            document,
            footnotes: Footnotes::default(),
            diagnostics: document.diagnostics.clone(),
        }
    }

    /// The document being rendered.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Writes markup as is.
    pub fn push_raw(&mut self, s: &str) {
        self.html.push_str(s);
    }

    /// Writes text content, escaped.
    pub fn push_text(&mut self, s: &str) {
        html_escape::encode_text_to_string(s, &mut self.html);
    }

    /// Writes an attribute value, escaped for a double-quoted attribute.
    pub fn push_attr_value(&mut self, s: &str) {
        html_escape::encode_double_quoted_attribute_to_string(s, &mut self.html);
    }

    /// Writes ` name="value"`.
    pub fn push_attr(&mut self, name: &str, value: &str) {
        self.html.push(' ');
        self.html.push_str(name);
        self.html.push_str("=\"");
        self.push_attr_value(value);
        self.html.push('"');
    }

    /// Enters a scope.
    pub fn enter(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Leaves the current scope.
    pub fn exit(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// Returns true inside a tight (non-spread) list.
    ///
    /// The innermost list decides; a directive container between the list
    /// and the paragraph restores `<p>` wrapping.
    pub fn is_in_tight_list(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find(|scope| matches!(scope, Scope::List { .. } | Scope::Directive))
            .is_some_and(|scope| matches!(scope, Scope::List { spread: false }))
    }

    /// Returns true inside a link.
    pub fn is_in_link(&self) -> bool {
        self.stack.iter().any(|scope| matches!(scope, Scope::Link))
    }

    /// Whether raw HTML is emitted as is.
    pub fn raw_html_allowed(&self) -> bool {
        self.options.allow_raw_html
    }

    /// Records a warning raised while rendering.
    pub fn warn(&mut self, warning: ParseWarning) {
        self.diagnostics.add_warning(warning);
    }

    /// Swaps in an empty buffer, returning the previous contents.
    pub(crate) fn take_html(&mut self) -> String {
        std::mem::take(&mut self.html)
    }

    /// Puts `saved` back as the buffer and returns what was written since.
    pub(crate) fn restore_html(&mut self, saved: String) -> String {
        std::mem::replace(&mut self.html, saved)
    }

    /// Numbers a footnote reference.
    ///
    /// Returns the footnote's ordinal and how many times it has been
    /// referenced so far, this reference included.
    pub fn reference_footnote(&mut self, identifier: &str) -> (usize, usize) {
        let next = self.footnotes.order.len() + 1;
        let ordinal = *self
            .footnotes
            .ordinals
            .entry(identifier.to_string())
            .or_insert(next);
        if ordinal == next {
            self.footnotes.order.push(identifier.to_string());
        }
        let count = self
            .footnotes
            .references
            .entry(identifier.to_string())
            .or_insert(0);
        *count += 1;
        (ordinal, *count)
    }

    /// Identifier of the `index`th referenced footnote.
    pub(crate) fn footnote_at(&self, index: usize) -> Option<String> {
        self.footnotes.order.get(index).cloned()
    }

    /// Number of references to a footnote.
    pub(crate) fn footnote_references(&self, identifier: &str) -> usize {
        self.footnotes
            .references
            .get(identifier)
            .copied()
            .unwrap_or(0)
    }

    /// Consumes the context, returning the HTML and the diagnostics.
    pub fn finish(self) -> (String, ParseDiagnostics) {
        (self.html, self.diagnostics)
    }
}

/// Makes a footnote identifier safe for `id` attributes.
pub fn sanitize_footnote_id(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    for c in identifier.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() {
            out.push('-');
        }
    }
    if out.is_empty() {
        out.push_str("fn");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footnote_ordinals_follow_first_reference() {
        let document = Document::default();
        let options = RenderOptions::default();
        let mut ctx = Context::new(&document, &options);
        assert_eq!(ctx.reference_footnote("b"), (1, 1));
        assert_eq!(ctx.reference_footnote("a"), (2, 1));
        assert_eq!(ctx.reference_footnote("b"), (1, 2));
        assert_eq!(ctx.footnote_at(1).as_deref(), Some("a"));
        assert_eq!(ctx.footnote_references("b"), 2);
    }

    #[test]
    fn escaping_goes_through_html_escape() {
        let document = Document::default();
        let options = RenderOptions::default();
        let mut ctx = Context::new(&document, &options);
        ctx.push_text("<b> & co");
        ctx.push_attr("title", "say \"hi\"");
        let (html, _) = ctx.finish();
        assert_eq!(html, "&lt;b&gt; &amp; co title=\"say &quot;hi&quot;\"");
    }

    #[test]
    fn sanitizes_footnote_ids() {
        assert_eq!(sanitize_footnote_id("simple"), "simple");
        assert_eq!(sanitize_footnote_id("UPPER"), "upper");
        assert_eq!(sanitize_footnote_id("a\"b"), "ab");
        assert_eq!(sanitize_footnote_id("v2.1"), "v21");
        assert_eq!(sanitize_footnote_id("a b"), "a-b");
        assert_eq!(sanitize_footnote_id(""), "fn");
    }
}
