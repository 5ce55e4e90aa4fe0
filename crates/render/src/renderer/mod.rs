//! Document to HTML renderer.
//!
//! # Module Structure
//!
//! - `context` - Output buffer and scope stack for one document
//! - `render` - Block, directive, and mdast node rendering
//! - `batch` - Parallel page rendering

mod batch;
mod context;
pub mod render;

pub use batch::{BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats, render_batch};
pub use context::{Context, Scope, sanitize_footnote_id};

use litemark_core::{
    Document, LitemarkError, PageFrontmatter, ParseDiagnostics, ParseOptions, split_page,
    transform_with_options,
};
use render::{render_blocks, render_footnotes};

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderOptions {
    /// Whether raw HTML passes through. When disabled it is escaped.
    #[serde(default = "default_allow_raw_html")]
    pub allow_raw_html: bool,
    /// Class for a `<div>` wrapped around the whole page, if any.
    #[serde(default)]
    pub wrapper_class: Option<String>,
}

fn default_allow_raw_html() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: default_allow_raw_html(),
            wrapper_class: None,
        }
    }
}

impl RenderOptions {
    /// Reads options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Rendered HTML for one document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RenderOutput {
    /// HTML fragment.
    pub html: String,
    /// Number of directives rendered, nested and inline ones included.
    pub directive_count: usize,
    /// Transform and render warnings.
    #[serde(skip)]
    pub diagnostics: ParseDiagnostics,
}

impl RenderOutput {
    /// Human-readable warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// A rendered page with its typed frontmatter.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RenderedPage {
    /// Recognized frontmatter keys.
    pub frontmatter: PageFrontmatter,
    /// Rendered body.
    pub output: RenderOutput,
}

/// Renders a transformed document.
pub fn render_document(document: &Document, options: &RenderOptions) -> RenderOutput {
    let mut ctx = Context::new(document, options);
    if let Some(class) = &options.wrapper_class {
        ctx.push_raw("<div");
        ctx.push_attr("class", class);
        ctx.push_raw(">");
    }

    render_blocks(&document.blocks, &mut ctx);
    render_footnotes(&mut ctx);

    if options.wrapper_class.is_some() {
        ctx.push_raw("</div>");
    }

    let (html, diagnostics) = ctx.finish();
    RenderOutput {
        html,
        directive_count: document.directive_count(),
        diagnostics,
    }
}

/// Renders Markdown with directive recognition off.
///
/// This is the plain Markdown + GFM pipeline; directive syntax renders as
/// the text it is.
pub fn render_markdown(input: &str, options: &RenderOptions) -> RenderOutput {
    let document = transform_with_options(input, &ParseOptions::plain());
    render_document(&document, options)
}

/// Renders Markdown body text with directives.
pub fn render_body(input: &str, options: &RenderOptions) -> RenderOutput {
    let document = transform_with_options(input, &ParseOptions::page());
    render_document(&document, options)
}

/// Strips frontmatter, transforms, and renders page content.
///
/// Fails only when the frontmatter cannot be read.
pub fn render_page(content: &str, options: &RenderOptions) -> Result<RenderedPage, LitemarkError> {
    let (frontmatter, body) = split_page(content)?;
    let output = render_body(body, options);
    if output.diagnostics.has_warnings() {
        log::debug!(
            "rendered page with {} warning(s)",
            output.diagnostics.count()
        );
    }
    Ok(RenderedPage {
        frontmatter,
        output,
    })
}
