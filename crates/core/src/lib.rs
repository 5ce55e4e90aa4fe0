#![deny(missing_docs)]
//! litemark core: frontmatter extraction and the directive Markdown transform.

/// Code fence detection utilities.
pub mod code_fence;
/// Directive grammar: containers, leaves, inline directives, attributes.
pub mod directives;
/// The Markdown-to-document transform.
pub mod document;
/// Core error and diagnostic types.
pub mod error;
/// YAML frontmatter extraction helpers.
pub mod frontmatter;
/// markdown-rs adapter and parse options.
pub mod parse;

pub use code_fence::CodeFenceTracker;
pub use directives::{
    Attributes, Directive, DirectiveKind, DirectiveName, plain_text,
    inline::{INLINE_DIRECTIVE_REF, INLINE_DIRECTIVE_TAG, reference_index},
};
pub use document::{Block, Document, transform, transform_with_options};
pub use error::{LitemarkError, ParseDiagnostics, ParseWarning, SourceLocation};
pub use frontmatter::{
    FrontmatterError, FrontmatterExtraction, MenuFlags, PageFrontmatter, extract_frontmatter,
    split_page,
};
pub use parse::{ParseOptions, parse_mdast, parse_mdast_with_options};
