#![deny(missing_docs)]
//! HTML rendering for litemark: directive presentation and the document renderer.

/// Directive name to element and class mapping.
pub mod presentation;
/// Document to HTML rendering.
pub mod renderer;

pub use presentation::{Element, Layout, present, safe_url, sanitize_href};
pub use renderer::{
    BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats, RenderOptions,
    RenderOutput, RenderedPage, render_batch, render_body, render_document, render_markdown,
    render_page,
};
