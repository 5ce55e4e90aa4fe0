//! Parallel rendering of many pages.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::{RenderOptions, RenderedPage, render_page};

/// A single page to render.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BatchInput {
    /// Page identifier (typically the slug).
    pub id: String,
    /// Page content, frontmatter included.
    pub source: String,
}

/// Result for a single page in a batch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Rendered page (present on success).
    pub page: Option<RenderedPage>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Statistics for batch processing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchStats {
    /// Total number of pages processed.
    pub total: u32,
    /// Number of pages rendered.
    pub succeeded: u32,
    /// Number of pages that failed.
    pub failed: u32,
    /// Total processing time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch processing.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to the global rayon pool.
    pub max_threads: Option<usize>,
    /// Whether to continue after a failure. Defaults to true.
    pub continue_on_error: Option<bool>,
    /// Render options used for every page.
    pub render: RenderOptions,
}

/// All results plus statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchProcessingResult {
    /// Results in input order.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

/// Renders pages in parallel.
///
/// With `continue_on_error` set to false, pages are rendered in order and
/// processing stops after the first failure.
pub fn render_batch(inputs: Vec<BatchInput>, options: &BatchOptions) -> BatchProcessingResult {
    let start = Instant::now();
    let continue_on_error = options.continue_on_error.unwrap_or(true);

    // Configure thread pool if max_threads is specified
    let pool = options.max_threads.and_then(|max_threads| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .build()
            .ok()
    });

    let total = inputs.len() as u32;
    let succeeded = AtomicU32::new(0);
    let failed = AtomicU32::new(0);

    let process_input = |input: BatchInput| -> BatchResult {
        match render_page(&input.source, &options.render) {
            Ok(page) => {
                succeeded.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    page: Some(page),
                    error: None,
                }
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("page '{}' failed to render: {}", input.id, err);
                BatchResult {
                    id: input.id,
                    page: None,
                    error: Some(err.to_string()),
                }
            }
        }
    };

    let results: Vec<BatchResult> = if continue_on_error {
        match pool {
            Some(pool) => pool.install(|| inputs.into_par_iter().map(process_input).collect()),
            None => inputs.into_par_iter().map(process_input).collect(),
        }
    } else {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = process_input(input);
            let stop = result.error.is_some();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    };

    BatchProcessingResult {
        results,
        stats: BatchStats {
            total,
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, source: &str) -> BatchInput {
        BatchInput {
            id: id.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn renders_every_page_in_input_order() {
        let inputs = (0..20)
            .map(|i| input(&format!("page-{i}"), &format!(":::card\nPage {i}\n:::\n")))
            .collect();
        let result = render_batch(
            inputs,
            &BatchOptions {
                max_threads: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(result.stats.total, 20);
        assert_eq!(result.stats.succeeded, 20);
        assert_eq!(result.results[7].id, "page-7");
        let page = result.results[7].page.as_ref().unwrap();
        assert!(page.output.html.contains("Page 7"));
    }

    #[test]
    fn failures_are_reported_per_page() {
        let inputs = vec![
            input("ok", "Fine"),
            input("bad", "---\ntitle: [\n---\n"),
            input("after", "Also fine"),
        ];
        let result = render_batch(inputs, &BatchOptions::default());
        assert_eq!(result.stats.failed, 1);
        assert!(result.results[1].error.is_some());
        assert!(result.results[2].page.is_some());
    }

    #[test]
    fn stops_at_first_failure_when_asked() {
        let inputs = vec![
            input("bad", "---\nnot closed\n"),
            input("never", "Skipped"),
        ];
        let result = render_batch(
            inputs,
            &BatchOptions {
                continue_on_error: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.stats.failed, 1);
    }
}
