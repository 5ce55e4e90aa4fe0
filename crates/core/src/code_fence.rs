//! Fenced code tracking for the directive scanner.
//!
//! Directive fences inside ```` ``` ```` or `~~~` code blocks are content, not
//! syntax. The tracker follows CommonMark's fence rules closely enough to make
//! that call one line at a time.

/// Currently open code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFence {
    marker: char,
    length: usize,
}

/// Line-by-line code fence state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeFenceTracker {
    open: Option<OpenFence>,
}

impl CodeFenceTracker {
    /// Creates a tracker positioned outside any fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while inside an open fence.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Forgets an open fence, as when its enclosing container ends.
    pub fn reset(&mut self) {
        self.open = None;
    }

    /// Feeds one line and reports whether it belongs to fenced code.
    ///
    /// Opening and closing fence lines count as code.
    pub fn observe(&mut self, line: &str) -> bool {
        let (columns, bytes) = leading_indent(line);
        let after_indent = &line[bytes..];

        match self.open {
            None => {
                // 4+ columns of indentation is an indented code block, not a fence.
                if columns > 3 {
                    return false;
                }
                match fence_run(after_indent) {
                    Some((marker, length)) if valid_info(marker, &after_indent[length..]) => {
                        self.open = Some(OpenFence { marker, length });
                        true
                    }
                    _ => false,
                }
            }
            Some(open) => {
                if columns <= 3
                    && let Some((marker, length)) = fence_run(after_indent)
                    && marker == open.marker
                    && length >= open.length
                    && after_indent[length..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
        }
    }
}

/// Returns (visual columns, byte length) of leading whitespace; tabs stop every 4 columns.
pub(crate) fn leading_indent(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - (columns % 4),
            _ => break,
        }
        bytes += 1;
    }
    (columns, bytes)
}

fn fence_run(text: &str) -> Option<(char, usize)> {
    let marker = text.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let length = text.chars().take_while(|c| *c == marker).count();
    (length >= 3).then_some((marker, length))
}

/// Backtick fences may not carry backticks in their info string.
fn valid_info(marker: char, info: &str) -> bool {
    marker != '`' || !info.contains('`')
}
