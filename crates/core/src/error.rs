use thiserror::Error;

use crate::frontmatter::FrontmatterError;

/// Source location information for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while preparing page content.
///
/// The directive transform itself never fails; these surface from the
/// page-level entry points that also deal with frontmatter.
#[derive(Debug, Error)]
pub enum LitemarkError {
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The page frontmatter could not be extracted.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LitemarkError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Returns the raw frontmatter reason when this error came from frontmatter parsing.
    pub fn frontmatter_reason(&self) -> Option<String> {
        match self {
            LitemarkError::Frontmatter(err) => Some(err.reason()),
            _ => None,
        }
    }
}

/// Non-fatal warnings raised while building a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Container directive opened but never closed; rendered as literal text.
    UnterminatedDirective {
        /// Location of the opening fence
        location: SourceLocation,
        /// Directive name
        name: String,
        /// Number of colons in the opening fence
        fence_length: usize,
    },
    /// Closing fence with no open container of the same length.
    StrayClosingFence {
        /// Location of the fence
        location: SourceLocation,
        /// Number of colons in the fence
        fence_length: usize,
    },
    /// Directive syntax with a name outside the recognized set.
    UnknownDirective {
        /// Location of the directive
        location: SourceLocation,
        /// Directive name
        name: String,
    },
    /// Attribute outside the allow-list for its directive; not rendered.
    DroppedAttribute {
        /// Location of the directive
        location: SourceLocation,
        /// Directive name
        directive: String,
        /// Attribute key
        attribute: String,
    },
    /// Markdown chunk the adapter refused; kept as literal text.
    SuspiciousMarkup {
        /// Location of the chunk
        location: SourceLocation,
        /// Warning message
        message: String,
    },
}

impl ParseWarning {
    /// Get the location of this warning
    pub fn location(&self) -> &SourceLocation {
        match self {
            ParseWarning::UnterminatedDirective { location, .. }
            | ParseWarning::StrayClosingFence { location, .. }
            | ParseWarning::UnknownDirective { location, .. }
            | ParseWarning::DroppedAttribute { location, .. }
            | ParseWarning::SuspiciousMarkup { location, .. } => location,
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::UnterminatedDirective {
                location,
                name,
                fence_length,
            } => write!(
                f,
                "{}: directive '{}' opened with {} colons is never closed",
                location, name, fence_length
            ),
            ParseWarning::StrayClosingFence {
                location,
                fence_length,
            } => write!(
                f,
                "{}: closing fence of {} colons has no matching directive",
                location, fence_length
            ),
            ParseWarning::UnknownDirective { location, name } => {
                write!(f, "{}: unknown directive '{}' left as text", location, name)
            }
            ParseWarning::DroppedAttribute {
                location,
                directive,
                attribute,
            } => write!(
                f,
                "{}: attribute '{}' is not allowed on '{}' and was dropped",
                location, attribute, directive
            ),
            ParseWarning::SuspiciousMarkup { location, message } => {
                write!(f, "{}: {}", location, message)
            }
        }
    }
}

/// Collection of diagnostics attached to a transformed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    /// List of non-fatal warnings
    pub warnings: Vec<ParseWarning>,
}

impl ParseDiagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the diagnostics collection
    pub fn add_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get total count of all diagnostics
    pub fn count(&self) -> usize {
        self.warnings.len()
    }
}
