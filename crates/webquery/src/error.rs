// Error types for webquery

use thiserror::Error;

/// Result type alias for webquery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when querying or acting on elements
#[derive(Debug, Error)]
pub enum Error {
    /// No search criterion has been added to the query
    ///
    /// A query must carry at least one criterion (attribute, tag, text, or a
    /// raw XPath expression) before it can be resolved against the document.
    #[error("no search criteria set: add a selector before resolving the query")]
    NoCriteria,

    /// A raw XPath expression was added after another primary criterion
    ///
    /// A raw path expression must be the first and only primary criterion;
    /// any attribute, tag, or text criterion already fixed the primary
    /// selector for this query.
    #[error("an XPath expression must be the first search criterion")]
    PrimarySelectorConflict,

    /// No element matched where exactly one was expected
    ///
    /// Carries the human-readable description of the accumulated criteria.
    #[error("no element matched search criteria [{0}]")]
    NotFound(String),

    /// More than one element matched where exactly one was expected
    ///
    /// Returned by single-element accessors when no positional index was
    /// given. Use `first()`, `last()`, or `by_index()` to disambiguate.
    #[error("{count} elements matched search criteria [{criteria}] where exactly one was expected")]
    AmbiguousMatch { count: usize, criteria: String },

    /// Positional index exceeds the matched element count
    #[error("index {index} is out of range for {count} matched element(s)")]
    IndexOutOfRange { index: i64, count: usize },

    /// Attempted to act on a disabled element
    #[error("element [{0}] is disabled")]
    ElementDisabled(String),

    /// A checkbox or radio button never reached the requested state
    ///
    /// Raised after repeated click rounds when the driver keeps reporting the
    /// opposite checked state.
    #[error("element [{criteria}] did not reach checked={target} after repeated clicks")]
    CheckStateNotReached { target: bool, criteria: String },

    /// Timeout waiting for a condition
    ///
    /// Contains context about what was being waited for. Raised only when a
    /// caller explicitly promotes an unsatisfied wait via `ensure_satisfied`;
    /// `is_satisfied` and `spin_wait` report the same outcome as a boolean.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Failure reported by the underlying driver session
    #[error("driver error: {0}")]
    Driver(String),

    /// Invalid argument provided to a method
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }
}
