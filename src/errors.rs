use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Lineage operations
///
/// This enum represents all possible error types that can occur while loading,
/// validating or executing a revision chain. Each kind describes a specific
/// category of failure, enabling precise error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use lineage::errors::{LineageError, ErrorKind, LineageResult};
///
/// fn example() -> LineageResult<()> {
///     Err(LineageError::new("history is empty", ErrorKind::EmptyHistory))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Chain integrity errors - fatal, block all execution
    /// The revision set violates chain integrity (duplicate id, multiple
    /// roots or heads, cycle, dangling parent, malformed marker)
    ValidationError,

    // Direction errors - fatal for the invocation only
    /// Upgrade target is behind the current revision, or downgrade target
    /// is ahead of it
    InvalidDirection,

    // Execution errors
    /// A revision's upgrade or downgrade operation failed; the run aborts
    /// at that step
    OperationError,

    // History errors
    /// Head was requested on an empty revision store
    EmptyHistory,

    // Environment and boundary errors
    /// Collection does not exist
    CollectionNotFound,
    /// Index does not exist
    IndexNotFound,
    /// The operation is not valid in the current context
    InvalidOperation,

    // IO and data errors
    /// Generic IO error
    IOError,
    /// Error encoding or decoding data
    EncodingError,

    // Backend errors
    /// Error from the database backend
    BackendError,

    // Generic/Internal errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidDirection => write!(f, "Invalid direction"),
            ErrorKind::OperationError => write!(f, "Operation error"),
            ErrorKind::EmptyHistory => write!(f, "Empty history"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Lineage error type.
///
/// `LineageError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging. Operation failures chain the failing revision's underlying
/// error as the cause.
///
/// # Examples
///
/// ```rust,ignore
/// use lineage::errors::{LineageError, ErrorKind};
///
/// // Create a simple error
/// let err = LineageError::new("duplicate revision id", ErrorKind::ValidationError);
///
/// // Create an error with a cause
/// let cause = LineageError::new("collection missing", ErrorKind::CollectionNotFound);
/// let err = LineageError::new_with_cause("upgrade failed", ErrorKind::OperationError, cause);
/// ```
///
/// # Type alias
///
/// The `LineageResult<T>` type alias is equivalent to `Result<T, LineageError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct LineageError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<LineageError>>,
    backtrace: Atomic<Backtrace>,
}

impl LineageError {
    /// Creates a new `LineageError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    ///
    /// # Returns
    ///
    /// A new `LineageError` instance.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        LineageError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `LineageError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    ///
    /// # Returns
    ///
    /// A new `LineageError` instance with the cause error attached.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: LineageError) -> Self {
        LineageError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&LineageError> {
        self.cause.as_deref()
    }
}

impl Display for LineageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for LineageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for LineageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Lineage operations.
///
/// `LineageResult<T>` is shorthand for `Result<T, LineageError>`.
/// All fallible Lineage operations return this type.
pub type LineageResult<T> = Result<T, LineageError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for LineageError {
    fn from(err: std::io::Error) -> Self {
        LineageError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<serde_json::Error> for LineageError {
    fn from(err: serde_json::Error) -> Self {
        LineageError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<String> for LineageError {
    fn from(msg: String) -> Self {
        LineageError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for LineageError {
    fn from(msg: &str) -> Self {
        LineageError::new(msg, ErrorKind::InternalError)
    }
}
