//! Error types for document construction, mutation and path resolution.

use chumsky::span::SimpleSpan;

use crate::node::NodeKind;

/// Result type alias for document operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while building, querying or mutating a [`Document`](crate::Document).
///
/// Every failing operation leaves the document exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A child without a name was appended to an object.
    #[error("cannot append an unnamed child to an object")]
    MissingName,

    /// A child was appended to an object that already has a child with that name.
    #[error("key \"{key}\" is already present")]
    DuplicateKey { key: String },

    /// A structural operation was attempted on a node that does not support it.
    #[error("{op} is not supported on {kind} nodes")]
    UnsupportedOperation { op: &'static str, kind: NodeKind },

    /// `set` (or scalar construction) was given a value of the wrong shape.
    #[error("cannot set value: expected {expected} but found {found}")]
    InvalidValueType {
        expected: &'static str,
        found: &'static str,
    },

    /// Resolution failed at one of the path's steps.
    #[error("path \"{path}\" not found: {reason}")]
    PathNotFound {
        path: String,
        /// Byte range of the failing step within `path`.
        span: SimpleSpan,
        reason: LookupError,
    },

    /// The path string does not follow the `key[index].key` grammar.
    #[error("malformed path \"{path}\": {reason}")]
    MalformedPath {
        path: String,
        span: SimpleSpan,
        reason: String,
    },

    /// The JSON input could not be decoded.
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The value nests deeper than the configured `max_depth`.
    #[error("value nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    /// The node id does not belong to a live node of this document.
    #[error("invalid or deleted node")]
    InvalidNode,

    /// The append would make a node its own ancestor.
    #[error("cannot append a node into itself or one of its descendants")]
    Cycle,
}

/// Why a single path step could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("key \"{0}\" not found")]
    KeyNotFound(String),

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("cannot {op} on {kind} node")]
    WrongKind { op: &'static str, kind: NodeKind },
}

impl Error {
    /// Byte range in the offending path, for path errors.
    pub fn path_span(&self) -> Option<SimpleSpan> {
        match self {
            Error::PathNotFound { span, .. } | Error::MalformedPath { span, .. } => Some(*span),
            _ => None,
        }
    }
}
