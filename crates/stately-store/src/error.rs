use std::time::Duration;

/// Errors from state store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row exists for the reference.
    #[error("not found: {0}")]
    NotFound(String),

    /// The call did not complete within its configured bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row does not belong to the reference it was read for.
    #[error("corrupt row for {reference}: {reason}")]
    CorruptRow { reference: String, reason: String },

    /// Any other engine failure (connectivity, constraint violation, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
