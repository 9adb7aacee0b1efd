use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use stately_crypto::EnvelopeError;
use stately_store::StoreError;
use stately_types::LockRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed request body: {0}")]
    BadRequest(String),

    #[error("state locked: {0}")]
    Locked(Box<LockRecord>),

    #[error("state not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("encryption error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Locked(_) => StatusCode::LOCKED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_)
            | Self::Envelope(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Conflicts echo the current lock. Every other failure is status-only so
/// no state or key detail leaks to the client.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::Locked(lock) => (StatusCode::LOCKED, Json(*lock)).into_response(),
            other => other.status().into_response(),
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
