use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("value is not a JSON object")]
    NotAnObject,

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
