use thiserror::Error;

/// Errors from sealing or opening a state envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No non-empty key material was available.
    #[error("no encryption key material available")]
    KeyMissing,

    /// Malformed base64, envelope shape, or recovered document.
    #[error("decode error: {0}")]
    Decode(String),

    /// The cipher rejected the data (bad tag, wrong key, truncated input).
    #[error("cipher error: {0}")]
    Cipher(String),
}

/// Result alias for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
