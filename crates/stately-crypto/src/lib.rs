//! Encryption envelope for the Stately remote-state backend.
//!
//! Turns a plain state document into an `{"encrypted_data": ...}` envelope
//! and back. The transforms are pure: deciding *whether* to apply them is
//! the protocol handler's job.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod key;

pub use cipher::StateCipher;
pub use envelope::{decrypt, decrypt_document, encrypt};
pub use error::{EnvelopeError, EnvelopeResult};
pub use key::KeySource;
