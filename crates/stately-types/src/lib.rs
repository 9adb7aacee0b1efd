//! Data model for the Stately remote-state backend.
//!
//! Every other Stately crate depends on `stately-types`. The types here are
//! the wire and at-rest shapes of the remote-state protocol; none of them
//! carry behavior beyond (de)serialization and small accessors.
//!
//! # Key Types
//!
//! - [`Document`]: the caller's opaque structured state
//! - [`EncryptedState`]: the at-rest envelope substituted for an encrypted document
//! - [`LockRecord`]: advisory lock annotation, compared by `ID` only
//! - [`StateRow`] / [`LockRow`]: the engine-agnostic persisted layout

pub mod document;
pub mod error;
pub mod lock;

pub use document::{document_from_slice, Document, EncryptedState, Metadata, StateRow};
pub use error::TypeError;
pub use lock::{LockRecord, LockRow};
