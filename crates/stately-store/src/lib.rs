//! State and lock storage for the Stately remote-state backend.
//!
//! The protocol layer talks to storage only through the [`StateStore`]
//! trait. A store keeps two independent collections, one row per reference
//! in each:
//!
//! - **states**: `{ref, encrypted, state, metadata}`
//! - **locks**: `{ref, lock}`
//!
//! # Storage Backends
//!
//! - [`InMemoryStateStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileStateStore`] -- one JSON file per row, atomic replace on write
//!
//! [`TimedStore`] wraps any backend and bounds every call with a timeout.
//!
//! # Design Rules
//!
//! 1. The store never interprets document content, encrypted or not.
//! 2. Puts are whole-row upserts keyed by reference.
//! 3. A missing row is [`StoreError::NotFound`]; everything else is a fault.
//! 4. Timeouts surface as [`StoreError::Timeout`], never as `NotFound`.

pub mod error;
pub mod file;
pub mod memory;
pub mod timed;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileStateStore, DEFAULT_LOCK_COLLECTION, DEFAULT_STATE_COLLECTION};
pub use memory::InMemoryStateStore;
pub use timed::{StoreTimeouts, TimedStore};
pub use traits::StateStore;
