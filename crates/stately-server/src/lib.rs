//! HTTP server for Stately.
//!
//! Serves Terraform/OpenTofu remote state over the http backend protocol:
//! plain GET/POST/DELETE for the state document, plus the custom LOCK and
//! UNLOCK methods for advisory locking. Documents can be sealed at rest with
//! the envelope from `stately-crypto`.

pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod handler;
pub mod options;
pub mod request;
pub mod router;
pub mod server;

pub use backend::{Backend, BackendResponse};
pub use config::{ServerConfig, StorageConfig, StorageEngine};
pub use error::{ServerError, ServerResult};
pub use guard::{check_lock, GuardOutcome};
pub use options::{BackendOptions, EncryptSource, LogLevel, RefSource};
pub use request::StateRequest;
pub use server::StatelyServer;
