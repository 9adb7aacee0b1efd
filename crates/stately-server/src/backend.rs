//! Remote-state protocol handler.
//!
//! [`Backend`] implements the five operations of the Terraform/OpenTofu
//! http backend against a [`StateStore`]. Each operation takes a
//! [`StateRequest`] and produces a [`BackendResponse`]; it never panics and
//! never returns a transport error, so the HTTP binding is a thin dispatch.
//!
//! Ordering rules shared by every mutating operation:
//! 1. the body is parsed before the lock guard runs;
//! 2. the lock guard runs before any store mutation;
//! 3. encryption runs before the store is called, so a failed seal leaves
//!    the previous document untouched.

use std::error::Error;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;
use stately_crypto::{decrypt_document, encrypt};
use stately_store::{StateStore, StoreResult};
use stately_types::{document_from_slice, LockRecord};
use tokio::sync::OnceCell;

use crate::error::{ServerError, ServerResult};
use crate::guard::{check_lock, GuardOutcome};
use crate::options::{BackendOptions, LogLevel};
use crate::request::StateRequest;

/// Status plus optional JSON body produced by a protocol operation.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl BackendResponse {
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
        }
    }

    /// Empty success, used when a Get finds no state.
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn from_error(err: ServerError) -> Self {
        match err {
            ServerError::Locked(lock) => Self {
                status: StatusCode::LOCKED,
                body: serde_json::to_value(*lock).ok(),
            },
            other => Self {
                status: other.status(),
                body: None,
            },
        }
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// The protocol handler. Cheap to share behind an `Arc`.
pub struct Backend {
    store: Arc<dyn StateStore>,
    options: BackendOptions,
    initialized: OnceCell<()>,
}

impl Backend {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self::with_options(store, BackendOptions::default())
    }

    pub fn with_options(store: Arc<dyn StateStore>, options: BackendOptions) -> Self {
        Self {
            store,
            options,
            initialized: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Initialize the store once. Later calls are no-ops after a success;
    /// a failure is retried on the next call.
    pub async fn init(&self) -> StoreResult<()> {
        self.initialized
            .get_or_try_init(|| self.store.initialize())
            .await
            .map(|_| ())
    }

    /// Get: return the stored document, decrypting it if needed.
    pub async fn get_state(&self, request: &StateRequest) -> BackendResponse {
        let reference = self.options.resolve_ref(request);
        Self::finish(self.try_get_state(&reference).await)
    }

    /// Put: replace the document after the lock guard permits.
    pub async fn put_state(&self, request: &StateRequest) -> BackendResponse {
        let reference = self.options.resolve_ref(request);
        Self::finish(self.try_put_state(&reference, request).await)
    }

    /// Delete: remove the document after the lock guard permits.
    pub async fn delete_state(&self, request: &StateRequest) -> BackendResponse {
        let reference = self.options.resolve_ref(request);
        Self::finish(self.try_delete_state(&reference, request.lock_id()).await)
    }

    /// Lock: record the caller's lock after the lock guard permits.
    pub async fn lock_state(&self, request: &StateRequest) -> BackendResponse {
        let reference = self.options.resolve_ref(request);
        Self::finish(self.try_lock(&reference, request, LockAction::Acquire).await)
    }

    /// Unlock: drop the lock after the lock guard permits.
    pub async fn unlock_state(&self, request: &StateRequest) -> BackendResponse {
        let reference = self.options.resolve_ref(request);
        Self::finish(self.try_lock(&reference, request, LockAction::Release).await)
    }

    fn finish(result: ServerResult<BackendResponse>) -> BackendResponse {
        result.unwrap_or_else(BackendResponse::from_error)
    }

    fn debug(&self, message: &str) {
        self.options.log(LogLevel::Debug, message, None);
    }

    /// Log `err` through the logger hook and convert it for the response.
    fn report<E>(&self, level: LogLevel, message: &str, err: E) -> ServerError
    where
        E: Error + Into<ServerError> + 'static,
    {
        self.options.log(level, message, Some(&err));
        err.into()
    }

    async fn ensure_initialized(&self, reference: &str) -> ServerResult<()> {
        self.init().await.map_err(|e| {
            self.report(
                LogLevel::Error,
                &format!("failed to initialize state backend for ref: {reference}"),
                e,
            )
        })
    }

    async fn guard(&self, reference: &str, candidate: &str) -> ServerResult<()> {
        match check_lock(self.store.as_ref(), reference, candidate).await {
            Ok(GuardOutcome::Permit) => Ok(()),
            Ok(GuardOutcome::Deny(lock)) => {
                self.debug(&format!(
                    "state locked by another process for ref: {reference} ({lock})"
                ));
                Err(ServerError::Locked(Box::new(lock)))
            }
            Err(e) => Err(self.report(
                LogLevel::Error,
                &format!("failed to get lock from state store for ref: {reference}"),
                e,
            )),
        }
    }

    async fn try_get_state(&self, reference: &str) -> ServerResult<BackendResponse> {
        self.ensure_initialized(reference).await?;
        self.debug(&format!("getting state for ref: {reference}"));

        let row = match self.store.get_state(reference).await {
            Ok(row) => row,
            Err(e) if e.is_not_found() => {
                self.debug(&format!("no state stored for ref: {reference}"));
                return Ok(BackendResponse::no_content());
            }
            Err(e) => {
                return Err(self.report(
                    LogLevel::Error,
                    &format!("failed to get state for ref: {reference}"),
                    e,
                ))
            }
        };

        let state = if row.encrypted {
            decrypt_document(&row.state, &self.options.key_material()).map_err(|e| {
                self.report(
                    LogLevel::Error,
                    &format!("failed to decrypt state for ref: {reference}"),
                    e,
                )
            })?
        } else {
            row.state
        };

        Ok(BackendResponse::json(StatusCode::OK, Value::Object(state)))
    }

    async fn try_put_state(
        &self,
        reference: &str,
        request: &StateRequest,
    ) -> ServerResult<BackendResponse> {
        let encrypt_requested = self.options.resolve_encrypt(request);
        let lock_id = request.lock_id();

        self.ensure_initialized(reference).await?;
        self.debug(&format!("setting state for ref: {reference}"));

        let state = document_from_slice(&request.body).map_err(|e| {
            self.debug(&format!("error decoding request body for ref: {reference}: {e}"));
            ServerError::BadRequest(e.to_string())
        })?;

        self.guard(reference, lock_id).await?;

        let metadata = self.options.resolve_metadata(&state);
        let stored = if encrypt_requested {
            encrypt(&state, &self.options.key_material())
                .map_err(|e| {
                    self.report(
                        LogLevel::Error,
                        &format!("failed to encrypt state for ref: {reference}"),
                        e,
                    )
                })?
                .into_document()
        } else {
            state
        };

        self.store
            .put_state(reference, stored, metadata, encrypt_requested)
            .await
            .map_err(|e| {
                self.report(
                    LogLevel::Error,
                    &format!("failed to update state for ref: {reference}"),
                    e,
                )
            })?;

        Ok(BackendResponse::ok())
    }

    async fn try_delete_state(
        &self,
        reference: &str,
        lock_id: &str,
    ) -> ServerResult<BackendResponse> {
        self.ensure_initialized(reference).await?;
        self.debug(&format!("deleting state for ref: {reference}"));

        self.guard(reference, lock_id).await?;

        match self.store.delete_state(reference).await {
            Ok(()) => Ok(BackendResponse::ok()),
            Err(e) if e.is_not_found() => {
                self.debug(&format!("no state to delete for ref: {reference}"));
                Err(ServerError::NotFound(reference.to_string()))
            }
            Err(e) => Err(self.report(
                LogLevel::Error,
                &format!("failed to delete state for ref: {reference}"),
                e,
            )),
        }
    }

    async fn try_lock(
        &self,
        reference: &str,
        request: &StateRequest,
        action: LockAction,
    ) -> ServerResult<BackendResponse> {
        self.ensure_initialized(reference).await?;
        self.debug(&format!("{} state for ref: {reference}", action.verb()));

        let lock: LockRecord = serde_json::from_slice(&request.body).map_err(|e| {
            self.debug(&format!(
                "error decoding {} request body for ref: {reference}: {e}",
                action.method()
            ));
            ServerError::BadRequest(e.to_string())
        })?;

        self.guard(reference, &lock.id).await?;

        let written = match action {
            LockAction::Acquire => self.store.put_lock(reference, lock).await,
            LockAction::Release => self.store.delete_lock(reference).await,
        };
        written.map_err(|e| {
            self.report(
                LogLevel::Error,
                &format!("failed to {} lock for ref: {reference}", action.store_verb()),
                e,
            )
        })?;

        Ok(BackendResponse::ok())
    }
}

#[derive(Clone, Copy, Debug)]
enum LockAction {
    Acquire,
    Release,
}

impl LockAction {
    fn method(self) -> &'static str {
        match self {
            Self::Acquire => "LOCK",
            Self::Release => "UNLOCK",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Acquire => "locking",
            Self::Release => "unlocking",
        }
    }

    fn store_verb(self) -> &'static str {
        match self {
            Self::Acquire => "set",
            Self::Release => "delete",
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("options", &self.options)
            .field("initialized", &self.initialized.initialized())
            .finish()
    }
}
