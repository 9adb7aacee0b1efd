use std::sync::Arc;

use async_trait::async_trait;
use stately_types::{Document, LockRecord, Metadata, StateRow};

use crate::error::StoreResult;

/// Storage engine for state documents and lock records.
///
/// All implementations must satisfy these invariants:
/// - Each reference has zero-or-one state row and zero-or-one lock row,
///   independently. A lock may exist before any state is written.
/// - `put_*` replaces the whole row or creates it (upsert keyed by reference).
/// - The store never interprets document content.
/// - A missing row is reported as `StoreError::NotFound`; I/O and engine
///   errors are propagated, never silently mapped to `NotFound`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Prepare schema (collections, uniqueness on `ref`).
    ///
    /// Idempotent: safe to call repeatedly, including across restarts.
    async fn initialize(&self) -> StoreResult<()>;

    /// Read the state row for `reference`.
    async fn get_state(&self, reference: &str) -> StoreResult<StateRow>;

    /// Create or fully replace the state row for `reference`.
    async fn put_state(
        &self,
        reference: &str,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> StoreResult<()>;

    /// Remove the state row. `NotFound` if there was none.
    async fn delete_state(&self, reference: &str) -> StoreResult<()>;

    /// Read the lock held on `reference`.
    async fn get_lock(&self, reference: &str) -> StoreResult<LockRecord>;

    /// Create or replace the lock row for `reference`.
    async fn put_lock(&self, reference: &str, lock: LockRecord) -> StoreResult<()>;

    /// Remove the lock row. Removing an absent lock succeeds.
    async fn delete_lock(&self, reference: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    async fn initialize(&self) -> StoreResult<()> {
        (**self).initialize().await
    }

    async fn get_state(&self, reference: &str) -> StoreResult<StateRow> {
        (**self).get_state(reference).await
    }

    async fn put_state(
        &self,
        reference: &str,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> StoreResult<()> {
        (**self).put_state(reference, state, metadata, encrypted).await
    }

    async fn delete_state(&self, reference: &str) -> StoreResult<()> {
        (**self).delete_state(reference).await
    }

    async fn get_lock(&self, reference: &str) -> StoreResult<LockRecord> {
        (**self).get_lock(reference).await
    }

    async fn put_lock(&self, reference: &str, lock: LockRecord) -> StoreResult<()> {
        (**self).put_lock(reference, lock).await
    }

    async fn delete_lock(&self, reference: &str) -> StoreResult<()> {
        (**self).delete_lock(reference).await
    }
}
