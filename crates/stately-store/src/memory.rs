use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use stately_types::{Document, LockRecord, Metadata, StateRow};

use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

/// In-memory, HashMap-based state store.
///
/// Intended for tests and embedding. States and locks live in two maps
/// behind `RwLock`s. Data is lost when the store is dropped.
pub struct InMemoryStateStore {
    states: RwLock<HashMap<String, StateRow>>,
    locks: RwLock<HashMap<String, LockRecord>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {e}"))
}

impl InMemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored state rows.
    pub fn state_count(&self) -> usize {
        self.states.read().map(|m| m.len()).unwrap_or_default()
    }

    /// Number of held locks.
    pub fn lock_count(&self) -> usize {
        self.locks.read().map(|m| m.len()).unwrap_or_default()
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn initialize(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_state(&self, reference: &str) -> StoreResult<StateRow> {
        let states = self.states.read().map_err(poisoned)?;
        states
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    async fn put_state(
        &self,
        reference: &str,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> StoreResult<()> {
        let row = StateRow::new(reference, state, metadata, encrypted);
        let mut states = self.states.write().map_err(poisoned)?;
        states.insert(reference.to_string(), row);
        Ok(())
    }

    async fn delete_state(&self, reference: &str) -> StoreResult<()> {
        let mut states = self.states.write().map_err(poisoned)?;
        match states.remove(reference) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(reference.to_string())),
        }
    }

    async fn get_lock(&self, reference: &str) -> StoreResult<LockRecord> {
        let locks = self.locks.read().map_err(poisoned)?;
        locks
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    async fn put_lock(&self, reference: &str, lock: LockRecord) -> StoreResult<()> {
        let mut locks = self.locks.write().map_err(poisoned)?;
        locks.insert(reference.to_string(), lock);
        Ok(())
    }

    async fn delete_lock(&self, reference: &str) -> StoreResult<()> {
        let mut locks = self.locks.write().map_err(poisoned)?;
        locks.remove(reference);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("state_count", &self.state_count())
            .field("lock_count", &self.lock_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: i64) -> Document {
        let mut d = Document::new();
        d.insert("v".into(), json!(v));
        d
    }

    #[tokio::test]
    async fn put_then_get_state() {
        let store = InMemoryStateStore::new();
        store.put_state("envA", doc(1), None, false).await.unwrap();
        let row = store.get_state("envA").await.unwrap();
        assert_eq!(row.reference, "envA");
        assert_eq!(row.state, doc(1));
        assert!(!row.encrypted);
    }

    #[tokio::test]
    async fn put_replaces_whole_row() {
        let store = InMemoryStateStore::new();
        let mut meta = Metadata::new();
        meta.insert("team".into(), json!("infra"));
        store.put_state("envA", doc(1), Some(meta), true).await.unwrap();
        store.put_state("envA", doc(2), None, false).await.unwrap();
        let row = store.get_state("envA").await.unwrap();
        assert_eq!(row.state, doc(2));
        assert!(row.metadata.is_none());
        assert!(!row.encrypted);
        assert_eq!(store.state_count(), 1);
    }

    #[tokio::test]
    async fn missing_state_is_not_found() {
        let store = InMemoryStateStore::new();
        assert!(store.get_state("nope").await.unwrap_err().is_not_found());
        assert!(store.delete_state("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_state_removes_row() {
        let store = InMemoryStateStore::new();
        store.put_state("envA", doc(1), None, false).await.unwrap();
        store.delete_state("envA").await.unwrap();
        assert!(store.get_state("envA").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn locks_are_independent_of_state() {
        let store = InMemoryStateStore::new();
        store.put_lock("envA", LockRecord::with_id("abc")).await.unwrap();
        assert_eq!(store.get_lock("envA").await.unwrap().id, "abc");
        assert!(store.get_state("envA").await.unwrap_err().is_not_found());
        store.put_lock("envA", LockRecord::with_id("def")).await.unwrap();
        assert_eq!(store.get_lock("envA").await.unwrap().id, "def");
        assert_eq!(store.lock_count(), 1);
    }

    #[tokio::test]
    async fn delete_absent_lock_succeeds() {
        let store = InMemoryStateStore::new();
        store.delete_lock("envA").await.unwrap();
        store.put_lock("envA", LockRecord::with_id("abc")).await.unwrap();
        store.delete_lock("envA").await.unwrap();
        store.delete_lock("envA").await.unwrap();
        assert!(store.get_lock("envA").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let store = InMemoryStateStore::new();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
    }
}
