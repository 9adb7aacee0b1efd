use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use stately_types::{Document, LockRecord, Metadata, StateRow};

use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

/// Per call-class time bounds for storage operations.
///
/// `connect` bounds [`StateStore::initialize`]; `query` bounds every other
/// call. A zero duration is not a valid bound and is replaced by the
/// default for that class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub connect: Duration,
    pub query: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(60),
            query: Duration::from_secs(5),
        }
    }
}

impl StoreTimeouts {
    pub fn from_secs(connect: u64, query: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect),
            query: Duration::from_secs(query),
        }
        .normalized()
    }

    /// Replace zero durations with the defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            connect: if self.connect.is_zero() { defaults.connect } else { self.connect },
            query: if self.query.is_zero() { defaults.query } else { self.query },
        }
    }
}

/// Wraps a store and bounds every call with a timeout.
///
/// Expiry yields [`StoreError::Timeout`]. There is no retry at this layer.
#[derive(Debug)]
pub struct TimedStore<S> {
    inner: S,
    timeouts: StoreTimeouts,
}

impl<S: StateStore> TimedStore<S> {
    pub fn new(inner: S, timeouts: StoreTimeouts) -> Self {
        Self {
            inner,
            timeouts: timeouts.normalized(),
        }
    }

    pub fn timeouts(&self) -> StoreTimeouts {
        self.timeouts
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T, F>(operation: &'static str, limit: Duration, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: limit,
            }),
        }
    }
}

#[async_trait]
impl<S: StateStore> StateStore for TimedStore<S> {
    async fn initialize(&self) -> StoreResult<()> {
        Self::bounded("initialize", self.timeouts.connect, self.inner.initialize()).await
    }

    async fn get_state(&self, reference: &str) -> StoreResult<StateRow> {
        Self::bounded("get_state", self.timeouts.query, self.inner.get_state(reference)).await
    }

    async fn put_state(
        &self,
        reference: &str,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> StoreResult<()> {
        Self::bounded(
            "put_state",
            self.timeouts.query,
            self.inner.put_state(reference, state, metadata, encrypted),
        )
        .await
    }

    async fn delete_state(&self, reference: &str) -> StoreResult<()> {
        Self::bounded("delete_state", self.timeouts.query, self.inner.delete_state(reference)).await
    }

    async fn get_lock(&self, reference: &str) -> StoreResult<LockRecord> {
        Self::bounded("get_lock", self.timeouts.query, self.inner.get_lock(reference)).await
    }

    async fn put_lock(&self, reference: &str, lock: LockRecord) -> StoreResult<()> {
        Self::bounded("put_lock", self.timeouts.query, self.inner.put_lock(reference, lock)).await
    }

    async fn delete_lock(&self, reference: &str) -> StoreResult<()> {
        Self::bounded("delete_lock", self.timeouts.query, self.inner.delete_lock(reference)).await
    }
}
