//! Reference lock guard.
//!
//! Every mutating operation asks the guard before touching storage. The
//! check is a read followed by a compare, not a compare-and-swap: the guard
//! decides which status the caller sees, while exclusivity between writers
//! is left to the store's upsert semantics.

use stately_store::{StateStore, StoreResult};
use stately_types::LockRecord;

/// Result of consulting the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// No lock, or the lock is held by the candidate.
    Permit,
    /// Someone else holds the lock.
    Deny(LockRecord),
}

/// Decide whether `candidate` may mutate `reference`.
///
/// An unlocked reference permits any candidate, including the empty id.
/// Errors reading the lock are returned as errors, never as a deny.
pub async fn check_lock<S>(store: &S, reference: &str, candidate: &str) -> StoreResult<GuardOutcome>
where
    S: StateStore + ?Sized,
{
    match store.get_lock(reference).await {
        Ok(lock) if lock.is_held_by(candidate) => Ok(GuardOutcome::Permit),
        Ok(lock) => Ok(GuardOutcome::Deny(lock)),
        Err(e) if e.is_not_found() => Ok(GuardOutcome::Permit),
        Err(e) => Err(e),
    }
}
