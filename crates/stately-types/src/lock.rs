use std::fmt;

use serde::{Deserialize, Serialize};

/// Advisory lock annotation for a reference.
///
/// Field names on the wire are the PascalCase names the Terraform/OpenTofu
/// http backend sends in its `LOCK`/`UNLOCK` bodies. Every field defaults to
/// the empty string when absent. Only [`LockRecord::id`] takes part in
/// conflict resolution; the rest is passed through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Operation")]
    pub operation: String,
    #[serde(rename = "Info")]
    pub info: String,
    #[serde(rename = "Who")]
    pub who: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Created")]
    pub created: String,
}

impl LockRecord {
    /// A record carrying only an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Whether `candidate` identifies the holder of this lock.
    pub fn is_held_by(&self, candidate: &str) -> bool {
        self.id == candidate
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.who.is_empty() {
            write!(f, "lock {}", self.id)
        } else {
            write!(f, "lock {} held by {}", self.id, self.who)
        }
    }
}

/// One row of the lock collection, keyed uniquely by `ref`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRow {
    #[serde(rename = "ref")]
    pub reference: String,
    pub lock: LockRecord,
}

impl LockRow {
    pub fn new(reference: impl Into<String>, lock: LockRecord) -> Self {
        Self {
            reference: reference.into(),
            lock,
        }
    }
}
