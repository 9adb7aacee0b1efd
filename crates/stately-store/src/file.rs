//! Filesystem-backed state store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<state_collection>/<blake3(ref)>.json   StateRow
//! <root>/<lock_collection>/<blake3(ref)>.json    LockRow
//! ```
//!
//! File names are the hex BLAKE3 digest of the reference, so any string is a
//! valid reference and the name length is fixed. Each row also records its
//! reference, which is checked on read. Writes go to a temporary file in the
//! same directory and are renamed over the target, so a reader sees either
//! the previous row or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stately_types::{Document, LockRecord, LockRow, Metadata, StateRow};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

/// Default directory name for state rows.
pub const DEFAULT_STATE_COLLECTION: &str = "terraform_states";
/// Default directory name for lock rows.
pub const DEFAULT_LOCK_COLLECTION: &str = "terraform_locks";

/// State store keeping one JSON file per row.
#[derive(Clone, Debug)]
pub struct FileStateStore {
    root: PathBuf,
    state_dir: PathBuf,
    lock_dir: PathBuf,
}

impl FileStateStore {
    /// Store under `root` with the default collection names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_collections(root, DEFAULT_STATE_COLLECTION, DEFAULT_LOCK_COLLECTION)
    }

    /// Store under `root` with custom collection directory names.
    pub fn with_collections(
        root: impl Into<PathBuf>,
        state_collection: &str,
        lock_collection: &str,
    ) -> Self {
        let root = root.into();
        Self {
            state_dir: root.join(state_collection),
            lock_dir: root.join(lock_collection),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn state_path(&self, reference: &str) -> PathBuf {
        self.state_dir.join(row_file_name(reference))
    }

    fn lock_path(&self, reference: &str) -> PathBuf {
        self.lock_dir.join(row_file_name(reference))
    }
}

fn row_file_name(reference: &str) -> String {
    format!("{}.json", blake3::hash(reference.as_bytes()).to_hex())
}

/// Run blocking filesystem work off the async executor.
async fn blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
}

fn read_row<T: DeserializeOwned>(path: &Path, reference: &str) -> StoreResult<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(reference.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn write_row<T: Serialize>(path: &Path, row: &T) -> StoreResult<()> {
    let data = serde_json::to_vec(row).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Backend(format!("no parent directory for {}", path.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Remove a row file. Returns `false` if there was nothing to remove.
fn remove_row(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn check_owner(found: &str, reference: &str) -> StoreResult<()> {
    if found == reference {
        Ok(())
    } else {
        Err(StoreError::CorruptRow {
            reference: reference.to_string(),
            reason: format!("row belongs to {found:?}"),
        })
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn initialize(&self) -> StoreResult<()> {
        let state_dir = self.state_dir.clone();
        let lock_dir = self.lock_dir.clone();
        blocking(move || {
            fs::create_dir_all(&state_dir)?;
            fs::create_dir_all(&lock_dir)?;
            Ok(())
        })
        .await?;
        debug!(root = %self.root.display(), "file state store initialized");
        Ok(())
    }

    async fn get_state(&self, reference: &str) -> StoreResult<StateRow> {
        let path = self.state_path(reference);
        let reference = reference.to_string();
        blocking(move || {
            let row: StateRow = read_row(&path, &reference)?;
            check_owner(&row.reference, &reference)?;
            Ok(row)
        })
        .await
    }

    async fn put_state(
        &self,
        reference: &str,
        state: Document,
        metadata: Option<Metadata>,
        encrypted: bool,
    ) -> StoreResult<()> {
        let path = self.state_path(reference);
        let row = StateRow::new(reference, state, metadata, encrypted);
        blocking(move || write_row(&path, &row)).await
    }

    async fn delete_state(&self, reference: &str) -> StoreResult<()> {
        let path = self.state_path(reference);
        let reference = reference.to_string();
        blocking(move || {
            if remove_row(&path)? {
                Ok(())
            } else {
                Err(StoreError::NotFound(reference))
            }
        })
        .await
    }

    async fn get_lock(&self, reference: &str) -> StoreResult<LockRecord> {
        let path = self.lock_path(reference);
        let reference = reference.to_string();
        blocking(move || {
            let row: LockRow = read_row(&path, &reference)?;
            check_owner(&row.reference, &reference)?;
            Ok(row.lock)
        })
        .await
    }

    async fn put_lock(&self, reference: &str, lock: LockRecord) -> StoreResult<()> {
        let path = self.lock_path(reference);
        let row = LockRow::new(reference, lock);
        blocking(move || write_row(&path, &row)).await
    }

    async fn delete_lock(&self, reference: &str) -> StoreResult<()> {
        let path = self.lock_path(reference);
        blocking(move || remove_row(&path).map(|_| ())).await
    }
}
