use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stately_crypto::KeySource;
use stately_store::{
    FileStateStore, InMemoryStateStore, StateStore, StoreTimeouts, TimedStore,
    DEFAULT_LOCK_COLLECTION, DEFAULT_STATE_COLLECTION,
};

use crate::error::{ServerError, ServerResult};
use crate::options::BackendOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Path the remote-state endpoint is mounted at.
    pub base_path: String,
    pub max_body_size: usize,
    /// Environment variable holding the encryption key material, read on
    /// every use. Unset means encrypted Puts and Gets fail.
    pub encryption_key_env: Option<String>,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            base_path: "/backend".into(),
            max_body_size: 64 * 1024 * 1024,
            encryption_key_env: None,
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngine {
    Memory,
    File,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub engine: StorageEngine,
    /// Root directory for the file engine.
    pub root: PathBuf,
    pub state_collection: String,
    pub lock_collection: String,
    /// Bound on store initialization, in seconds. Zero means the default.
    pub connect_timeout_secs: u64,
    /// Bound on every other store call, in seconds. Zero means the default.
    pub query_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: StorageEngine::File,
            root: PathBuf::from("stately-data"),
            state_collection: DEFAULT_STATE_COLLECTION.into(),
            lock_collection: DEFAULT_LOCK_COLLECTION.into(),
            connect_timeout_secs: 60,
            query_timeout_secs: 5,
        }
    }
}

impl StorageConfig {
    pub fn timeouts(&self) -> StoreTimeouts {
        StoreTimeouts::from_secs(self.connect_timeout_secs, self.query_timeout_secs)
    }

    /// Build the configured engine wrapped in its timeouts.
    pub fn build(&self) -> Arc<dyn StateStore> {
        let timeouts = self.timeouts();
        match self.engine {
            StorageEngine::Memory => Arc::new(TimedStore::new(InMemoryStateStore::new(), timeouts)),
            StorageEngine::File => Arc::new(TimedStore::new(
                FileStateStore::with_collections(
                    &self.root,
                    &self.state_collection,
                    &self.lock_collection,
                ),
                timeouts,
            )),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if !self.base_path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "base_path must start with '/': {:?}",
                self.base_path
            )));
        }
        if self.base_path.contains([':', '*', '{', '}']) {
            return Err(ServerError::Config(format!(
                "base_path must be a literal path without route captures: {:?}",
                self.base_path
            )));
        }
        if self.base_path.starts_with("/v1/") || self.base_path == "/v1" {
            return Err(ServerError::Config(format!(
                "base_path {:?} collides with the /v1 service endpoints",
                self.base_path
            )));
        }
        for (name, value) in [
            ("state_collection", &self.storage.state_collection),
            ("lock_collection", &self.storage.lock_collection),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(ServerError::Config(format!("invalid {name}: {value:?}")));
            }
        }
        if self.storage.state_collection == self.storage.lock_collection {
            return Err(ServerError::Config(
                "state_collection and lock_collection must differ".into(),
            ));
        }
        Ok(())
    }

    /// Hooks derived from this configuration.
    pub fn backend_options(&self) -> BackendOptions {
        let options = BackendOptions::new();
        match &self.encryption_key_env {
            Some(var) => options.with_encryption_key(KeySource::from_env(var.clone())),
            None => options,
        }
    }
}
