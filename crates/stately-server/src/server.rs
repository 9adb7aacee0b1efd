use std::sync::Arc;

use tokio::net::TcpListener;

use crate::backend::Backend;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Remote-state HTTP server.
pub struct StatelyServer {
    config: ServerConfig,
    backend: Arc<Backend>,
}

impl StatelyServer {
    pub fn new(config: ServerConfig, backend: Backend) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
        }
    }

    /// Validate `config` and build the store and backend it describes.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let backend = Backend::with_options(config.storage.build(), config.backend_options());
        Ok(Self::new(config, backend))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(
            self.backend.clone(),
            &self.config.base_path,
            self.config.max_body_size,
        )
    }

    /// Initialize storage and bind the listener. Nothing is served yet, so
    /// a failure here means the server never came up.
    pub async fn bind(&self) -> ServerResult<TcpListener> {
        self.backend.init().await?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            "stately listening on {} (state endpoint {})",
            listener.local_addr()?,
            self.config.base_path
        );
        Ok(listener)
    }

    /// Serve on an already bound listener until Ctrl-C.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    /// Initialize storage, bind, then serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = self.bind().await?;
        self.serve_on(listener).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageEngine;

    fn memory_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.storage.engine = StorageEngine::Memory;
        config
    }

    #[test]
    fn server_construction() {
        let server = StatelyServer::from_config(memory_config()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = memory_config();
        config.base_path = "no-slash".into();
        assert!(matches!(
            StatelyServer::from_config(config),
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let mut config = memory_config();
        config.bind_addr = "127.0.0.1:0".parse().unwrap();
        let server = StatelyServer::from_config(config).unwrap();
        let listener = server.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_fails_when_address_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = memory_config();
        config.bind_addr = taken.local_addr().unwrap();
        let server = StatelyServer::from_config(config).unwrap();
        assert!(matches!(server.bind().await, Err(ServerError::Io(_))));
    }

    #[tokio::test]
    async fn bind_fails_when_storage_cannot_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let mut config = ServerConfig::default();
        config.bind_addr = "127.0.0.1:0".parse().unwrap();
        config.storage.root = blocker;
        let server = StatelyServer::from_config(config).unwrap();
        assert!(matches!(server.bind().await, Err(ServerError::Store(_))));
    }

    #[tokio::test]
    async fn router_builds() {
        let server = StatelyServer::from_config(memory_config()).unwrap();
        let _router = server.router();
        server.backend().init().await.unwrap();
    }
}
