use std::sync::Arc;

use deed_ledger::Ledger;
use deed_store::{FileRecordStore, InMemoryRecordStore, JournalConfig, RecordStore, SyncMode};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Deed ledger HTTP server.
pub struct DeedServer {
    config: ServerConfig,
    ledger: Arc<Ledger>,
}

impl DeedServer {
    /// Open the configured store and wire the ledger over it.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = open_store(&config)?;
        let ledger = Arc::new(Ledger::new(store, config.ledger.clone()));
        Ok(Self { config, ledger })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(
            Arc::clone(&self.ledger),
            self.config.request_timeout(),
        ))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            data_path = ?self.config.data_path,
            "deed server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// The journal at `data_path`, or an in-memory store when none is configured.
pub fn open_store(config: &ServerConfig) -> ServerResult<Arc<dyn RecordStore>> {
    match &config.data_path {
        Some(path) => {
            let sync_mode = if config.fsync {
                SyncMode::EveryWrite
            } else {
                SyncMode::OsDefault
            };
            let store = FileRecordStore::open(path, JournalConfig { sync_mode })?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("no data_path configured; records are kept in memory only");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_by_default() {
        let server = DeedServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
        let _router = server.router();
    }

    #[tokio::test]
    async fn journal_store_when_path_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_path: Some(dir.path().join("ledger.journal")),
            ..ServerConfig::default()
        };
        let server = DeedServer::new(config).unwrap();
        let ledger = server.ledger();
        assert_eq!(ledger.record_count(ledger.default_deadline()).await.unwrap(), 0);
        assert!(dir.path().join("ledger.journal").exists());
    }
}
