use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use deed_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings, loadable from TOML.
///
/// Every key is optional:
///
/// ```toml
/// bind_addr = "0.0.0.0:8080"
/// data_path = "/var/lib/deed/ledger.journal"
/// request_timeout_ms = 5000
/// fsync = true
///
/// [ledger.retry]
/// max_attempts = 8
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Journal file. `None` keeps records in memory only.
    pub data_path: Option<PathBuf>,
    /// Deadline applied to every request's ledger work.
    pub request_timeout_ms: u64,
    /// `fsync` the journal after every append.
    pub fsync: bool,
    pub ledger: LedgerConfig,
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let mut config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.ledger.retry = config.ledger.retry.normalized();
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            data_path: None,
            request_timeout_ms: 5_000,
            fsync: false,
            ledger: LedgerConfig::default(),
        }
    }
}
