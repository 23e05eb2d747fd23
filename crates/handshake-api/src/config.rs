//! Environment-driven configuration.

use handshake_graph::JsonFileSnapshotStore;
use handshake_types::{SnapshotError, SnapshotStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub snapshot_path: PathBuf,
    pub backend: SnapshotBackend,
    /// Seeds the scheduler RNG; unset means entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HANDSHAKE_LISTEN {0:?}")]
    Listen(String),
    #[error("unknown HANDSHAKE_SNAPSHOT_BACKEND {0:?} (expected json or sqlite)")]
    Backend(String),
    #[error("invalid HANDSHAKE_SEED {0:?}")]
    Seed(String),
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let listen_raw = lookup("HANDSHAKE_LISTEN").unwrap_or_else(|| "0.0.0.0:8002".to_string());
        let listen = listen_raw
            .parse()
            .map_err(|_| ConfigError::Listen(listen_raw.clone()))?;
        let snapshot_path = lookup("HANDSHAKE_SNAPSHOT")
            .unwrap_or_else(|| "handshake.json".to_string())
            .into();
        let backend = match lookup("HANDSHAKE_SNAPSHOT_BACKEND").as_deref() {
            None | Some("json") => SnapshotBackend::Json,
            Some("sqlite") => SnapshotBackend::Sqlite,
            Some(other) => return Err(ConfigError::Backend(other.to_string())),
        };
        let seed = match lookup("HANDSHAKE_SEED") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Seed(raw.clone()))?),
            None => None,
        };
        Ok(Self {
            listen,
            snapshot_path,
            backend,
            seed,
        })
    }

    pub fn open_snapshot_store(&self) -> Result<Arc<dyn SnapshotStore>, SnapshotError> {
        match self.backend {
            SnapshotBackend::Json => Ok(Arc::new(JsonFileSnapshotStore::new(&self.snapshot_path))),
            #[cfg(feature = "sqlite")]
            SnapshotBackend::Sqlite => Ok(Arc::new(handshake_graph::SqliteSnapshotStore::new(
                &self.snapshot_path,
            )?)),
            #[cfg(not(feature = "sqlite"))]
            SnapshotBackend::Sqlite => Err(SnapshotError::Backend(
                "sqlite support not compiled in".to_string(),
            )),
        }
    }
}
