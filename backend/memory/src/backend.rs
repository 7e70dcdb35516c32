//! Backend registry: maps a configured `BackendConfig` variant to a store.

use std::sync::Arc;

use anyhow::{Context, Result};
use memswarm_config::schema::BackendConfig;
use memswarm_core::KeyValueStore;
use tracing::info;

use crate::sqlite_store::SqliteStore;
use crate::store::InMemoryStore;

pub fn create_store(config: &BackendConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config {
        BackendConfig::InMemory => Arc::new(InMemoryStore::new()),
        BackendConfig::Sqlite { path } => Arc::new(
            SqliteStore::open(path).with_context(|| format!("Failed to create sqlite backend at {path}"))?,
        ),
    };
    info!(kind = config.kind(), "Memory backend created");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_creates_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.db").to_string_lossy().into_owned();

        let mem = create_store(&BackendConfig::InMemory).unwrap();
        assert_eq!(mem.name(), "in-memory");

        let sqlite = create_store(&BackendConfig::Sqlite { path }).unwrap();
        assert_eq!(sqlite.name(), "sqlite");
        sqlite.write("k", json!("v")).await.unwrap();
        assert_eq!(sqlite.read("k").await.unwrap(), Some(json!("v")));
    }

    #[test]
    fn test_unopenable_sqlite_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/dir/m.db").to_string_lossy().into_owned();
        let err = create_store(&BackendConfig::Sqlite { path }).err().unwrap();
        assert!(err.to_string().contains("Failed to create sqlite backend"));
    }
}
