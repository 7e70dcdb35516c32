//! Hybrid memory: a fast volatile cache in front of a durable backend.
//!
//! Reads are cache-through (a backend hit is copied into the cache). Writes,
//! deletes and clears go to the cache first, then the backend. There is no
//! transaction across the two adapters: when one side fails after the other
//! applied the change, the returned error says so and nothing is rolled back.

use std::sync::Arc;

use anyhow::Result as AnyResult;
use memswarm_config::schema::MemoryConfig;
use memswarm_core::{AdapterRole, KeyValueStore, MemswarmError, Operation};
use serde_json::Value;
use tracing::debug;

use crate::backend::create_store;

pub struct HybridMemory {
    cache: Arc<dyn KeyValueStore>,
    backend: Arc<dyn KeyValueStore>,
}

impl HybridMemory {
    pub fn new(cache: Arc<dyn KeyValueStore>, backend: Arc<dyn KeyValueStore>) -> Self {
        Self { cache, backend }
    }

    /// Build both adapters from config.
    pub fn from_config(config: &MemoryConfig) -> AnyResult<Self> {
        let cache = create_store(&config.cache.clone().unwrap_or_default())?;
        let backend = create_store(&config.backend.clone().unwrap_or_default())?;
        debug!(cache = cache.name(), backend = backend.name(), "Hybrid memory assembled");
        Ok(Self::new(cache, backend))
    }

    pub fn cache(&self) -> &Arc<dyn KeyValueStore> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Write to the cache, then the backend. Both are attempted.
    pub async fn write(&self, key: &str, value: Value) -> Result<(), MemswarmError> {
        let cached = self.cache.write(key, value.clone()).await;
        let stored = self.backend.write(key, value).await;
        settle(Operation::Write, cached, stored)?;
        debug!(key, "Hybrid write");
        Ok(())
    }

    /// Serve from the cache; on a miss read the backend and backfill the cache.
    pub async fn read(&self, key: &str) -> Result<Option<Value>, MemswarmError> {
        let cached = self
            .cache
            .read(key)
            .await
            .map_err(|e| MemswarmError::adapter(AdapterRole::Cache, Operation::Read, None, &e))?;
        if let Some(value) = cached {
            debug!(key, "Cache hit");
            return Ok(Some(value));
        }

        let stored = self
            .backend
            .read(key)
            .await
            .map_err(|e| MemswarmError::adapter(AdapterRole::Backend, Operation::Read, None, &e))?;
        let Some(value) = stored else {
            debug!(key, "Miss in cache and backend");
            return Ok(None);
        };

        self.cache
            .write(key, value.clone())
            .await
            .map_err(|e| MemswarmError::adapter(AdapterRole::Cache, Operation::Read, None, &e))?;
        debug!(key, "Cache backfilled from backend");
        Ok(Some(value))
    }

    /// Delete from both adapters. A backend failure is reported even though
    /// the cache already dropped the key.
    pub async fn delete(&self, key: &str) -> Result<(), MemswarmError> {
        let cached = self.cache.delete(key).await;
        let stored = self.backend.delete(key).await;
        settle(Operation::Delete, cached, stored)?;
        debug!(key, "Hybrid delete");
        Ok(())
    }

    /// Empty both adapters. Irreversible; meant for tests and resets.
    pub async fn clear(&self) -> Result<(), MemswarmError> {
        let cached = self.cache.clear().await;
        let stored = self.backend.clear().await;
        settle(Operation::Clear, cached, stored)?;
        debug!("Hybrid memory cleared");
        Ok(())
    }
}

/// Fold the outcome of a two-adapter mutation into one result.
fn settle(operation: Operation, cached: AnyResult<()>, stored: AnyResult<()>) -> Result<(), MemswarmError> {
    match (cached, stored) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(e)) => Err(MemswarmError::adapter(
            AdapterRole::Backend,
            operation,
            Some(AdapterRole::Cache),
            &e,
        )),
        (Err(e), Ok(())) => Err(MemswarmError::adapter(
            AdapterRole::Cache,
            operation,
            Some(AdapterRole::Backend),
            &e,
        )),
        (Err(cache_err), Err(backend_err)) => Err(MemswarmError::BackendUnavailable {
            adapter: AdapterRole::Cache,
            operation,
            applied: None,
            message: format!("{cache_err:#}; backend also failed: {backend_err:#}"),
        }),
    }
}
