use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Document, ScoredDocument};

/// Contract every memory adapter fulfils (in-memory map, SQLite, Redis, GCS, ...).
///
/// Absence is a normal `Ok(None)`, not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Adapter identity used in logs and errors.
    fn name(&self) -> &str;

    async fn read(&self, key: &str) -> Result<Option<Value>>;

    async fn write(&self, key: &str, value: Value) -> Result<()>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Enumerate every stored key. Adapters that cannot list their keys keep
    /// the default, which fails.
    async fn keys(&self) -> Result<Vec<String>> {
        bail!("{} does not support key enumeration", self.name())
    }
}

/// A store that can also answer similarity queries. Distance metric and
/// indexing are owned by the implementation.
#[async_trait]
pub trait VectorStore: KeyValueStore {
    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<Value>>;
}

/// Anything that can score a set of documents.
///
/// An agent may return a subset of the input; documents it cannot evaluate
/// are simply left out.
#[async_trait]
pub trait RerankingAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn rerank(&self, documents: &[Document]) -> Result<Vec<ScoredDocument>>;
}
