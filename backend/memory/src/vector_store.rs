//! In-process vector collection.
//!
//! Every written value is embedded through an `EmbeddingProvider`;
//! `similarity_search` ranks stored values by cosine similarity to the
//! embedded query. Values that are JSON objects with a string `value` field
//! (scoped entries) are embedded by that field.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use memswarm_core::{KeyValueStore, VectorStore};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::embeddings::EmbeddingProvider;

struct StoredVector {
    value: Value,
    vector: Vec<f32>,
}

pub struct EmbeddingVectorStore {
    name: String,
    provider: Arc<dyn EmbeddingProvider>,
    entries: RwLock<HashMap<String, StoredVector>>,
}

impl EmbeddingVectorStore {
    pub fn new(name: impl Into<String>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

/// Calculate cosine similarity between two equal-length slices.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

fn embeddable_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("value") {
            Some(Value::String(s)) => s.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

#[async_trait]
impl KeyValueStore for EmbeddingVectorStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).map(|s| s.value.clone()))
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        // Embed before taking the lock; providers may be slow.
        let vector = self.provider.embed(&embeddable_text(&value)).await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), StoredVector { value, vector });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl VectorStore for EmbeddingVectorStore {
    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<Value>> {
        if top_k == 0 {
            return Ok(vec![]);
        }
        let query_vector = self.provider.embed(query).await?;

        let entries = self.entries.read().await;
        let mut scored: Vec<(&String, f32, &Value)> = entries
            .iter()
            .map(|(key, stored)| (key, cosine_similarity(&query_vector, &stored.vector), &stored.value))
            .collect();

        // Key order first so equal scores come out the same way every time.
        scored.sort_by(|a, b| a.0.cmp(b.0));
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        debug!(store = %self.name, hits = scored.len(), "Similarity search");
        Ok(scored.into_iter().map(|(_, _, value)| value.clone()).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Bag-of-letters embedding: one dimension per ASCII letter.
    pub(crate) struct LetterEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for LetterEmbeddings {
        fn dimension(&self) -> usize {
            26
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
                v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_similarity_search_ranks_closest_first() {
        let store = EmbeddingVectorStore::new("vectors", Arc::new(LetterEmbeddings));
        store.write("a", json!("aaaa")).await.unwrap();
        store.write("b", json!("bbbb")).await.unwrap();
        store.write("ab", json!({"value": "aabb", "context_id": "c"})).await.unwrap();

        let hits = store.similarity_search("aaa", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], json!("aaaa"));
        assert_eq!(hits[1]["value"], "aabb");

        assert!(store.similarity_search("aaa", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_kv_contract() {
        let store = EmbeddingVectorStore::new("vectors", Arc::new(LetterEmbeddings));
        store.write("k", json!("text")).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!("text")));
        store.delete("k").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), None);
        store.write("k2", json!("more")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }
}
