//! Agent/group/context scoping on top of `HybridMemory`.
//!
//! Scoping is organizational filtering, not access control: any caller
//! holding a `ScopedHybridMemory` can read every scope.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use chrono::Utc;
use memswarm_core::{AdapterRole, KeyValueStore, MemswarmError, Metadata, Operation};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hybrid::HybridMemory;
use crate::scope_index::ScopeIndex;
use crate::types::{Entry, ScopeQuery};

pub struct ScopedHybridMemory {
    memory: HybridMemory,
    index: RwLock<ScopeIndex>,
    sequence: AtomicU64,
}

impl ScopedHybridMemory {
    /// Wrap a hybrid memory. The scope index starts empty; call
    /// [`rebuild_index`](Self::rebuild_index) to pick up entries that are
    /// already in the durable backend.
    pub fn new(memory: HybridMemory) -> Self {
        Self {
            memory,
            index: RwLock::new(ScopeIndex::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn memory(&self) -> &HybridMemory {
        &self.memory
    }

    pub async fn indexed_len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Store `value` under a freshly generated key and index it by the
    /// `agent_id`/`group_id` in `metadata` and by `context_id`.
    ///
    /// Returns the generated key. The index is only updated once the hybrid
    /// write succeeded.
    pub async fn write_scope(
        &self,
        value: impl Into<Value>,
        metadata: Metadata,
        context_id: impl Into<String>,
    ) -> Result<String, MemswarmError> {
        let context_id = context_id.into();
        let key = format!("{context_id}:{}", Uuid::new_v4().simple());
        let entry = Entry {
            key: key.clone(),
            value: value.into(),
            metadata,
            context_id,
            created_at: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
        };
        let payload = serde_json::to_value(&entry).context("Failed to serialize memory entry")?;

        self.memory.write(&key, payload).await?;
        self.index.write().await.insert(&entry);

        debug!(key = %key, context_id = %entry.context_id, "Scoped entry written");
        Ok(key)
    }

    /// Entries matching every supplied scope dimension, in write order.
    ///
    /// Fails with `AmbiguousScopeQuery` when no dimension is supplied.
    pub async fn read_scope(&self, query: &ScopeQuery) -> Result<Vec<Entry>, MemswarmError> {
        let keys = self.index.read().await.lookup(query)?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.memory.read(&key).await? {
                Some(value) => entries.push(decode_entry(&key, value)?),
                None => warn!(key = %key, "Scope index points at a missing entry; skipping"),
            }
        }
        Ok(entries)
    }

    /// Read a single entry by key.
    pub async fn read_entry(&self, key: &str) -> Result<Entry, MemswarmError> {
        match self.memory.read(key).await? {
            Some(value) => decode_entry(key, value),
            None => Err(MemswarmError::KeyNotFound(key.to_string())),
        }
    }

    /// Delete one entry from both adapters and the index.
    pub async fn delete(&self, key: &str) -> Result<(), MemswarmError> {
        self.memory.delete(key).await?;
        self.index.write().await.remove(key);
        Ok(())
    }

    /// Delete every entry matching the query. Returns how many were removed.
    pub async fn delete_scope(&self, query: &ScopeQuery) -> Result<usize, MemswarmError> {
        let keys = self.index.read().await.lookup(query)?;
        for key in &keys {
            self.delete(key).await?;
        }
        info!(removed = keys.len(), ?query, "Scope deleted");
        Ok(keys.len())
    }

    /// Empty both adapters and the index.
    pub async fn clear(&self) -> Result<(), MemswarmError> {
        self.memory.clear().await?;
        self.index.write().await.clear();
        Ok(())
    }

    /// Repopulate the index from the durable backend's key listing.
    ///
    /// Values that do not decode as entries are skipped. Entries are
    /// re-indexed in `(created_at, sequence, key)` order, which restores
    /// write order. Requires a backend that supports key enumeration.
    ///
    /// The index write lock is held from the key listing until the new index
    /// is installed. Writes and deletes that land meanwhile wait, then apply
    /// to the rebuilt index.
    pub async fn rebuild_index(&self) -> Result<usize, MemswarmError> {
        let mut live = self.index.write().await;
        let backend = self.memory.backend();
        let keys = backend
            .keys()
            .await
            .map_err(|e| MemswarmError::adapter(AdapterRole::Backend, Operation::Keys, None, &e))?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let stored = backend
                .read(&key)
                .await
                .map_err(|e| MemswarmError::adapter(AdapterRole::Backend, Operation::Read, None, &e))?;
            let Some(value) = stored else { continue };
            match serde_json::from_value::<Entry>(value) {
                Ok(mut entry) => {
                    entry.key = key;
                    entries.push(entry);
                }
                Err(err) => debug!(key = %key, error = %err, "Skipping non-entry value during index rebuild"),
            }
        }

        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.sequence.cmp(&b.sequence))
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut index = ScopeIndex::new();
        for entry in &entries {
            index.insert(entry);
        }
        if let Some(max) = entries.iter().map(|e| e.sequence).max() {
            self.sequence.fetch_max(max + 1, Ordering::SeqCst);
        }

        let count = index.len();
        *live = index;
        info!(entries = count, "Scope index rebuilt");
        Ok(count)
    }
}

fn decode_entry(key: &str, value: Value) -> Result<Entry, MemswarmError> {
    serde_json::from_value(value).map_err(|e| MemswarmError::CorruptEntry {
        key: key.to_string(),
        message: e.to_string(),
    })
}
