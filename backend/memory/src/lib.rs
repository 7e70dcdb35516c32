//! Shared memory for multi-agent applications.
//!
//! - [`HybridMemory`]: cache-through key-value memory over two adapters
//! - [`ScopedHybridMemory`]: agent/group/context scoping on top of it
//! - adapters: [`InMemoryStore`], [`SqliteStore`], [`EmbeddingVectorStore`]
//! - [`create_store`]: builds an adapter from a `BackendConfig`

pub mod backend;
pub mod embeddings;
pub mod hybrid;
pub mod scope_index;
pub mod scoped;
pub mod sqlite_store;
pub mod store;
pub mod types;
pub mod vector_store;

pub use backend::create_store;
pub use embeddings::EmbeddingProvider;
pub use hybrid::HybridMemory;
pub use scope_index::ScopeIndex;
pub use scoped::ScopedHybridMemory;
pub use sqlite_store::SqliteStore;
pub use store::InMemoryStore;
pub use types::{scope_metadata, Entry, ScopeQuery, AGENT_ID_KEY, GROUP_ID_KEY};
pub use vector_store::{cosine_similarity, EmbeddingVectorStore};
