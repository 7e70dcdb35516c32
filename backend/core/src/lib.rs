pub mod error;
pub mod traits;
pub mod types;

pub use error::{AdapterRole, MemswarmError, Operation};
pub use traits::{KeyValueStore, RerankingAgent, VectorStore};
pub use types::{Document, Metadata, ScoredDocument};
