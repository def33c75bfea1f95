//! # Recall Vector Store
//!
//! Vector storage and similarity search for code embeddings.
//!
//! ## Features
//!
//! - **Cosine search** over a brute-force index
//! - **Metadata filters** with exact value matching
//! - **Hybrid search** re-scoring vector hits by keyword containment
//! - **Embedding services**: deterministic stub, HTTP endpoint, bounded concurrent fan-out
//! - **Snapshots** with JSON serialization
//!
//! ## Architecture
//!
//! ```text
//! text[]
//!     │
//!     ├──> EmbeddingService (stub / HTTP, via ConcurrentEmbedder)
//!     │      └─> Vec<f32>[D]
//!     │
//!     ├──> InMemoryVectorStore
//!     │      ├─> FlatIndex (cosine)
//!     │      └─> text + metadata records
//!     │
//!     └──> persist() → JSON snapshot
//! ```
//!
//! ## Example
//!
//! ```
//! use recall_vector_store::{InMemoryVectorStore, Metadata, VectorStore};
//!
//! let mut store = InMemoryVectorStore::new();
//! store.store("a", vec![1.0, 0.0], "fn parse()", Metadata::new()).unwrap();
//! store.store("b", vec![0.0, 1.0], "fn render()", Metadata::new()).unwrap();
//!
//! let results = store.hybrid_search(&[0.8, 0.2], &["parse".to_string()], 1, 0.7).unwrap();
//! assert_eq!(results[0].id.as_deref(), Some("a"));
//! ```

mod embeddings;
mod error;
mod flat_index;
mod similarity;
mod store;
mod types;

pub use embeddings::{
    default_embedding_workers, ConcurrentEmbedder, EmbeddingService, HttpEmbedding,
    StubEmbedding, MAX_EMBEDDING_WORKERS,
};
pub use error::{Result, VectorStoreError};
pub use flat_index::FlatIndex;
pub use similarity::{cosine_similarity, magnitude};
pub use store::{InMemoryVectorStore, VectorStore, FILTER_OVERFETCH, HYBRID_OVERFETCH};
pub use types::{matches_filter, EmbeddingEntry, Metadata, SearchResult};
