//! cookrag-vector
//!
//! Dense retrieval: the vector retriever (embed, ANN search, result
//! cache) plus the in-memory store and cache substitutes that stand in
//! for external deployments.

pub mod cache;
pub mod memory;
pub mod retriever;

pub use cache::MemoryCache;
pub use memory::MemoryVectorStore;
pub use retriever::{VectorRetriever, VectorRetrieverConfig};
