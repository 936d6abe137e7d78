//! Trait surfaces for the external collaborators the retrieval core
//! consumes. Concrete clients (HTTP embedding APIs, Neo4j, an in-memory
//! substitute) live in the leaf crates; nothing in the core depends on a
//! specific backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::types::{GraphNode, Metadata, Subgraph, VectorHit};

/// Produces dense embedding vectors of a fixed dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embedding. Implementations chunk to their upstream limit and
    /// concatenate, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

/// ANN store holding (id, vector, text, metadata) rows per collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn has_collection(&self, name: &str) -> Result<bool>;
    async fn create_collection(&self, name: &str, dim: usize) -> Result<()>;
    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        index_type: &str,
        params: &HashMap<String, String>,
    ) -> Result<()>;
    async fn load_collection(&self, name: &str) -> Result<()>;
    async fn insert(
        &self,
        name: &str,
        ids: &[i64],
        vectors: &[Vec<f32>],
        texts: &[String],
        metadata: &[serde_json::Value],
    ) -> Result<()>;
    async fn flush(&self, name: &str) -> Result<()>;

    /// Top-k search for each query vector. Hits are returned flat in
    /// query-major order, best hit first within each query's segment.
    async fn search(
        &self,
        name: &str,
        vectors: &[Vec<f32>],
        field: &str,
        output_fields: &[&str],
        top_k: usize,
    ) -> Result<Vec<VectorHit>>;

    async fn stats(&self, name: &str) -> Result<HashMap<String, String>>;
    async fn drop_collection(&self, name: &str) -> Result<()>;
}

/// Property-graph store keyed by unique node `name` per label.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Idempotently create name-property indexes for the given labels.
    async fn ensure_name_indexes(&self, labels: &[&str]) -> Result<()>;

    /// Merge-or-create a node by (label, name); returns the store's
    /// opaque node id.
    async fn merge_node(&self, label: &str, name: &str, props: &Metadata) -> Result<String>;

    /// Merge-or-create a typed edge between two stored nodes.
    async fn merge_relation(
        &self,
        from_id: &str,
        to_id: &str,
        rel_type: &str,
        props: &Metadata,
    ) -> Result<()>;

    /// Names of Ingredient/Dish nodes matching any candidate, exactly or
    /// by substring containment. Distinct, capped at `limit`.
    async fn match_entities(&self, candidates: &[String], limit: usize) -> Result<Vec<String>>;

    /// Undirected paths of length 1..=max_depth from the named entities,
    /// capped at `limit` result rows.
    async fn multi_hop(&self, entities: &[String], max_depth: usize, limit: usize)
        -> Result<Subgraph>;

    /// Distinct neighbors within `depth` hops of a node.
    async fn neighbors(&self, node_id: &str, depth: usize, limit: usize)
        -> Result<Vec<GraphNode>>;

    async fn clear(&self) -> Result<()>;
}

/// Best-effort result cache. Values are JSON strings; a miss is
/// `Ok(None)`, never an error.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Text generation backend. The stream is a finite sequence of chunks
/// terminated by channel close; dropping the receiver cancels upstream.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    async fn generate_stream(&self, prompt: &str)
        -> Result<tokio::sync::mpsc::Receiver<String>>;
}
