use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arbitrary per-document / per-node key-value payload.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A retrievable unit of corpus text. Immutable once indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub score: f32,
}

/// Which retriever produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Bm25,
    Vector,
    Graph,
    GraphNeighbor,
    Hybrid,
    VectorBatch,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Bm25 => "bm25",
            Strategy::Vector => "vector",
            Strategy::Graph => "graph",
            Strategy::GraphNeighbor => "graph_neighbor",
            Strategy::Hybrid => "hybrid",
            Strategy::VectorBatch => "vector_batch",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform response of every retrieval path. Documents are ordered by
/// descending score with stable tie-breaking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<Document>,
    pub strategy: Strategy,
    pub query: String,
    pub latency_ms: f64,
}

impl RetrievalResult {
    pub fn empty(strategy: Strategy, query: impl Into<String>) -> Self {
        Self { documents: Vec::new(), strategy, query: query.into(), latency_ms: 0.0 }
    }
}

/// Scalar features the router derives from a query's text shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub query: String,
    pub complexity: f64,
    pub relationship_intensity: f64,
    pub confidence: f64,
    pub recommended_strategy: Strategy,
}

/// One ANN search hit as reported by a vector store. Hits for a
/// multi-vector search come back flat in query-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: i64,
    pub score: f32,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A node as materialized in the graph store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub node_id: String,
    pub name: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Metadata,
}

/// A typed edge between two stored nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelation {
    pub start_node_id: String,
    pub end_node_id: String,
    pub relation_type: String,
    #[serde(default)]
    pub properties: Metadata,
}

/// Node+edge fragment returned by a traversal. May contain duplicate
/// nodes; consumers deduplicate by `node_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<GraphNode>,
    pub relations: Vec<GraphRelation>,
}
