//! cookrag-graph
//!
//! The knowledge-graph side of the system: recipe entity/relation
//! extraction, offline graph materialization, the multi-hop graph
//! retriever and the two GraphStore implementations (in-memory and
//! Neo4j).

pub mod builder;
pub mod extractor;
pub mod memory;
pub mod neo4j;
pub mod retriever;

pub use builder::{BuildStats, GraphBuilder, RecipeDoc};
pub use extractor::{Entity, EntityType, ExtractedData, RecipeExtractor, Relation, RelationType};
pub use memory::MemoryGraphStore;
pub use neo4j::Neo4jGraphStore;
pub use retriever::{GraphRetriever, GraphRetrieverConfig};
