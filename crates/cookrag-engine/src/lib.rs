//! cookrag-engine
//!
//! The composition layer: query analysis, the intelligent router that
//! dispatches to one of the four retrievers, and the offline indexer
//! that drives the vector, BM25 and graph builds.

pub mod analysis;
pub mod indexer;
pub mod router;

pub use analysis::analyze;
pub use indexer::{IndexConfig, Indexer};
pub use router::QueryRouter;
