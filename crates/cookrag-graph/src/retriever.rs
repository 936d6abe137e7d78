//! Graph-RAG retrieval: entity extraction from the query, multi-hop
//! subgraph expansion, and documentization with degree-based scoring.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use cookrag_core::observability::Span;
use cookrag_core::traits::GraphStore;
use cookrag_core::types::{Document, GraphNode, RetrievalResult, Strategy, Subgraph};
use cookrag_core::Result;
use cookrag_text::segment;

// Function words that never name an ingredient or dish.
static QUERY_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["的", "了", "是", "在", "我", "能", "做", "哪些", "有", "和", "怎么", "什么", "可以"]
        .into_iter()
        .collect()
});

const MULTI_HOP_ROW_LIMIT: usize = 100;
const ENTITY_MATCH_LIMIT: usize = 20;
const NEIGHBOR_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct GraphRetrieverConfig {
    pub max_depth: usize,
    pub use_community: bool,
    pub top_k: usize,
}

impl Default for GraphRetrieverConfig {
    fn default() -> Self {
        Self { max_depth: 2, use_community: true, top_k: 10 }
    }
}

pub struct GraphRetriever {
    config: GraphRetrieverConfig,
    store: Arc<dyn GraphStore>,
}

impl GraphRetriever {
    pub fn new(config: GraphRetrieverConfig, store: Arc<dyn GraphStore>) -> Self {
        Self { config, store }
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let mut span = Span::start("graph_retrieve");
        span.add_metadata("query", query);
        span.add_metadata("max_depth", self.config.max_depth);

        let start = Instant::now();

        let candidates = query_candidates(query);
        let entities = match self.store.match_entities(&candidates, ENTITY_MATCH_LIMIT).await {
            Ok(entities) => entities,
            Err(err) => {
                span.set_error(&err);
                return Err(err);
            }
        };

        if entities.is_empty() {
            info!(query, "no graph entities matched the query");
            return Ok(RetrievalResult {
                documents: Vec::new(),
                strategy: Strategy::Graph,
                query: query.to_string(),
                latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            });
        }
        span.add_metadata("entity_count", entities.len());

        let subgraph = match self
            .store
            .multi_hop(&entities, self.config.max_depth, MULTI_HOP_ROW_LIMIT)
            .await
        {
            Ok(subgraph) => subgraph,
            Err(err) => {
                span.set_error(&err);
                return Err(err);
            }
        };
        info!(
            nodes = subgraph.nodes.len(),
            relations = subgraph.relations.len(),
            "subgraph retrieved"
        );

        let mut documents = self.documents_from_subgraph(&subgraph);
        documents.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        documents.truncate(self.config.top_k);

        span.add_metadata("result_count", documents.len());
        Ok(RetrievalResult {
            documents,
            strategy: Strategy::Graph,
            query: query.to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Secondary operation: up to 50 neighbors of a stored node.
    pub async fn expand(&self, node_id: &str, depth: usize) -> Result<RetrievalResult> {
        let start = Instant::now();
        info!(node_id, depth, "neighbor expansion");

        let neighbors = self.store.neighbors(node_id, depth, NEIGHBOR_LIMIT).await?;
        let documents = neighbors
            .iter()
            .map(|neighbor| {
                let mut doc = node_document(neighbor, 0.9);
                doc.metadata.insert("type".into(), "neighbor".into());
                doc
            })
            .collect();

        Ok(RetrievalResult {
            documents,
            strategy: Strategy::GraphNeighbor,
            query: node_id.to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// One document per distinct node (scored by degree within the
    /// retrieved subgraph) and one per relation (fixed 0.8).
    fn documents_from_subgraph(&self, subgraph: &Subgraph) -> Vec<Document> {
        let mut distinct: Vec<&GraphNode> = Vec::new();
        let mut seen = HashSet::new();
        for node in &subgraph.nodes {
            if seen.insert(node.node_id.as_str()) {
                distinct.push(node);
            }
        }

        let mut degrees: HashMap<&str, usize> =
            distinct.iter().map(|n| (n.node_id.as_str(), 0)).collect();
        for relation in &subgraph.relations {
            if let Some(d) = degrees.get_mut(relation.start_node_id.as_str()) {
                *d += 1;
            }
            if let Some(d) = degrees.get_mut(relation.end_node_id.as_str()) {
                *d += 1;
            }
        }

        let total = distinct.len().max(1) as f32;
        let mut documents = Vec::with_capacity(distinct.len() + subgraph.relations.len());

        for node in &distinct {
            let degree = degrees.get(node.node_id.as_str()).copied().unwrap_or(0);
            let mut doc = node_document(node, degree as f32 / total);
            doc.metadata.insert("type".into(), "graph_node".into());
            if self.config.use_community {
                if let Some(label) = node.labels.first() {
                    doc.metadata.insert("community".into(), label.clone().into());
                }
            }
            documents.push(doc);
        }

        for relation in &subgraph.relations {
            let mut doc = Document {
                id: format!("rel_{}_{}", relation.start_node_id, relation.end_node_id),
                content: format!(
                    "关系: {} -> {}\n类型: {}",
                    relation.start_node_id, relation.end_node_id, relation.relation_type
                ),
                score: 0.8,
                ..Default::default()
            };
            doc.metadata
                .insert("start_node_id".into(), relation.start_node_id.clone().into());
            doc.metadata.insert("end_node_id".into(), relation.end_node_id.clone().into());
            doc.metadata
                .insert("relation_type".into(), relation.relation_type.clone().into());
            doc.metadata.insert("type".into(), "graph_relation".into());
            for (key, value) in &relation.properties {
                doc.metadata.insert(key.clone(), value.clone());
            }
            documents.push(doc);
        }

        documents
    }
}

fn node_document(node: &GraphNode, score: f32) -> Document {
    let mut doc = Document {
        id: node.node_id.clone(),
        content: format!("节点: {}\n标签: {:?}", node.name, node.labels),
        score,
        ..Default::default()
    };
    doc.metadata.insert("node_id".into(), node.node_id.clone().into());
    doc.metadata.insert("name".into(), node.name.clone().into());
    doc.metadata.insert("labels".into(), node.labels.clone().into());
    for (key, value) in &node.properties {
        doc.metadata.insert(key.clone(), value.clone());
    }
    doc
}

/// Entity-name candidates from the query: search-mode segmentation,
/// stopwords out, token length in [2,4]. Falls back to the whole query
/// when nothing survives.
fn query_candidates(query: &str) -> Vec<String> {
    let candidates: Vec<String> = segment(query)
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| {
            let len = w.chars().count();
            (2..=4).contains(&len) && !QUERY_STOPWORDS.contains(w.as_str())
        })
        .collect();

    if candidates.is_empty() {
        vec![query.to_string()]
    } else {
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_drop_stopwords_and_short_tokens() {
        let candidates = query_candidates("西红柿和鸡蛋能做哪些菜？");
        assert!(candidates.iter().any(|c| c == "西红柿"));
        assert!(candidates.iter().any(|c| c == "鸡蛋"));
        assert!(!candidates.iter().any(|c| c == "哪些"));
        assert!(!candidates.iter().any(|c| c == "能"));
    }

    #[test]
    fn empty_candidate_set_falls_back_to_the_query() {
        let candidates = query_candidates("做");
        assert_eq!(candidates, vec!["做".to_string()]);
    }
}
