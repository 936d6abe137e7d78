//! cookrag-hybrid
//!
//! Parallel fan-out to the vector and BM25 retrievers with
//! reciprocal-rank fusion of the two result lists.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use cookrag_core::types::{Document, RetrievalResult, Strategy};
use cookrag_core::Result;
use cookrag_text::{tokenize, Bm25Retriever};
use cookrag_vector::VectorRetriever;

#[derive(Debug, Clone)]
pub struct HybridRetrieverConfig {
    pub vector_weight: f64,
    pub bm25_weight: f64,
    pub top_k: usize,
    pub rrf_k: usize,
}

impl Default for HybridRetrieverConfig {
    fn default() -> Self {
        Self { vector_weight: 0.7, bm25_weight: 0.3, top_k: 10, rrf_k: 60 }
    }
}

pub struct HybridRetriever {
    config: HybridRetrieverConfig,
    vector: Arc<VectorRetriever>,
    bm25: Arc<Bm25Retriever>,
}

impl HybridRetriever {
    pub fn new(
        config: HybridRetrieverConfig,
        vector: Arc<VectorRetriever>,
        bm25: Arc<Bm25Retriever>,
    ) -> Self {
        Self { config, vector, bm25 }
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve_weighted(query, self.config.vector_weight, self.config.bm25_weight)
            .await
    }

    /// Adaptive mode: swap the fusion weights by query complexity before
    /// fusing. Simple queries lean lexical, complex ones lean dense.
    pub async fn adaptive(&self, query: &str, complexity: f64) -> Result<RetrievalResult> {
        let (vector_weight, bm25_weight) = if complexity < 0.3 {
            (0.3, 0.7)
        } else if complexity > 0.7 {
            (0.8, 0.2)
        } else {
            (self.config.vector_weight, self.config.bm25_weight)
        };

        info!(complexity, vector_weight, bm25_weight, "adaptive retrieval weights");
        self.retrieve_weighted(query, vector_weight, bm25_weight).await
    }

    async fn retrieve_weighted(
        &self,
        query: &str,
        vector_weight: f64,
        bm25_weight: f64,
    ) -> Result<RetrievalResult> {
        let start = Instant::now();
        info!(query, vector_weight, bm25_weight, "hybrid retrieval");

        // BM25 gets double depth so fusion has lexical candidates beyond
        // the final cut.
        let bm25_k = self.config.top_k * 2;
        let (vector_res, bm25_res) = tokio::join!(self.vector.retrieve(query), async {
            self.bm25.retrieve(query, bm25_k)
        });

        // both children ran to completion; the vector error is the first
        // observed when both failed
        let vector_result = vector_res?;
        let bm25_docs = bm25_res?;

        let mut fused = reciprocal_rank_fusion(
            &vector_result.documents,
            &bm25_docs,
            vector_weight,
            bm25_weight,
            self.config.rrf_k,
        );
        fused.truncate(self.config.top_k);

        let result = RetrievalResult {
            documents: fused,
            strategy: Strategy::Hybrid,
            query: query.to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        info!(results = result.documents.len(), "hybrid retrieval completed");
        Ok(result)
    }

    /// Tokenize the query and append adjacent-bigram variants when it
    /// carries more than two terms. Always includes the original query.
    pub fn expand_query(&self, query: &str) -> Vec<String> {
        let terms = tokenize(query);
        let mut queries = vec![query.to_string()];

        if terms.len() > 2 {
            for pair in terms.windows(2) {
                queries.push(format!("{} {}", pair[0], pair[1]));
            }
        }
        queries
    }

    pub fn config(&self) -> &HybridRetrieverConfig {
        &self.config
    }
}

/// Fuse two ranked lists: each document accumulates
/// `weight * k / (k + rank + 1)` per list it appears in. The first-seen
/// payload is kept; the fused score replaces the original one.
pub fn reciprocal_rank_fusion(
    vector_docs: &[Document],
    bm25_docs: &[Document],
    vector_weight: f64,
    bm25_weight: f64,
    rrf_k: usize,
) -> Vec<Document> {
    let k = rrf_k as f64;
    let mut order: Vec<String> = Vec::new();
    let mut fused: HashMap<String, (Document, f64)> = HashMap::new();

    let mut accumulate = |docs: &[Document], weight: f64| {
        for (rank, doc) in docs.iter().enumerate() {
            let contribution = weight * k / (k + rank as f64 + 1.0);
            match fused.get_mut(&doc.id) {
                Some((_, score)) => *score += contribution,
                None => {
                    order.push(doc.id.clone());
                    fused.insert(doc.id.clone(), (doc.clone(), contribution));
                }
            }
        }
    };
    accumulate(vector_docs, vector_weight);
    accumulate(bm25_docs, bm25_weight);

    // first-seen order as the stable base, then score descending
    let mut result: Vec<Document> = order
        .into_iter()
        .map(|id| {
            let (mut doc, score) = fused.remove(&id).unwrap();
            doc.score = score as f32;
            doc
        })
        .collect();
    result.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document { id: id.to_string(), ..Default::default() }
    }

    #[test]
    fn rrf_orders_by_weighted_reciprocal_rank() {
        let vector = vec![doc("A"), doc("B"), doc("C")];
        let bm25 = vec![doc("B"), doc("D"), doc("A")];

        let fused = reciprocal_rank_fusion(&vector, &bm25, 0.7, 0.3, 60);
        let ids: Vec<&str> = fused.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);

        let expected_a = 0.7 * 60.0 / 61.0 + 0.3 * 60.0 / 63.0;
        let expected_b = 0.7 * 60.0 / 62.0 + 0.3 * 60.0 / 61.0;
        assert!((fused[0].score as f64 - expected_a).abs() < 1e-6);
        assert!((fused[1].score as f64 - expected_b).abs() < 1e-6);
    }

    #[test]
    fn document_in_both_lists_scores_at_least_each_single_contribution() {
        let vector = vec![doc("A"), doc("B")];
        let bm25 = vec![doc("B"), doc("C")];

        let fused = reciprocal_rank_fusion(&vector, &bm25, 0.7, 0.3, 60);
        let b = fused.iter().find(|d| d.id == "B").unwrap();
        let from_vector = 0.7 * 60.0 / 62.0;
        let from_bm25 = 0.3 * 60.0 / 61.0;
        assert!(b.score as f64 >= from_vector);
        assert!(b.score as f64 >= from_bm25);
    }

    #[test]
    fn fusion_is_symmetric_up_to_weight_swap() {
        let list_one = vec![doc("A"), doc("B"), doc("C")];
        let list_two = vec![doc("B"), doc("D")];

        let forward = reciprocal_rank_fusion(&list_one, &list_two, 0.7, 0.3, 60);
        let swapped = reciprocal_rank_fusion(&list_two, &list_one, 0.3, 0.7, 60);

        let forward_ids: Vec<&str> = forward.iter().map(|d| d.id.as_str()).collect();
        let swapped_ids: Vec<&str> = swapped.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(forward_ids, swapped_ids);
        for (a, b) in forward.iter().zip(swapped.iter()) {
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[test]
    fn first_seen_payload_is_preserved() {
        let mut from_vector = doc("A");
        from_vector.content = "vector payload".to_string();
        let mut from_bm25 = doc("A");
        from_bm25.content = "bm25 payload".to_string();

        let fused = reciprocal_rank_fusion(&[from_vector], &[from_bm25], 0.7, 0.3, 60);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].content, "vector payload");
    }
}
