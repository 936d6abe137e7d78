//! The intelligent query router: analyze, pick one of the four
//! strategies, dispatch. Errors come back as-is; there is no fallback
//! between strategies.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use cookrag_core::config::RouterConfig;
use cookrag_core::observability::MetricsCollector;
use cookrag_core::types::{QueryAnalysis, RetrievalResult, Strategy};
use cookrag_core::{Error, Result};
use cookrag_graph::GraphRetriever;
use cookrag_hybrid::HybridRetriever;
use cookrag_text::Bm25Retriever;
use cookrag_vector::VectorRetriever;

use crate::analysis;

const BM25_TOP_K: usize = 10;

pub struct QueryRouter {
    config: RouterConfig,
    vector: Arc<VectorRetriever>,
    bm25: Arc<Bm25Retriever>,
    graph: Option<Arc<GraphRetriever>>,
    hybrid: Arc<HybridRetriever>,
    metrics: Arc<MetricsCollector>,
}

impl QueryRouter {
    pub fn new(
        config: RouterConfig,
        vector: Arc<VectorRetriever>,
        bm25: Arc<Bm25Retriever>,
        graph: Option<Arc<GraphRetriever>>,
        hybrid: Arc<HybridRetriever>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self { config, vector, bm25, graph, hybrid, metrics }
    }

    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        analysis::analyze(query, &self.config, self.graph.is_some())
    }

    /// Route one query. The result always carries the original query and
    /// the total elapsed time.
    pub async fn route(&self, query: &str) -> Result<RetrievalResult> {
        let start = Instant::now();

        let analysis = self.analyze(query);
        info!(
            query,
            complexity = analysis.complexity,
            relationship_intensity = analysis.relationship_intensity,
            strategy = %analysis.recommended_strategy,
            "routing query"
        );

        let outcome = match analysis.recommended_strategy {
            Strategy::Graph => match &self.graph {
                Some(graph) => graph.retrieve(query).await,
                None => Err(Error::Internal("graph strategy without retriever".to_string())),
            },
            Strategy::Hybrid => self.hybrid.adaptive(query, analysis.complexity).await,
            Strategy::Vector => self.vector.retrieve(query).await,
            Strategy::Bm25 => self.bm25.retrieve(query, BM25_TOP_K).map(|documents| {
                RetrievalResult {
                    documents,
                    strategy: Strategy::Bm25,
                    query: query.to_string(),
                    latency_ms: 0.0,
                }
            }),
            other => Err(Error::Internal(format!("unroutable strategy {other}"))),
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.metrics.record_error();
                return Err(err);
            }
        };

        result.query = query.to_string();
        result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_query(result.strategy, result.latency_ms);

        info!(
            strategy = %result.strategy,
            results = result.documents.len(),
            latency_ms = result.latency_ms,
            "routing completed"
        );
        Ok(result)
    }

    /// Offline batch routing: failures are logged and skipped, which the
    /// online path never does.
    pub async fn route_batch(&self, queries: &[String]) -> Vec<RetrievalResult> {
        info!(count = queries.len(), "batch routing");

        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            match self.route(query).await {
                Ok(result) => results.push(result),
                Err(err) => warn!(query, %err, "query failed in batch"),
            }
        }

        info!(ok = results.len(), total = queries.len(), "batch routing completed");
        results
    }
}
