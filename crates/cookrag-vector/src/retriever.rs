//! Dense-vector retrieval against an external ANN store, with an
//! optional best-effort result cache.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use cookrag_core::observability::{MetricsCollector, Span};
use cookrag_core::traits::{Cache, EmbeddingProvider, VectorStore};
use cookrag_core::types::{Document, Metadata, RetrievalResult, Strategy, VectorHit};
use cookrag_core::Result;

#[derive(Debug, Clone)]
pub struct VectorRetrieverConfig {
    pub collection_name: String,
    pub vector_field: String,
    pub text_field: String,
    pub metadata_field: String,
    pub top_k: usize,
    pub use_cache: bool,
    pub cache_ttl: Duration,
}

impl Default for VectorRetrieverConfig {
    fn default() -> Self {
        Self {
            collection_name: "cookrag_documents".to_string(),
            vector_field: "vector".to_string(),
            text_field: "text".to_string(),
            metadata_field: "metadata".to_string(),
            top_k: 10,
            use_cache: true,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

pub struct VectorRetriever {
    config: VectorRetrieverConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    cache: Option<Arc<dyn Cache>>,
    metrics: Arc<MetricsCollector>,
}

impl VectorRetriever {
    pub fn new(
        config: VectorRetrieverConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        cache: Option<Arc<dyn Cache>>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self { config, embedder, store, cache, metrics }
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let mut span = Span::start("vector_retrieve");
        span.add_metadata("query", query);
        span.add_metadata("top_k", self.config.top_k);

        let start = Instant::now();

        let query_embedding = {
            let mut embed_span = Span::start("embedding_api");
            match self.embedder.embed(query).await {
                Ok(v) => v,
                Err(err) => {
                    embed_span.set_error(&err);
                    span.set_error(&err);
                    return Err(err);
                }
            }
        };

        if self.config.use_cache {
            if let Some(cache) = &self.cache {
                let key = self.cache_key(query);
                if let Ok(Some(raw)) = cache.get(&key).await {
                    if let Ok(mut cached) = serde_json::from_str::<RetrievalResult>(&raw) {
                        self.metrics.record_cache_hit();
                        span.add_metadata("cache_hit", true);
                        info!(query, "vector cache hit");
                        cached.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                        return Ok(cached);
                    }
                }
                self.metrics.record_cache_miss();
                span.add_metadata("cache_hit", false);
            }
        }

        let hits = {
            let mut search_span = Span::start("vector_search");
            search_span.add_metadata("collection", &self.config.collection_name);
            search_span.add_metadata("top_k", self.config.top_k);
            match self
                .store
                .search(
                    &self.config.collection_name,
                    std::slice::from_ref(&query_embedding),
                    &self.config.vector_field,
                    &[&self.config.text_field, &self.config.metadata_field],
                    self.config.top_k,
                )
                .await
            {
                Ok(hits) => hits,
                Err(err) => {
                    search_span.set_error(&err);
                    span.set_error(&err);
                    return Err(err);
                }
            }
        };

        let documents: Vec<Document> = hits.iter().map(hit_to_document).collect();
        let result = RetrievalResult {
            documents,
            strategy: Strategy::Vector,
            query: query.to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        if self.config.use_cache {
            if let Some(cache) = &self.cache {
                let key = self.cache_key(query);
                match serde_json::to_string(&result) {
                    Ok(raw) => {
                        if let Err(err) = cache.set(&key, &raw, self.config.cache_ttl).await {
                            warn!(%err, "failed to cache vector result");
                        }
                    }
                    Err(err) => warn!(%err, "failed to serialize result for cache"),
                }
            }
        }

        span.add_metadata("result_count", result.documents.len());
        Ok(result)
    }

    /// Batch retrieval as one multi-vector search, segmented per query
    /// preserving input order.
    pub async fn retrieve_batch(&self, queries: &[String]) -> Result<Vec<RetrievalResult>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        info!(count = queries.len(), "batch vector retrieval");

        let embeddings = self.embedder.embed_batch(queries).await?;
        let hits = self
            .store
            .search(
                &self.config.collection_name,
                &embeddings,
                &self.config.vector_field,
                &[&self.config.text_field, &self.config.metadata_field],
                self.config.top_k,
            )
            .await?;

        let per_query = hits.len() / queries.len();
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let results = queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                let lo = i * per_query;
                let hi = (lo + per_query).min(hits.len());
                let documents = hits[lo..hi].iter().map(hit_to_document).collect();
                RetrievalResult {
                    documents,
                    strategy: Strategy::VectorBatch,
                    query: query.clone(),
                    latency_ms,
                }
            })
            .collect();

        Ok(results)
    }

    /// Bulk-index documents: batch-embed, assign sequential int ids from
    /// zero, insert and flush.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<()> {
        info!(count = documents.len(), "indexing documents into vector store");

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let ids: Vec<i64> = (0..documents.len() as i64).collect();
        let metadata: Vec<serde_json::Value> = documents
            .iter()
            .map(|d| serde_json::to_value(&d.metadata).unwrap_or(serde_json::Value::Null))
            .collect();

        self.store
            .insert(&self.config.collection_name, &ids, &embeddings, &texts, &metadata)
            .await?;
        self.store.flush(&self.config.collection_name).await?;

        info!(count = documents.len(), "vector indexing completed");
        Ok(())
    }

    // Version-tagged so a format change invalidates old entries.
    fn cache_key(&self, query: &str) -> String {
        format!("vector:v1:{query}")
    }
}

fn hit_to_document(hit: &VectorHit) -> Document {
    let metadata: Metadata = match &hit.metadata {
        serde_json::Value::Object(map) => map.clone().into_iter().collect(),
        _ => Metadata::new(),
    };
    Document {
        id: format!("doc_{}", hit.id),
        content: hit.text.clone(),
        metadata,
        score: hit.score,
    }
}
