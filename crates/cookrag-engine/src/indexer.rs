//! Offline batch indexing: vector collection setup + insert, BM25 bulk
//! build, optional knowledge-graph build.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use cookrag_core::traits::{EmbeddingProvider, VectorStore};
use cookrag_core::types::Document;
use cookrag_core::Result;
use cookrag_graph::{GraphBuilder, RecipeDoc};
use cookrag_text::Bm25Retriever;
use cookrag_vector::VectorRetriever;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub collection_name: String,
    pub vector_index: bool,
    pub bm25_index: bool,
    pub graph_index: bool,
    pub create_collection: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collection_name: "cookrag_documents".to_string(),
            vector_index: true,
            bm25_index: true,
            graph_index: false,
            create_collection: true,
        }
    }
}

pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    vector: Arc<VectorRetriever>,
    bm25: Arc<Bm25Retriever>,
    graph_builder: Option<Arc<GraphBuilder>>,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        vector: Arc<VectorRetriever>,
        bm25: Arc<Bm25Retriever>,
        graph_builder: Option<Arc<GraphBuilder>>,
    ) -> Self {
        Self { embedder, store, vector, bm25, graph_builder }
    }

    pub async fn index_documents(&self, docs: &[Document], config: &IndexConfig) -> Result<()> {
        let start = Instant::now();
        info!(count = docs.len(), "starting document indexing");

        if config.vector_index {
            self.index_vector(docs, config).await?;
        }
        if config.bm25_index {
            self.bm25.index_documents(docs)?;
        }
        if config.graph_index {
            // graph indexing is best-effort during the offline batch
            if let Err(err) = self.index_graph(docs).await {
                warn!(%err, "graph indexing failed");
            }
        }

        info!(
            count = docs.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "indexing completed"
        );
        Ok(())
    }

    async fn index_vector(&self, docs: &[Document], config: &IndexConfig) -> Result<()> {
        info!("creating vector index");

        if config.create_collection
            && !self.store.has_collection(&config.collection_name).await?
        {
            let dimension = self.embedder.dimension();
            self.store.create_collection(&config.collection_name, dimension).await?;
            self.store
                .create_index(
                    &config.collection_name,
                    "vector",
                    "IVF_FLAT",
                    &HashMap::from([("nlist".to_string(), "128".to_string())]),
                )
                .await?;
            self.store.load_collection(&config.collection_name).await?;
        }

        self.vector.index_documents(docs).await
    }

    async fn index_graph(&self, docs: &[Document]) -> Result<()> {
        let Some(builder) = &self.graph_builder else {
            return Ok(());
        };

        let recipe_docs: Vec<RecipeDoc> = docs
            .iter()
            .filter_map(|doc| {
                let dish_name = doc.metadata.get("name")?.as_str()?.to_string();
                let category = doc
                    .metadata
                    .get("category")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(RecipeDoc { content: doc.content.clone(), category, dish_name })
            })
            .collect();

        if recipe_docs.is_empty() {
            info!("no documents carry a dish name; skipping graph build");
            return Ok(());
        }

        builder.build_from_documents(&recipe_docs).await.map(|stats| {
            info!(
                dishes = stats.dishes,
                ingredients = stats.ingredients,
                relations = stats.relations,
                "graph index created"
            );
        })
    }
}
