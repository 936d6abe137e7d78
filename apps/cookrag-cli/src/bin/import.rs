//! Offline data import: load the recipe corpus, build the vector, BM25
//! and (when configured) graph indexes, then run a few verification
//! queries.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cookrag_core::config::Config;
use cookrag_core::loader::RecipeLoader;
use cookrag_core::observability::MetricsCollector;
use cookrag_core::traits::GraphStore;
use cookrag_engine::{IndexConfig, Indexer};
use cookrag_graph::{GraphBuilder, Neo4jGraphStore};
use cookrag_ml::embedding;
use cookrag_text::Bm25Retriever;
use cookrag_vector::{MemoryVectorStore, VectorRetriever, VectorRetrieverConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("CookRAG Data Importer\n=====================");

    let config_path =
        env::args().nth(1).unwrap_or_else(|| "config/config.yaml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {config_path}"))?;

    let embedder = embedding::new_provider(&config.embedding)?;
    info!(provider = %config.embedding.provider, "embedding provider initialized");

    let vector_store = Arc::new(MemoryVectorStore::new());
    let metrics = Arc::new(MetricsCollector::new());
    let vector = Arc::new(VectorRetriever::new(
        VectorRetrieverConfig {
            collection_name: config.vector.collection_name.clone(),
            top_k: config.vector.top_k,
            use_cache: false,
            ..Default::default()
        },
        embedder.clone(),
        vector_store.clone(),
        None,
        metrics,
    ));
    let bm25 = Arc::new(Bm25Retriever::default());

    let graph_builder = if config.neo4j.uri.is_empty() {
        warn!("neo4j not configured; graph indexing disabled");
        None
    } else {
        let store: Arc<dyn GraphStore> =
            Arc::new(Neo4jGraphStore::connect(&config.neo4j).await?);
        Some(Arc::new(GraphBuilder::new(store)))
    };
    let graph_enabled = graph_builder.is_some();

    let documents = RecipeLoader::new(&config.data.recipes_path).load()?;
    println!("Loaded {} documents from {}", documents.len(), config.data.recipes_path);

    let indexer = Indexer::new(
        embedder,
        vector_store.clone(),
        vector.clone(),
        bm25.clone(),
        graph_builder,
    );
    indexer
        .index_documents(
            &documents,
            &IndexConfig {
                collection_name: config.vector.collection_name.clone(),
                graph_index: graph_enabled,
                ..Default::default()
            },
        )
        .await?;

    let bm25_stats = bm25.stats();
    println!(
        "BM25 index: {} docs, {} unique terms",
        bm25_stats["total_docs"], bm25_stats["unique_terms"]
    );

    println!("\nVerification queries:");
    for query in ["红烧肉怎么做？", "有什么川菜推荐？", "简单快手菜"] {
        println!("  query: {query}");
        match bm25.retrieve(query, 3) {
            Ok(results) => {
                for (i, doc) in results.iter().take(2).enumerate() {
                    println!("    bm25 [{}] {} score={:.4}", i + 1, doc.id, doc.score);
                }
            }
            Err(err) => warn!(query, %err, "bm25 verification failed"),
        }
        match vector.retrieve(query).await {
            Ok(result) => {
                for (i, doc) in result.documents.iter().take(2).enumerate() {
                    println!("    vector [{}] {} score={:.4}", i + 1, doc.id, doc.score);
                }
            }
            Err(err) => warn!(query, %err, "vector verification failed"),
        }
    }

    println!("\n✅ Import completed ({} documents)", documents.len());
    Ok(())
}
