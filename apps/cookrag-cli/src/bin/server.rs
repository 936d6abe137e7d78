//! HTTP query server. Indexes the configured corpus at startup, then
//! serves `/api/v1/query` plus health/ready/metrics endpoints.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cookrag_core::config::Config;
use cookrag_core::loader::RecipeLoader;
use cookrag_core::observability::MetricsCollector;
use cookrag_core::traits::{Cache, GraphStore};
use cookrag_core::types::{Document, Strategy};
use cookrag_engine::{IndexConfig, Indexer, QueryRouter};
use cookrag_graph::{GraphBuilder, GraphRetriever, GraphRetrieverConfig, Neo4jGraphStore};
use cookrag_hybrid::{HybridRetriever, HybridRetrieverConfig};
use cookrag_ml::{embedding, llm};
use cookrag_text::Bm25Retriever;
use cookrag_vector::{MemoryCache, MemoryVectorStore, VectorRetriever, VectorRetrieverConfig};

#[derive(Clone)]
struct AppState {
    router: Arc<QueryRouter>,
    generator: Option<Arc<llm::Generator>>,
    metrics: Arc<MetricsCollector>,
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    documents: Vec<Document>,
    strategy: Strategy,
    latency_ms: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path =
        env::args().nth(1).unwrap_or_else(|| "config/config.yaml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {config_path}"))?;

    // RUST_LOG wins; the config file supplies the default level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(config = %config_path, port = config.server.port, "starting cookrag server");

    let metrics = Arc::new(MetricsCollector::new());
    let embedder = embedding::new_provider(&config.embedding)?;

    let vector_store = Arc::new(MemoryVectorStore::new());
    let cache: Option<Arc<dyn Cache>> = if config.vector.use_cache {
        Some(Arc::new(MemoryCache::new()))
    } else {
        None
    };

    let vector = Arc::new(VectorRetriever::new(
        VectorRetrieverConfig {
            collection_name: config.vector.collection_name.clone(),
            top_k: config.vector.top_k,
            use_cache: config.vector.use_cache,
            cache_ttl: Duration::from_secs(config.vector.cache_ttl_secs),
            ..Default::default()
        },
        embedder.clone(),
        vector_store.clone(),
        cache,
        metrics.clone(),
    ));
    let bm25 = Arc::new(Bm25Retriever::default());

    let graph_store: Option<Arc<dyn GraphStore>> = if config.neo4j.uri.is_empty() {
        info!("neo4j not configured; graph retrieval disabled");
        None
    } else {
        Some(Arc::new(Neo4jGraphStore::connect(&config.neo4j).await?))
    };

    // index the corpus before binding so the first query finds data
    let documents = match RecipeLoader::new(&config.data.recipes_path).load() {
        Ok(docs) => docs,
        Err(err) => {
            warn!(%err, "failed to load recipe corpus; starting with an empty index");
            Vec::new()
        }
    };
    if !documents.is_empty() {
        let graph_builder = graph_store
            .clone()
            .map(|store| Arc::new(GraphBuilder::new(store)));
        let indexer = Indexer::new(
            embedder.clone(),
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
                    graph_index: graph_store.is_some(),
                    ..Default::default()
                },
            )
            .await?;
        info!(count = documents.len(), "startup indexing completed");
    }

    let graph = graph_store
        .map(|store| Arc::new(GraphRetriever::new(GraphRetrieverConfig::default(), store)));
    let hybrid = Arc::new(HybridRetriever::new(
        HybridRetrieverConfig { top_k: config.vector.top_k, ..Default::default() },
        vector.clone(),
        bm25.clone(),
    ));
    let router = Arc::new(QueryRouter::new(
        config.router.clone(),
        vector,
        bm25,
        graph,
        hybrid,
        metrics.clone(),
    ));

    let generator = llm::new_provider(&config.llm)?
        .map(|provider| Arc::new(llm::Generator::new(provider)));
    if generator.is_none() {
        info!("llm not configured; responses carry retrieval results only");
    }

    if config.observability.enable_metrics {
        let _reporter = metrics
            .spawn_reporter(Duration::from_secs(config.observability.report_interval_secs));
    }

    let state = AppState { router, generator, metrics };
    let app = Router::new()
        .route("/api/v1/query", post(handle_query))
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/ready", get(handle_ready))
        .route("/api/v1/metrics", get(handle_metrics))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    info!(port = config.server.port, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;

    info!("server stopped");
    Ok(())
}

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<serde_json::Value>)> {
    info!(query = %request.query, "received query");

    let result = state.router.route(&request.query).await.map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "query processing failed", "details": err.to_string()})),
        )
    })?;

    // answer generation is additive; a generator failure degrades to a
    // retrieval-only response
    let answer = match &state.generator {
        Some(generator) => generator
            .generate_answer(&request.query, &result.documents)
            .await
            .unwrap_or_else(|err| {
                warn!(%err, "answer generation failed");
                String::new()
            }),
        None => String::new(),
    };

    Ok(Json(QueryResponse {
        answer,
        documents: result.documents,
        strategy: result.strategy,
        latency_ms: result.latency_ms,
    }))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": "cookrag"}))
}

async fn handle_ready() -> Json<serde_json::Value> {
    Json(json!({"status": "ready"}))
}

async fn handle_metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.metrics.snapshot();
    Json(json!({
        "metrics": snapshot,
        "average_latency_ms": state.metrics.average_latency_ms(),
        "cache_hit_rate": state.metrics.cache_hit_rate(),
        "error_rate": state.metrics.error_rate(),
        "uptime_secs": state.metrics.uptime().as_secs(),
    }))
}
