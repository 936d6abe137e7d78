//! Offline knowledge-graph construction from a tree of dish markdown
//! files (`<category>/.../<dish>.md`).

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cookrag_core::config::Config;
use cookrag_core::traits::GraphStore;
use cookrag_graph::{GraphBuilder, Neo4jGraphStore, RecipeDoc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("CookRAG Knowledge Graph Builder");

    let mut args = env::args().skip(1);
    let docs_dir = args.next();
    let config_path = args.next().unwrap_or_else(|| "config/config.yaml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {config_path}"))?;
    let docs_dir = PathBuf::from(docs_dir.unwrap_or_else(|| config.data.dishes_dir.clone()));

    if config.neo4j.uri.is_empty() {
        anyhow::bail!("neo4j connection is required for graph building (set neo4j.uri)");
    }
    let store: Arc<dyn GraphStore> =
        Arc::new(Neo4jGraphStore::connect(&config.neo4j).await?);

    println!("Loading documents from {}", docs_dir.display());
    let documents = load_dish_documents(&docs_dir)?;
    println!("Loaded {} documents", documents.len());

    let builder = GraphBuilder::new(store);
    let stats = builder.build_from_documents(&documents).await?;

    println!("\nBuild summary:");
    println!("  Dishes:      {}", stats.dishes);
    println!("  Ingredients: {}", stats.ingredients);
    println!("  Categories:  {}", stats.categories);
    println!("  Relations:   {}", stats.relations);
    println!("  Duration:    {:.2?}", stats.duration);
    println!("\n✅ Knowledge graph built successfully");
    Ok(())
}

/// Walk `<dir>/<category>/.../<dish>.md`: the first path component is
/// the category, the file stem the dish name.
fn load_dish_documents(dir: &Path) -> anyhow::Result<Vec<RecipeDoc>> {
    let mut documents = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read file");
                continue;
            }
        };

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let dish_name = relative
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let category = relative
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .filter(|c| !c.ends_with(".md"))
            .unwrap_or_default();

        documents.push(RecipeDoc { content, category, dish_name });
    }

    Ok(documents)
}
