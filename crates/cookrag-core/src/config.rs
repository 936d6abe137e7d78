//! Configuration loading.
//!
//! Merges a YAML file with `COOKRAG_*` environment variables via Figment
//! and expands `${VAR}` / `$VAR` placeholders in secret-bearing fields so
//! credentials never need to live in the file itself.

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_server_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_server_timeout")]
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_api_key_var")]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorConfig {
    #[serde(default = "default_collection")]
    pub collection_name: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Neo4jConfig {
    /// Empty URI disables the graph path entirely.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Empty provider means retrieval-only responses (no generated answer).
    #[serde(default)]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_key_var")]
    pub api_key: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: f64,
    #[serde(default = "default_true")]
    pub enable_graph_rag: bool,
    #[serde(default = "default_true")]
    pub enable_hybrid: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_recipes_path")]
    pub recipes_path: String,
    #[serde(default = "default_dishes_dir")]
    pub dishes_dir: String,
}

impl Config {
    /// Load from a YAML file merged with `COOKRAG_*` environment
    /// variables, then expand credential placeholders.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("COOKRAG_"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.embedding.api_key = expand_secret(&config.embedding.api_key);
        config.llm.api_key = expand_secret(&config.llm.api_key);
        config.neo4j.username = expand_secret(&config.neo4j.username);
        config.neo4j.password = expand_secret(&config.neo4j.password);

        Ok(config)
    }
}

/// Expand `${VAR}` / `$VAR` against the process environment. Unset
/// variables leave the value empty rather than failing startup, so a
/// missing optional credential only surfaces when the backend is used.
fn expand_secret(value: &str) -> String {
    match shellexpand::env(value) {
        Ok(expanded) => expanded.into_owned(),
        Err(_) => String::new(),
    }
}

fn default_port() -> u16 { 8080 }
fn default_server_timeout() -> u64 { 10 }
fn default_embedding_provider() -> String { "zhipu".to_string() }
fn default_api_key_var() -> String { "${ZHIPU_API_KEY}".to_string() }
fn default_embedding_model() -> String { "embedding-2".to_string() }
fn default_embedding_timeout() -> u64 { 30 }
fn default_collection() -> String { "cookrag_documents".to_string() }
fn default_top_k() -> usize { 10 }
fn default_true() -> bool { true }
fn default_cache_ttl() -> u64 { 300 }
fn default_llm_model() -> String { "glm-4-flash".to_string() }
fn default_llm_timeout() -> u64 { 60 }
fn default_complexity_threshold() -> f64 { 0.5 }
fn default_report_interval() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_recipes_path() -> String { "data/recipes.json".to_string() }
fn default_dishes_dir() -> String { "docs/dishes".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            read_timeout_secs: default_server_timeout(),
            write_timeout_secs: default_server_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: default_api_key_var(),
            model: default_embedding_model(),
            base_url: String::new(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection(),
            top_k: default_top_k(),
            use_cache: true,
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: default_llm_model(),
            api_key: default_api_key_var(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: default_complexity_threshold(),
            enable_graph_rag: true,
            enable_hybrid: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            report_interval_secs: default_report_interval(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            recipes_path: default_recipes_path(),
            dishes_dir: default_dishes_dir(),
        }
    }
}
