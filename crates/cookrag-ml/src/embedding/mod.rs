//! Embedding provider construction, keyed by provider name.

mod hashing;
mod zhipu;

pub use hashing::HashingEmbedder;
pub use zhipu::ZhipuEmbedding;

use std::sync::Arc;

use cookrag_core::config::EmbeddingConfig;
use cookrag_core::traits::EmbeddingProvider;
use cookrag_core::{Error, Result};

/// Build the configured embedding provider. `zhipu` talks to the remote
/// API; `hashing` is the deterministic offline substitute.
pub fn new_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "zhipu" => Ok(Arc::new(ZhipuEmbedding::new(config)?)),
        "hashing" => Ok(Arc::new(HashingEmbedder::default())),
        other => Err(Error::Config(format!(
            "unknown embedding provider: {other} (supported: zhipu, hashing)"
        ))),
    }
}
