//! Zhipu AI embedding client (https://open.bigmodel.cn).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use cookrag_core::config::EmbeddingConfig;
use cookrag_core::traits::EmbeddingProvider;
use cookrag_core::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
// Upstream accepts at most this many inputs per request; larger batches
// are chunked and concatenated in input order.
const MAX_BATCH: usize = 25;

pub struct ZhipuEmbedding {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}

impl ZhipuEmbedding {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config(
                "zhipu embedding requires an api_key (set ZHIPU_API_KEY)".to_string(),
            ));
        }

        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };
        let model = if config.model.is_empty() {
            "embedding-2".to_string()
        } else {
            config.model.clone()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::internal)?;

        // embedding-2 and embedding-3 both produce 1024-dim vectors
        Ok(Self { api_key: config.api_key.clone(), base_url, model, client, dimension: 1024 })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": inputs,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::DeadlineExceeded
                } else {
                    Error::unavailable(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Protocol(format!("embedding API status {status}: {text}")));
        }

        let mut parsed: EmbeddingResponse =
            response.json().await.map_err(Error::protocol)?;
        if parsed.data.len() != inputs.len() {
            return Err(Error::Protocol(format!(
                "embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }

        parsed.data.sort_by_key(|item| item.index);
        for item in &parsed.data {
            if item.embedding.len() != self.dimension {
                return Err(Error::Protocol(format!(
                    "embedding dimension {} != expected {}",
                    item.embedding.len(),
                    self.dimension
                )));
            }
        }

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for ZhipuEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Protocol("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::InvalidInput("empty batch".to_string()));
        }

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            debug!(batch = chunk.len(), "embedding batch");
            all.extend(self.request(chunk).await?);
        }
        Ok(all)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
