//! Deterministic token-hash embedder. No network, no model weights:
//! each token lights one dimension of the output vector, which is then
//! L2-normalized. Used for tests and fully offline runs.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use cookrag_core::traits::EmbeddingProvider;
use cookrag_core::{Error, Result};

pub struct HashingEmbedder {
    dim: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let mut position = 0usize;
        for piece in text.split_whitespace() {
            self.mix(&mut v, piece, position);
            position += 1;
            // CJK text carries no whitespace; spread its characters over
            // separate dimensions as well
            if piece.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c)) {
                for c in piece.chars() {
                    let mut buf = [0u8; 4];
                    self.mix(&mut v, c.encode_utf8(&mut buf), position);
                    position += 1;
                }
            }
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }

    fn mix(&self, v: &mut [f32], token: &str, position: usize) {
        let mut hasher = XxHash64::with_seed(0);
        token.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h as usize) % self.dim;
        let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        v[idx] += val + (position as f32 % 3.0) * 0.01;
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::InvalidInput("empty batch".to_string()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("红烧肉怎么做").await.unwrap();
        let b = embedder.embed("红烧肉怎么做").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn different_texts_differ() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("红烧肉").await.unwrap();
        let b = embedder.embed("宫保鸡丁").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec!["红烧肉".to_string(), "宫保鸡丁".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], embedder.embed("红烧肉").await.unwrap());
        assert_eq!(batch[1], embedder.embed("宫保鸡丁").await.unwrap());
    }
}
