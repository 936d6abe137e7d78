//! Zhipu AI chat-completions client with SSE streaming.

use async_trait::async_trait;
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use cookrag_core::config::LlmConfig;
use cookrag_core::traits::LlmProvider;
use cookrag_core::{Error, Result};

const CHAT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";

// Zhipu keys are `id.secret` pairs with a long alphanumeric secret.
static API_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+\.[a-zA-Z0-9]{40,}$").unwrap());

pub struct ZhipuLlm {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

impl ZhipuLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.trim().to_string();
        validate_api_key(&api_key)?;
        info!(key = %mask_api_key(&api_key), "zhipu llm key loaded");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::internal)?;

        Ok(Self { api_key, model: config.model.clone(), client })
    }

    fn request_body(&self, prompt: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": stream,
        })
    }
}

#[async_trait]
impl LlmProvider for ZhipuLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, false))
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
            return Err(Error::Protocol(format!("llm API status {status}: {text}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(Error::protocol)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Protocol("no choices in response".to_string()))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<mpsc::Receiver<String>> {
        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, true))
            .send()
            .await
            .map_err(Error::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Protocol(format!("llm API status {status}: {text}")));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk) = body.next().await {
                let Ok(bytes) = chunk else { break };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(payload) = line.strip_prefix("data:") else { continue };
                    let payload = payload.trim();
                    if payload == "[DONE]" {
                        return;
                    }
                    let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) else {
                        debug!("skipping malformed stream chunk");
                        continue;
                    };
                    if let Some(content) =
                        value["choices"][0]["delta"]["content"].as_str()
                    {
                        // a dropped receiver cancels the stream
                        if tx.send(content.to_string()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn validate_api_key(api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(Error::Config(
            "llm api key is empty (set ZHIPU_API_KEY)".to_string(),
        ));
    }
    if api_key.len() < 50 || !API_KEY_PATTERN.is_match(api_key) {
        return Err(Error::Config(
            "llm api key format invalid: expected 'id.secret'".to_string(),
        ));
    }
    Ok(())
}

fn mask_api_key(api_key: &str) -> String {
    match api_key.split_once('.') {
        Some((id, secret)) if secret.len() > 8 => {
            let head: String = id.chars().take(4).collect();
            format!("{head}***.{}...{}", &secret[..4], &secret[secret.len() - 4..])
        }
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_format_is_enforced() {
        assert!(validate_api_key("").is_err());
        assert!(validate_api_key("tooshort.key").is_err());
        let valid = format!("abc123.{}", "x".repeat(44));
        assert!(validate_api_key(&valid).is_ok());
    }

    #[test]
    fn masked_key_hides_the_secret() {
        let key = format!("abcdef.{}", "s".repeat(44));
        let masked = mask_api_key(&key);
        assert!(!masked.contains(&"s".repeat(44)));
        assert!(masked.starts_with("abcd***."));
    }
}
