//! LLM answer generation over retrieved documents.

mod zhipu;

pub use zhipu::ZhipuLlm;

use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::info;

use cookrag_core::config::LlmConfig;
use cookrag_core::observability::Span;
use cookrag_core::traits::LlmProvider;
use cookrag_core::types::Document;
use cookrag_core::{Error, Result};

/// Build the configured LLM provider. An empty provider name disables
/// answer generation (retrieval-only responses).
pub fn new_provider(config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    match config.provider.as_str() {
        "" => Ok(None),
        "zhipu" => Ok(Some(Arc::new(ZhipuLlm::new(config)?))),
        other => Err(Error::Config(format!(
            "unknown llm provider: {other} (supported: zhipu)"
        ))),
    }
}

/// Composes retrieved documents into a prompt and drives the provider.
pub struct Generator {
    provider: Arc<dyn LlmProvider>,
}

impl Generator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate_answer(&self, query: &str, documents: &[Document]) -> Result<String> {
        let mut span = Span::start("llm_generate_answer");
        span.add_metadata("query", query);
        span.add_metadata("doc_count", documents.len());

        info!(doc_count = documents.len(), "generating answer");
        let prompt = build_prompt(query, &build_context(documents));

        match self.provider.generate(&prompt).await {
            Ok(answer) => {
                span.add_metadata("answer_length", answer.chars().count());
                Ok(answer)
            }
            Err(err) => {
                span.set_error(&err);
                Err(err)
            }
        }
    }

    /// Streamed variant; the receiver yields text chunks until the
    /// provider closes the channel. Dropping the receiver cancels the
    /// upstream call.
    pub async fn generate_answer_stream(
        &self,
        query: &str,
        documents: &[Document],
    ) -> Result<Receiver<String>> {
        let prompt = build_prompt(query, &build_context(documents));
        self.provider.generate_stream(&prompt).await
    }
}

fn build_context(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "没有找到相关文档。".to_string();
    }

    let mut context = String::from("参考文档：\n\n");
    for (i, doc) in documents.iter().enumerate() {
        context.push_str(&format!("[文档{}] {}\n", i + 1, doc.content));
        if let Some(source) = doc.metadata.get("source").and_then(|v| v.as_str()) {
            context.push_str(&format!("来源: {source}\n"));
        }
        context.push('\n');
    }
    context
}

fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "你是一位专业的中餐烹饪助手。请根据下面的参考资料回答用户的问题。\n\
         如果参考资料中没有相关信息，请直接说明，不要编造内容。\n\n\
         {context}\n用户问题：{query}\n\n回答："
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_numbers_documents_and_includes_sources() {
        let mut doc = Document { content: "红烧肉做法".to_string(), ..Default::default() };
        doc.metadata.insert("source".into(), "meat/红烧肉.md".into());

        let context = build_context(&[doc]);
        assert!(context.contains("[文档1] 红烧肉做法"));
        assert!(context.contains("来源: meat/红烧肉.md"));
    }

    #[test]
    fn empty_documents_yield_a_fallback_context() {
        assert!(build_context(&[]).contains("没有找到"));
    }
}
