//! Okapi BM25 over the inverted index.
//!
//! Term frequency is fixed at 1 per posting entry: a document enters a
//! term's posting list once per indexing pass, and its contribution is
//! accumulated once per query term it contains. IDF is not floored, so
//! terms present in more than half of the corpus contribute near-zero or
//! slightly negative weight.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use cookrag_core::observability::Span;
use cookrag_core::types::Document;
use cookrag_core::Result;

use crate::index::InvertedIndex;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy)]
pub struct Bm25Config {
    /// Term-frequency saturation, typically 1.2-2.0.
    pub k1: f64,
    /// Length normalization strength.
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// BM25 retriever owning one inverted index behind a many-readers /
/// single-writer lock. Queries take the read handle; bulk indexing takes
/// the write handle for the whole pass, so readers never observe a
/// half-updated index.
pub struct Bm25Retriever {
    config: Bm25Config,
    index: RwLock<InvertedIndex>,
}

impl Default for Bm25Retriever {
    fn default() -> Self {
        Self::new(Bm25Config::default())
    }
}

impl Bm25Retriever {
    pub fn new(config: Bm25Config) -> Self {
        Self { config, index: RwLock::new(InvertedIndex::new()) }
    }

    /// Bulk-index a batch of documents. Tokenization happens outside the
    /// lock; the index mutation itself is atomic from a reader's view.
    pub fn index_documents(&self, documents: &[Document]) -> Result<()> {
        info!(count = documents.len(), "indexing documents with BM25");

        let tokenized: Vec<Vec<String>> =
            documents.iter().map(|d| tokenize(&d.content)).collect();

        let mut index = self.index.write().unwrap();
        for terms in &tokenized {
            index.add_document(terms);
        }
        index.recompute();

        info!(
            total_docs = index.total_docs(),
            avg_doc_length = index.avg_doc_length(),
            unique_terms = index.unique_terms(),
            "BM25 indexing completed"
        );
        Ok(())
    }

    /// Score the query against the index and return the top `top_k`
    /// documents as `doc_<n>` stubs carrying the accumulated score.
    /// An empty query after tokenization returns an empty list.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let mut span = Span::start("bm25_retrieve");
        span.add_metadata("query", query);
        span.add_metadata("top_k", top_k);

        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }
        span.add_metadata("term_count", query_terms.len());

        let index = self.index.read().unwrap();
        let total_docs = index.total_docs() as f64;

        let mut scores: HashMap<i64, f64> = HashMap::new();
        for term in &query_terms {
            let Some(postings) = index.postings(term) else {
                continue;
            };
            let df = index.doc_freq(term) as f64;
            let idf = ((total_docs - df + 0.5) / (df + 0.5)).ln();

            for &doc_id in postings {
                let dl = index.doc_length(doc_id) as f64;
                let norm = 1.0 - self.config.b + self.config.b * dl / index.avg_doc_length();
                let tf = 1.0;
                let contribution =
                    idf * (tf * (self.config.k1 + 1.0)) / (tf + self.config.k1 * norm);
                *scores.entry(doc_id).or_insert(0.0) += contribution;
            }
        }

        // Ascending id first, then a stable sort on score: equal scores
        // keep insertion order.
        let mut ranked: Vec<(i64, f64)> = scores.into_iter().collect();
        ranked.sort_by_key(|(doc_id, _)| *doc_id);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_k);

        let results: Vec<Document> = ranked
            .into_iter()
            .map(|(doc_id, score)| Document {
                id: format!("doc_{doc_id}"),
                score: score as f32,
                ..Default::default()
            })
            .collect();

        span.add_metadata("result_count", results.len());
        Ok(results)
    }

    pub fn stats(&self) -> HashMap<String, String> {
        let index = self.index.read().unwrap();
        HashMap::from([
            ("total_docs".to_string(), index.total_docs().to_string()),
            ("unique_terms".to_string(), index.unique_terms().to_string()),
            ("avg_doc_length".to_string(), format!("{:.2}", index.avg_doc_length())),
            ("k1".to_string(), self.config.k1.to_string()),
            ("b".to_string(), self.config.b.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document { content: content.to_string(), ..Default::default() }
    }

    #[test]
    fn single_term_query_ranks_the_containing_doc_first() {
        let retriever = Bm25Retriever::default();
        retriever
            .index_documents(&[
                doc("红烧肉 做法 酱油 糖"),
                doc("宫保鸡丁 花生 辣椒"),
                doc("麻婆豆腐 豆腐 花椒"),
            ])
            .unwrap();

        let results = retriever.retrieve("红烧肉", 10).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].id, "doc_0");
        assert!(results[0].score > 0.0);
        for r in &results[1..] {
            assert!(r.score <= 0.0, "non-matching doc scored {}", r.score);
        }
    }

    #[test]
    fn empty_query_after_tokenization_returns_empty() {
        let retriever = Bm25Retriever::default();
        retriever.index_documents(&[doc("红烧肉 做法")]).unwrap();
        let results = retriever.retrieve("的 了", 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn common_terms_get_negative_idf() {
        let retriever = Bm25Retriever::default();
        retriever
            .index_documents(&[
                doc("酱油 红烧肉"),
                doc("酱油 豆腐"),
                doc("花椒 辣椒"),
            ])
            .unwrap();

        // 酱油 appears in 2 of 3 docs: idf = ln(1.5/2.5) < 0
        let results = retriever.retrieve("酱油", 10).unwrap();
        assert!(!results.is_empty());
        assert!(results[0].score < 0.0);
    }

    #[test]
    fn shorter_document_wins_for_a_shared_rare_term() {
        let retriever = Bm25Retriever::default();
        // 糖醋 stays below half the corpus so its IDF is positive; the
        // shorter of the two containing docs has the smaller dl/avgdl
        // and must rank first.
        retriever
            .index_documents(&[
                doc("糖醋 排骨 土豆 茄子 黄瓜 萝卜 白菜 菠菜"),
                doc("糖醋 排骨"),
                doc("豆腐 花椒"),
                doc("辣椒 花生"),
                doc("米饭 面条"),
            ])
            .unwrap();

        let results = retriever.retrieve("糖醋", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "doc_1");
        assert!(results[0].score > results[1].score);
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn equal_scores_preserve_insertion_order() {
        let retriever = Bm25Retriever::default();
        retriever
            .index_documents(&[doc("豆腐 花椒"), doc("豆腐 花椒"), doc("豆腐 花椒")])
            .unwrap();

        let results = retriever.retrieve("豆腐", 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2"]);
    }
}
