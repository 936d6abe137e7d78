//! In-memory inverted index. Mutated only by bulk indexing passes; a
//! reader holding the outer lock sees postings, document frequencies and
//! the length statistics as one consistent snapshot.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct InvertedIndex {
    // term -> document ids; one entry per distinct term per document
    postings: HashMap<String, Vec<i64>>,
    // term -> number of distinct documents containing it
    doc_freq: HashMap<String, usize>,
    // document id -> term count
    doc_lengths: HashMap<i64, usize>,
    avg_doc_length: f64,
    total_docs: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one tokenized document. Ids are sequential, continuing from
    /// the current document count. Call [`recompute`](Self::recompute)
    /// once after a bulk pass.
    pub fn add_document(&mut self, terms: &[String]) -> i64 {
        let doc_id = self.total_docs as i64;
        self.doc_lengths.insert(doc_id, terms.len());

        let distinct: HashSet<&String> = terms.iter().collect();
        for term in distinct {
            self.postings.entry(term.clone()).or_default().push(doc_id);
        }

        self.total_docs += 1;
        doc_id
    }

    /// Recompute the average document length and per-term document
    /// frequencies over everything indexed so far.
    pub fn recompute(&mut self) {
        if self.total_docs > 0 {
            let total_length: usize = self.doc_lengths.values().sum();
            self.avg_doc_length = total_length as f64 / self.total_docs as f64;
        } else {
            self.avg_doc_length = 0.0;
        }

        for (term, postings) in &self.postings {
            let unique: HashSet<i64> = postings.iter().copied().collect();
            self.doc_freq.insert(term.clone(), unique.len());
        }
    }

    pub fn postings(&self, term: &str) -> Option<&[i64]> {
        self.postings.get(term).map(|p| p.as_slice())
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    pub fn doc_length(&self, doc_id: i64) -> usize {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }

    pub fn total_docs(&self) -> usize {
        self.total_docs
    }

    pub fn unique_terms(&self) -> usize {
        self.postings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn doc_freq_collapses_duplicates_and_avg_is_exact() {
        let mut index = InvertedIndex::new();
        index.add_document(&terms(&["红烧肉", "酱油", "糖"]));
        index.add_document(&terms(&["酱油", "醋"]));
        index.recompute();

        assert_eq!(index.total_docs(), 2);
        assert_eq!(index.doc_freq("酱油"), 2);
        assert_eq!(index.doc_freq("红烧肉"), 1);
        assert_eq!(index.doc_freq("不存在"), 0);
        assert!((index.avg_doc_length() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn second_bulk_pass_continues_ids_and_recomputes_over_union() {
        let mut index = InvertedIndex::new();
        index.add_document(&terms(&["a1", "a2"]));
        index.recompute();
        assert!((index.avg_doc_length() - 2.0).abs() < 1e-9);

        let id = index.add_document(&terms(&["a1", "b1", "b2", "b3"]));
        index.recompute();

        assert_eq!(id, 1);
        assert_eq!(index.total_docs(), 2);
        assert_eq!(index.doc_freq("a1"), 2);
        // (2 + 4) / 2, over the union of both passes
        assert!((index.avg_doc_length() - 3.0).abs() < 1e-9);
    }
}
