//! cookrag-text
//!
//! Lexical retrieval: CJK-aware tokenization, the in-memory inverted
//! index and Okapi BM25 scoring over it.

pub mod bm25;
pub mod index;
pub mod tokenizer;

pub use bm25::{Bm25Config, Bm25Retriever};
pub use index::InvertedIndex;
pub use tokenizer::{segment, tokenize};
