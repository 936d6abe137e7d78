use std::sync::Arc;
use std::thread;

use cookrag_core::types::Document;
use cookrag_text::{Bm25Config, Bm25Retriever};

fn doc(content: &str) -> Document {
    Document { content: content.to_string(), ..Default::default() }
}

#[test]
fn incremental_bulk_passes_keep_earlier_documents_retrievable() {
    let retriever = Bm25Retriever::new(Bm25Config::default());
    retriever
        .index_documents(&[doc("红烧肉 做法 酱油 糖"), doc("宫保鸡丁 花生 辣椒")])
        .unwrap();

    let first = retriever.retrieve("红烧肉", 5).unwrap();
    assert_eq!(first[0].id, "doc_0");

    retriever.index_documents(&[doc("麻婆豆腐 豆腐 花椒")]).unwrap();

    // earlier docs survive the append and keep their ids
    let again = retriever.retrieve("红烧肉", 5).unwrap();
    assert_eq!(again[0].id, "doc_0");
    let newest = retriever.retrieve("麻婆豆腐", 5).unwrap();
    assert_eq!(newest[0].id, "doc_2");
}

#[test]
fn concurrent_readers_with_a_writer_never_panic() {
    let retriever = Arc::new(Bm25Retriever::default());
    retriever
        .index_documents(&[doc("红烧肉 酱油"), doc("豆腐 花椒")])
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let r = Arc::clone(&retriever);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                let results = r.retrieve("红烧肉", 3).unwrap();
                // a reader sees either the pre-write or post-write
                // snapshot, never a torn one
                assert!(!results.is_empty());
            }
        }));
    }

    let writer = {
        let r = Arc::clone(&retriever);
        thread::spawn(move || {
            for _ in 0..10 {
                r.index_documents(&[doc("青椒 土豆 丝")]).unwrap();
            }
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    writer.join().unwrap();

    let stats = retriever.stats();
    assert_eq!(stats["total_docs"], "12");
}
