use std::sync::Arc;

use cookrag_core::observability::MetricsCollector;
use cookrag_core::traits::VectorStore;
use cookrag_core::types::{Document, Strategy};
use cookrag_hybrid::{HybridRetriever, HybridRetrieverConfig};
use cookrag_ml::embedding::HashingEmbedder;
use cookrag_text::Bm25Retriever;
use cookrag_vector::{MemoryVectorStore, VectorRetriever, VectorRetrieverConfig};

const DIM: usize = 64;

fn doc(content: &str) -> Document {
    Document { content: content.to_string(), ..Default::default() }
}

async fn build_hybrid() -> HybridRetriever {
    let corpus = vec![
        doc("红烧肉 做法 酱油 糖"),
        doc("宫保鸡丁 花生 辣椒"),
        doc("麻婆豆腐 豆腐 花椒"),
    ];

    let store = Arc::new(MemoryVectorStore::new());
    store.create_collection("cookrag_documents", DIM).await.unwrap();

    let vector = Arc::new(VectorRetriever::new(
        VectorRetrieverConfig { top_k: 3, use_cache: false, ..Default::default() },
        Arc::new(HashingEmbedder::new(DIM)),
        store,
        None,
        Arc::new(MetricsCollector::new()),
    ));
    vector.index_documents(&corpus).await.unwrap();

    let bm25 = Arc::new(Bm25Retriever::default());
    bm25.index_documents(&corpus).unwrap();

    HybridRetriever::new(
        HybridRetrieverConfig { top_k: 3, ..Default::default() },
        vector,
        bm25,
    )
}

#[tokio::test]
async fn hybrid_fuses_both_children_into_one_ordered_list() {
    let hybrid = build_hybrid().await;
    let result = hybrid.retrieve("红烧肉 酱油").await.unwrap();

    assert_eq!(result.strategy, Strategy::Hybrid);
    assert!(!result.documents.is_empty());
    assert!(result.documents.len() <= 3);
    for pair in result.documents.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // the doc matching both retrievers leads the fusion
    assert_eq!(result.documents[0].id, "doc_0");
}

#[tokio::test]
async fn adaptive_mode_works_across_the_complexity_range() {
    let hybrid = build_hybrid().await;
    for complexity in [0.1, 0.5, 0.9] {
        let result = hybrid.adaptive("红烧肉 酱油", complexity).await.unwrap();
        assert_eq!(result.strategy, Strategy::Hybrid);
        assert!(!result.documents.is_empty());
    }
}

#[tokio::test]
async fn query_expansion_always_returns_the_original() {
    let hybrid = build_hybrid().await;

    let short = hybrid.expand_query("豆腐");
    assert_eq!(short[0], "豆腐");
    assert_eq!(short.len(), 1);

    let long = hybrid.expand_query("红烧肉 酱油 冰糖 做法");
    assert_eq!(long[0], "红烧肉 酱油 冰糖 做法");
    assert!(long.len() > 1, "bigram variants expected for >2 terms");
}
