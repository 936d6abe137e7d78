use std::sync::Arc;
use std::time::Duration;

use cookrag_core::observability::MetricsCollector;
use cookrag_core::types::{Document, Strategy};
use cookrag_ml::embedding::HashingEmbedder;
use cookrag_vector::{MemoryCache, MemoryVectorStore, VectorRetriever, VectorRetrieverConfig};

const DIM: usize = 64;

fn doc(content: &str) -> Document {
    Document { content: content.to_string(), ..Default::default() }
}

async fn build_retriever(
    with_cache: bool,
) -> (VectorRetriever, Arc<MetricsCollector>) {
    let embedder = Arc::new(HashingEmbedder::new(DIM));
    let store = Arc::new(MemoryVectorStore::new());
    let metrics = Arc::new(MetricsCollector::new());

    use cookrag_core::traits::VectorStore;
    store.create_collection("cookrag_documents", DIM).await.unwrap();

    let cache = if with_cache {
        Some(Arc::new(MemoryCache::new()) as Arc<dyn cookrag_core::traits::Cache>)
    } else {
        None
    };

    let config = VectorRetrieverConfig {
        top_k: 3,
        cache_ttl: Duration::from_secs(60),
        ..Default::default()
    };
    let retriever =
        VectorRetriever::new(config, embedder, store, cache, Arc::clone(&metrics));

    retriever
        .index_documents(&[
            doc("红烧肉 做法 酱油 糖"),
            doc("宫保鸡丁 花生 辣椒"),
            doc("麻婆豆腐 豆腐 花椒"),
        ])
        .await
        .unwrap();

    (retriever, metrics)
}

#[tokio::test]
async fn identical_text_ranks_first_with_max_similarity() {
    let (retriever, _) = build_retriever(false).await;

    let result = retriever.retrieve("红烧肉 做法 酱油 糖").await.unwrap();
    assert_eq!(result.strategy, Strategy::Vector);
    assert_eq!(result.documents[0].id, "doc_0");
    assert!(result.documents[0].score > 0.99);
    // ordering is by descending similarity
    for pair in result.documents.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn second_identical_query_hits_the_cache() {
    let (retriever, metrics) = build_retriever(true).await;

    let first = retriever.retrieve("红烧肉 做法 酱油 糖").await.unwrap();
    let second = retriever.retrieve("红烧肉 做法 酱油 糖").await.unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.cache_miss_count, 1);
    assert_eq!(snapshot.cache_hit_count, 1);

    let first_ids: Vec<&str> = first.documents.iter().map(|d| d.id.as_str()).collect();
    let second_ids: Vec<&str> = second.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn batch_retrieve_segments_per_query_in_input_order() {
    let (retriever, _) = build_retriever(false).await;

    let queries = vec![
        "宫保鸡丁 花生 辣椒".to_string(),
        "麻婆豆腐 豆腐 花椒".to_string(),
    ];
    let results = retriever.retrieve_batch(&queries).await.unwrap();

    assert_eq!(results.len(), 2);
    for (result, query) in results.iter().zip(&queries) {
        assert_eq!(result.strategy, Strategy::VectorBatch);
        assert_eq!(&result.query, query);
        assert_eq!(result.documents.len(), 3);
    }
    assert_eq!(results[0].documents[0].id, "doc_1");
    assert_eq!(results[1].documents[0].id, "doc_2");
}

#[tokio::test]
async fn empty_batch_returns_empty() {
    let (retriever, _) = build_retriever(false).await;
    let results = retriever.retrieve_batch(&[]).await.unwrap();
    assert!(results.is_empty());
}
