use std::sync::Arc;

use cookrag_core::traits::GraphStore;
use cookrag_core::types::Strategy;
use cookrag_graph::{
    GraphBuilder, GraphRetriever, GraphRetrieverConfig, MemoryGraphStore, RecipeDoc,
};

fn hongshaorou() -> RecipeDoc {
    RecipeDoc {
        content: "# 红烧肉\n\n## 必备原料\n\n* 五花肉 500g\n* 酱油 15ml\n* 冰糖\n\n## 操作\n\n用炒锅翻炒。"
            .to_string(),
        category: "meat_dish".to_string(),
        dish_name: "红烧肉".to_string(),
    }
}

fn fanqie_chaodan() -> RecipeDoc {
    RecipeDoc {
        content: "# 西红柿炒蛋\n\n## 必备原料\n\n* 西红柿\n* 鸡蛋 2个\n\n## 操作\n\n用炒锅。"
            .to_string(),
        category: "vegetable_dish".to_string(),
        dish_name: "西红柿炒蛋".to_string(),
    }
}

#[tokio::test]
async fn building_twice_yields_the_same_graph() {
    let store = Arc::new(MemoryGraphStore::new());
    let builder = GraphBuilder::new(Arc::clone(&store) as Arc<dyn GraphStore>);

    // the input itself repeats the recipe; the build runs twice on top
    let docs = vec![hongshaorou(), hongshaorou()];
    builder.build_from_documents(&docs).await.unwrap();
    let nodes_after_first = store.node_count();
    let edges_after_first = store.edge_count();

    builder.build_from_documents(&docs).await.unwrap();

    // 1 Dish + 3 Ingredients + 1 Category + 1 Cuisine + 2 Tools (锅, 炒锅)
    assert_eq!(store.node_count(), 8);
    assert_eq!(store.node_count(), nodes_after_first);
    // 3 Contains + 1 BelongsTo + 1 Cuisine + 2 UsesTool, deduped by merge
    assert_eq!(store.edge_count(), 7);
    assert_eq!(store.edge_count(), edges_after_first);
}

#[tokio::test]
async fn relational_query_retrieves_a_scored_subgraph() {
    let store = Arc::new(MemoryGraphStore::new());
    let builder = GraphBuilder::new(Arc::clone(&store) as Arc<dyn GraphStore>);
    builder
        .build_from_documents(&[hongshaorou(), fanqie_chaodan()])
        .await
        .unwrap();

    let retriever =
        GraphRetriever::new(GraphRetrieverConfig::default(), Arc::clone(&store) as _);
    let result = retriever.retrieve("西红柿和鸡蛋能做哪些菜？").await.unwrap();

    assert_eq!(result.strategy, Strategy::Graph);
    assert!(!result.documents.is_empty());
    assert!(result.documents.len() <= 10);
    // descending-score ordering with stable ties
    for pair in result.documents.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // the dish connected to both ingredients shows up
    assert!(result
        .documents
        .iter()
        .any(|d| d.content.contains("西红柿炒蛋")));
}

#[tokio::test]
async fn query_without_known_entities_returns_empty_not_error() {
    let store = Arc::new(MemoryGraphStore::new());
    let builder = GraphBuilder::new(Arc::clone(&store) as Arc<dyn GraphStore>);
    builder.build_from_documents(&[hongshaorou()]).await.unwrap();

    let retriever =
        GraphRetriever::new(GraphRetrieverConfig::default(), Arc::clone(&store) as _);
    let result = retriever.retrieve("量子力学的基本原理").await.unwrap();

    assert_eq!(result.strategy, Strategy::Graph);
    assert!(result.documents.is_empty());
}

#[tokio::test]
async fn neighbor_expansion_reports_graph_neighbor_strategy() {
    let store = Arc::new(MemoryGraphStore::new());
    let builder = GraphBuilder::new(Arc::clone(&store) as Arc<dyn GraphStore>);
    builder.build_from_documents(&[hongshaorou()]).await.unwrap();

    // the dish is the first node materialized
    let retriever =
        GraphRetriever::new(GraphRetrieverConfig::default(), Arc::clone(&store) as _);
    let result = retriever.expand("n0", 1).await.unwrap();

    assert_eq!(result.strategy, Strategy::GraphNeighbor);
    assert!(!result.documents.is_empty());
    assert!(result.documents.len() <= 50);
    for doc in &result.documents {
        assert!((doc.score - 0.9).abs() < 1e-6);
        assert_eq!(doc.metadata["type"], "neighbor");
    }
}
