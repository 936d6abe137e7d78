use std::fs;
use tempfile::TempDir;

use cookrag_core::config::Config;
use cookrag_core::loader::{RecipeLoader, TextLoader};

#[test]
fn config_defaults_without_file() {
    let config = Config::load("does-not-exist.yaml").expect("load");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.vector.collection_name, "cookrag_documents");
    assert_eq!(config.vector.top_k, 10);
    assert!((config.router.complexity_threshold - 0.5).abs() < 1e-9);
    assert!(config.router.enable_graph_rag);
}

#[test]
fn config_expands_env_placeholders() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.yaml");
    fs::write(
        &path,
        "embedding:\n  provider: zhipu\n  api_key: ${COOKRAG_TEST_KEY}\nserver:\n  port: 9090\n",
    )
    .unwrap();

    std::env::set_var("COOKRAG_TEST_KEY", "sk-test-value");
    let config = Config::load(&path).expect("load");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.embedding.api_key, "sk-test-value");
    std::env::remove_var("COOKRAG_TEST_KEY");
}

#[test]
fn recipe_loader_formats_documents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("recipes.json");
    fs::write(
        &path,
        r#"[{"name":"红烧肉","ingredients":["五花肉","酱油","糖"],"steps":["切块","炖煮"],"category":"肉菜","cuisine":"家常菜","tags":["经典"]}]"#,
    )
    .unwrap();

    let docs = RecipeLoader::new(&path).load().expect("load");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "recipe_0");
    assert!(docs[0].content.contains("菜名：红烧肉"));
    assert!(docs[0].content.contains("五花肉"));
    assert_eq!(docs[0].metadata["category"], "肉菜");
}

#[test]
fn text_loader_filters_by_extension() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.md"), "红烧肉做法").unwrap();
    fs::write(tmp.path().join("b.txt"), "ignored").unwrap();

    let docs = TextLoader::new(tmp.path(), &["md"]).load().expect("load");
    assert_eq!(docs.len(), 1);
    assert!(docs[0].content.contains("红烧肉"));
}
