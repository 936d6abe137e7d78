//! Brute-force in-memory vector store. The substitute for an external
//! ANN deployment in tests and fully offline runs; implements the same
//! collection/insert/search surface.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use cookrag_core::traits::VectorStore;
use cookrag_core::types::VectorHit;
use cookrag_core::{Error, Result};

#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

struct Collection {
    dim: usize,
    rows: Vec<Row>,
}

struct Row {
    id: i64,
    vector: Vec<f32>,
    text: String,
    metadata: serde_json::Value,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().unwrap().contains_key(name))
    }

    async fn create_collection(&self, name: &str, dim: usize) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if collections.contains_key(name) {
            return Err(Error::InvalidInput(format!("collection {name} already exists")));
        }
        collections.insert(name.to_string(), Collection { dim, rows: Vec::new() });
        Ok(())
    }

    async fn create_index(
        &self,
        _collection: &str,
        _field: &str,
        _index_type: &str,
        _params: &HashMap<String, String>,
    ) -> Result<()> {
        // brute-force scan; nothing to build
        Ok(())
    }

    async fn load_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn insert(
        &self,
        name: &str,
        ids: &[i64],
        vectors: &[Vec<f32>],
        texts: &[String],
        metadata: &[serde_json::Value],
    ) -> Result<()> {
        if ids.len() != vectors.len() || ids.len() != texts.len() || ids.len() != metadata.len() {
            return Err(Error::InvalidInput("insert column lengths differ".to_string()));
        }

        let mut collections = self.collections.write().unwrap();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown collection {name}")))?;

        for i in 0..ids.len() {
            if vectors[i].len() != collection.dim {
                return Err(Error::InvalidInput(format!(
                    "vector dimension {} != collection dimension {}",
                    vectors[i].len(),
                    collection.dim
                )));
            }
            collection.rows.push(Row {
                id: ids[i],
                vector: vectors[i].clone(),
                text: texts[i].clone(),
                metadata: metadata[i].clone(),
            });
        }
        Ok(())
    }

    async fn flush(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vectors: &[Vec<f32>],
        _field: &str,
        _output_fields: &[&str],
        top_k: usize,
    ) -> Result<Vec<VectorHit>> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown collection {name}")))?;

        let mut hits = Vec::new();
        for query in vectors {
            if query.len() != collection.dim {
                return Err(Error::InvalidInput(format!(
                    "query dimension {} != collection dimension {}",
                    query.len(),
                    collection.dim
                )));
            }

            let mut scored: Vec<(f32, &Row)> = collection
                .rows
                .iter()
                .map(|row| (l2_distance(query, &row.vector), row))
                .collect();
            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(top_k);

            // report a similarity so higher is always better
            for (dist, row) in scored {
                hits.push(VectorHit {
                    id: row.id,
                    score: 1.0 / (1.0 + dist),
                    text: row.text.clone(),
                    metadata: row.metadata.clone(),
                });
            }
        }
        Ok(hits)
    }

    async fn stats(&self, name: &str) -> Result<HashMap<String, String>> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown collection {name}")))?;
        Ok(HashMap::from([
            ("row_count".to_string(), collection.rows.len().to_string()),
            ("dim".to_string(), collection.dim.to_string()),
        ]))
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.collections.write().unwrap().remove(name);
        Ok(())
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
