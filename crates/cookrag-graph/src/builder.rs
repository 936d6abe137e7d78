//! Offline materialization of the deduplicated entity/relation set into
//! the graph store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use cookrag_core::traits::GraphStore;
use cookrag_core::Result;

use crate::extractor::{Entity, EntityType, RecipeExtractor, Relation};

/// One source document for graph construction.
#[derive(Debug, Clone)]
pub struct RecipeDoc {
    pub content: String,
    pub category: String,
    pub dish_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub dishes: usize,
    pub ingredients: usize,
    pub categories: usize,
    pub relations: usize,
    pub duration: Duration,
}

pub struct GraphBuilder {
    store: Arc<dyn GraphStore>,
    extractor: RecipeExtractor,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store, extractor: RecipeExtractor::new() }
    }

    /// Extract every document, deduplicate entities by (type, name) with
    /// last-writer-wins property merges, then upsert nodes and edges.
    /// Re-running over the same input is a no-op thanks to MERGE
    /// semantics in the store.
    pub async fn build_from_documents(&self, documents: &[RecipeDoc]) -> Result<BuildStats> {
        let start = Instant::now();
        info!(count = documents.len(), "starting knowledge graph construction");

        self.store
            .ensure_name_indexes(&["Dish", "Ingredient", "Category", "Cuisine", "Difficulty"])
            .await?;

        // Accumulate in first-seen order so the property merge order is
        // deterministic for a given input order.
        let mut entities: Vec<Entity> = Vec::new();
        let mut entity_slots: HashMap<(EntityType, String), usize> = HashMap::new();
        let mut relations: Vec<Relation> = Vec::new();

        for (i, doc) in documents.iter().enumerate() {
            if (i + 1) % 50 == 0 {
                info!(processed = i + 1, total = documents.len(), "extracting documents");
            }

            let extracted =
                self.extractor.extract(&doc.content, &doc.category, &doc.dish_name);

            for entity in extracted.entities {
                let key = (entity.entity_type, entity.name.clone());
                match entity_slots.get(&key) {
                    Some(&slot) => {
                        // last writer wins per property key
                        entities[slot].properties.extend(entity.properties);
                    }
                    None => {
                        entity_slots.insert(key, entities.len());
                        entities.push(entity);
                    }
                }
            }
            relations.extend(extracted.relations);
        }

        info!(count = entities.len(), "creating unique entities");
        let mut stats = BuildStats::default();
        let mut store_ids: HashMap<String, String> = HashMap::new();

        for entity in &entities {
            let node_id = match self
                .store
                .merge_node(entity.entity_type.label(), &entity.name, &entity.properties)
                .await
            {
                Ok(id) => id,
                Err(err) => {
                    warn!(name = %entity.name, %err, "failed to create node");
                    continue;
                }
            };
            store_ids.insert(entity.id.clone(), node_id);

            match entity.entity_type {
                EntityType::Dish => stats.dishes += 1,
                EntityType::Ingredient => stats.ingredients += 1,
                EntityType::Category => stats.categories += 1,
                _ => {}
            }
        }

        info!(count = relations.len(), "creating relations");
        for relation in &relations {
            let (Some(from_id), Some(to_id)) =
                (store_ids.get(&relation.from), store_ids.get(&relation.to))
            else {
                // an endpoint failed to materialize; drop the edge
                continue;
            };

            if let Err(err) = self
                .store
                .merge_relation(
                    from_id,
                    to_id,
                    relation.relation_type.label(),
                    &relation.properties,
                )
                .await
            {
                warn!(from = %relation.from, to = %relation.to, %err, "failed to create relation");
                continue;
            }
            stats.relations += 1;
        }

        stats.duration = start.elapsed();
        info!(
            dishes = stats.dishes,
            ingredients = stats.ingredients,
            categories = stats.categories,
            relations = stats.relations,
            duration_ms = stats.duration.as_millis() as u64,
            "knowledge graph built"
        );

        Ok(stats)
    }
}
