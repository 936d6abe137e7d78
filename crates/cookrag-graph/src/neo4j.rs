//! Neo4j-backed GraphStore over `neo4rs`. All operations are
//! parameterized Cypher; node upserts MERGE by `name`, edges MERGE by
//! (endpoints, type), so re-running a build is idempotent.

use async_trait::async_trait;
use neo4rs::{query, Graph};
use std::time::Duration;
use tracing::{info, warn};

use cookrag_core::config::Neo4jConfig;
use cookrag_core::traits::GraphStore;
use cookrag_core::types::{GraphNode, GraphRelation, Metadata, Subgraph};
use cookrag_core::{Error, Result};

const OP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect and verify with a round-trip query.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let addr = config
            .uri
            .trim_start_matches("bolt://")
            .trim_start_matches("neo4j://")
            .to_string();

        info!(%addr, "connecting to neo4j");
        let graph = Graph::new(&addr, &config.username, &config.password)
            .await
            .map_err(Error::unavailable)?;

        let mut rows = graph
            .execute(query("RETURN 1 AS test"))
            .await
            .map_err(Error::unavailable)?;
        rows.next().await.map_err(Error::unavailable)?;
        info!("connected to neo4j");

        Ok(Self { graph })
    }
}

async fn with_deadline<T>(
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(OP_TIMEOUT, fut)
        .await
        .map_err(|_| Error::DeadlineExceeded)?
}

// Property values travel as strings; scalars keep their textual form.
fn prop_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn ensure_name_indexes(&self, labels: &[&str]) -> Result<()> {
        for label in labels {
            let cypher =
                format!("CREATE INDEX IF NOT EXISTS FOR (n:`{label}`) ON (n.name)");
            if let Err(err) = self.graph.run(query(&cypher)).await {
                // a missing index only costs lookup speed
                warn!(label, %err, "failed to create index");
            }
        }
        Ok(())
    }

    async fn merge_node(&self, label: &str, name: &str, props: &Metadata) -> Result<String> {
        with_deadline(async {
            let mut cypher = format!("MERGE (n:`{label}` {{name: $name}})");
            let mut params: Vec<(String, String)> = Vec::new();
            for (i, (key, value)) in props.iter().enumerate() {
                cypher.push_str(&format!(" SET n.`{key}` = $p{i}"));
                params.push((format!("p{i}"), prop_string(value)));
            }
            cypher.push_str(" RETURN elementId(n) AS id");

            let mut q = query(&cypher).param("name", name.to_string());
            for (key, value) in params {
                q = q.param(&key, value);
            }

            let mut rows = self.graph.execute(q).await.map_err(Error::unavailable)?;
            let row = rows
                .next()
                .await
                .map_err(Error::unavailable)?
                .ok_or_else(|| Error::Protocol("merge returned no node".to_string()))?;
            row.get::<String>("id")
                .map_err(|_| Error::Protocol("merge returned no id".to_string()))
        })
        .await
    }

    async fn merge_relation(
        &self,
        from_id: &str,
        to_id: &str,
        rel_type: &str,
        props: &Metadata,
    ) -> Result<()> {
        with_deadline(async {
            let mut cypher = format!(
                "MATCH (from), (to) \
                 WHERE elementId(from) = $from_id AND elementId(to) = $to_id \
                 MERGE (from)-[r:`{rel_type}`]->(to)"
            );
            let mut params: Vec<(String, String)> = Vec::new();
            for (i, (key, value)) in props.iter().enumerate() {
                cypher.push_str(&format!(" SET r.`{key}` = $p{i}"));
                params.push((format!("p{i}"), prop_string(value)));
            }

            let mut q = query(&cypher)
                .param("from_id", from_id.to_string())
                .param("to_id", to_id.to_string());
            for (key, value) in params {
                q = q.param(&key, value);
            }

            self.graph.run(q).await.map_err(Error::unavailable)
        })
        .await
    }

    async fn match_entities(&self, candidates: &[String], limit: usize) -> Result<Vec<String>> {
        with_deadline(async {
            let cypher = format!(
                "MATCH (e:Ingredient) WHERE e.name IN $candidates \
                 RETURN DISTINCT e.name AS name \
                 UNION \
                 MATCH (e:Dish) WHERE e.name IN $candidates \
                 RETURN DISTINCT e.name AS name \
                 UNION \
                 MATCH (e:Ingredient) \
                 WHERE any(part IN $candidates WHERE e.name CONTAINS part) \
                 RETURN DISTINCT e.name AS name \
                 UNION \
                 MATCH (e:Dish) \
                 WHERE any(part IN $candidates WHERE e.name CONTAINS part) \
                 RETURN DISTINCT e.name AS name \
                 LIMIT {limit}"
            );

            let mut rows = self
                .graph
                .execute(query(&cypher).param("candidates", candidates.to_vec()))
                .await
                .map_err(Error::unavailable)?;

            let mut names = Vec::new();
            while let Some(row) = rows.next().await.map_err(Error::unavailable)? {
                if let Ok(name) = row.get::<String>("name") {
                    names.push(name);
                }
            }
            Ok(names)
        })
        .await
    }

    async fn multi_hop(
        &self,
        entities: &[String],
        max_depth: usize,
        limit: usize,
    ) -> Result<Subgraph> {
        with_deadline(async {
            let cypher = format!(
                "MATCH path = (start)-[*1..{max_depth}]-(related) \
                 WHERE start.name IN $entities \
                 RETURN \
                    elementId(start) AS start_id, \
                    start.name AS start_name, \
                    labels(start) AS start_labels, \
                    elementId(related) AS related_id, \
                    related.name AS related_name, \
                    labels(related) AS related_labels, \
                    type(last(relationships(path))) AS relation_type \
                 LIMIT {limit}"
            );

            let mut rows = self
                .graph
                .execute(query(&cypher).param("entities", entities.to_vec()))
                .await
                .map_err(Error::unavailable)?;

            let mut subgraph = Subgraph::default();
            while let Some(row) = rows.next().await.map_err(Error::unavailable)? {
                let (Ok(start_id), Ok(related_id)) =
                    (row.get::<String>("start_id"), row.get::<String>("related_id"))
                else {
                    continue;
                };

                subgraph.nodes.push(GraphNode {
                    node_id: start_id.clone(),
                    name: row.get::<String>("start_name").unwrap_or_default(),
                    labels: row.get::<Vec<String>>("start_labels").unwrap_or_default(),
                    properties: Metadata::new(),
                });
                subgraph.nodes.push(GraphNode {
                    node_id: related_id.clone(),
                    name: row.get::<String>("related_name").unwrap_or_default(),
                    labels: row.get::<Vec<String>>("related_labels").unwrap_or_default(),
                    properties: Metadata::new(),
                });
                subgraph.relations.push(GraphRelation {
                    start_node_id: start_id,
                    end_node_id: related_id,
                    relation_type: row.get::<String>("relation_type").unwrap_or_default(),
                    properties: Metadata::new(),
                });
            }

            info!(
                nodes = subgraph.nodes.len(),
                relations = subgraph.relations.len(),
                "multi-hop search completed"
            );
            Ok(subgraph)
        })
        .await
    }

    async fn neighbors(&self, node_id: &str, depth: usize, limit: usize)
        -> Result<Vec<GraphNode>> {
        with_deadline(async {
            let cypher = format!(
                "MATCH (n)-[*1..{depth}]-(neighbor) \
                 WHERE elementId(n) = $node_id \
                 RETURN DISTINCT \
                    elementId(neighbor) AS node_id, \
                    neighbor.name AS name, \
                    labels(neighbor) AS labels \
                 LIMIT {limit}"
            );

            let mut rows = self
                .graph
                .execute(query(&cypher).param("node_id", node_id.to_string()))
                .await
                .map_err(Error::unavailable)?;

            let mut neighbors = Vec::new();
            while let Some(row) = rows.next().await.map_err(Error::unavailable)? {
                let Ok(id) = row.get::<String>("node_id") else { continue };
                neighbors.push(GraphNode {
                    node_id: id,
                    name: row.get::<String>("name").unwrap_or_default(),
                    labels: row.get::<Vec<String>>("labels").unwrap_or_default(),
                    properties: Metadata::new(),
                });
            }
            Ok(neighbors)
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .map_err(Error::unavailable)?;
        info!("graph cleared");
        Ok(())
    }
}
