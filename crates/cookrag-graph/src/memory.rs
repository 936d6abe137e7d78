//! In-memory GraphStore: adjacency lists plus a (label, name) index.
//! The test substitute for a Neo4j deployment; traversal semantics match
//! the Cypher the Neo4j adapter runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use cookrag_core::traits::GraphStore;
use cookrag_core::types::{GraphNode, GraphRelation, Metadata, Subgraph};
use cookrag_core::{Error, Result};

#[derive(Default)]
pub struct MemoryGraphStore {
    inner: RwLock<GraphData>,
}

#[derive(Default)]
struct GraphData {
    nodes: Vec<StoredNode>,
    by_label_name: HashMap<(String, String), usize>,
    edges: Vec<StoredEdge>,
}

struct StoredNode {
    label: String,
    name: String,
    props: Metadata,
}

struct StoredEdge {
    from: usize,
    to: usize,
    rel_type: String,
    props: Metadata,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().unwrap().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().unwrap().edges.len()
    }
}

fn node_id(index: usize) -> String {
    format!("n{index}")
}

fn parse_node_id(id: &str) -> Result<usize> {
    id.strip_prefix('n')
        .and_then(|rest| rest.parse().ok())
        .ok_or_else(|| Error::InvalidInput(format!("unknown node id {id}")))
}

impl GraphData {
    fn to_graph_node(&self, index: usize) -> GraphNode {
        let node = &self.nodes[index];
        GraphNode {
            node_id: node_id(index),
            name: node.name.clone(),
            labels: vec![node.label.clone()],
            properties: node.props.clone(),
        }
    }

    fn adjacent(&self, index: usize) -> Vec<(usize, &StoredEdge)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.from == index {
                    Some((edge.to, edge))
                } else if edge.to == index {
                    Some((edge.from, edge))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn ensure_name_indexes(&self, _labels: &[&str]) -> Result<()> {
        // the (label, name) map is the index
        Ok(())
    }

    async fn merge_node(&self, label: &str, name: &str, props: &Metadata) -> Result<String> {
        let mut data = self.inner.write().unwrap();
        let key = (label.to_string(), name.to_string());
        let existing = data.by_label_name.get(&key).copied();
        if let Some(index) = existing {
            data.nodes[index].props.extend(props.clone());
            return Ok(node_id(index));
        }

        let index = data.nodes.len();
        data.nodes.push(StoredNode {
            label: label.to_string(),
            name: name.to_string(),
            props: props.clone(),
        });
        data.by_label_name.insert(key, index);
        Ok(node_id(index))
    }

    async fn merge_relation(
        &self,
        from_id: &str,
        to_id: &str,
        rel_type: &str,
        props: &Metadata,
    ) -> Result<()> {
        let from = parse_node_id(from_id)?;
        let to = parse_node_id(to_id)?;

        let mut data = self.inner.write().unwrap();
        if from >= data.nodes.len() || to >= data.nodes.len() {
            return Err(Error::InvalidInput("relation endpoint does not exist".to_string()));
        }

        if let Some(edge) = data
            .edges
            .iter_mut()
            .find(|e| e.from == from && e.to == to && e.rel_type == rel_type)
        {
            edge.props.extend(props.clone());
            return Ok(());
        }

        data.edges.push(StoredEdge {
            from,
            to,
            rel_type: rel_type.to_string(),
            props: props.clone(),
        });
        Ok(())
    }

    async fn match_entities(&self, candidates: &[String], limit: usize) -> Result<Vec<String>> {
        let data = self.inner.read().unwrap();
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for node in &data.nodes {
            if node.label != "Ingredient" && node.label != "Dish" {
                continue;
            }
            let hit = candidates
                .iter()
                .any(|c| node.name == *c || node.name.contains(c.as_str()));
            if hit && seen.insert(node.name.clone()) {
                matches.push(node.name.clone());
                if matches.len() >= limit {
                    break;
                }
            }
        }
        Ok(matches)
    }

    async fn multi_hop(
        &self,
        entities: &[String],
        max_depth: usize,
        limit: usize,
    ) -> Result<Subgraph> {
        let data = self.inner.read().unwrap();
        let mut subgraph = Subgraph::default();

        let starts: Vec<usize> = data
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| entities.iter().any(|e| &n.name == e))
            .map(|(i, _)| i)
            .collect();

        // One row per (start, reached) pair: both endpoints plus the last
        // edge of the path, exactly what the Cypher traversal reports.
        'outer: for &start in &starts {
            let mut visited = HashSet::from([start]);
            let mut frontier = VecDeque::from([(start, 0usize)]);

            while let Some((current, depth)) = frontier.pop_front() {
                if depth >= max_depth {
                    continue;
                }
                for (next, edge) in data.adjacent(current) {
                    if !visited.insert(next) {
                        continue;
                    }
                    subgraph.nodes.push(data.to_graph_node(start));
                    subgraph.nodes.push(data.to_graph_node(next));
                    subgraph.relations.push(GraphRelation {
                        start_node_id: node_id(start),
                        end_node_id: node_id(next),
                        relation_type: edge.rel_type.clone(),
                        properties: Metadata::new(),
                    });
                    if subgraph.relations.len() >= limit {
                        break 'outer;
                    }
                    frontier.push_back((next, depth + 1));
                }
            }
        }

        Ok(subgraph)
    }

    async fn neighbors(&self, node_id_str: &str, depth: usize, limit: usize)
        -> Result<Vec<GraphNode>> {
        let index = parse_node_id(node_id_str)?;
        let data = self.inner.read().unwrap();
        if index >= data.nodes.len() {
            return Err(Error::InvalidInput(format!("unknown node id {node_id_str}")));
        }

        let mut visited = HashSet::from([index]);
        let mut frontier = VecDeque::from([(index, 0usize)]);
        let mut neighbors = Vec::new();

        while let Some((current, d)) = frontier.pop_front() {
            if d >= depth {
                continue;
            }
            for (next, _) in data.adjacent(current) {
                if !visited.insert(next) {
                    continue;
                }
                neighbors.push(data.to_graph_node(next));
                if neighbors.len() >= limit {
                    return Ok(neighbors);
                }
                frontier.push_back((next, d + 1));
            }
        }
        Ok(neighbors)
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.inner.write().unwrap();
        *data = GraphData::default();
        Ok(())
    }
}
