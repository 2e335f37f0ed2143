//! Graph query (§4.9.1): bidirectional traversal with BFS-distance scoring.

use crate::common::ScoredNode;
use kdd_core::{EdgeType, GraphEdge, GraphNode, KddError, Result};
use kdd_graph::GraphStore;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Serialize)]
pub struct GraphQueryResult {
    pub center: GraphNode,
    pub related: Vec<ScoredNode>,
    pub edges: Vec<GraphEdge>,
    pub total_nodes: usize,
    pub total_edges: usize,
}

pub fn graph_query(
    graph: &GraphStore,
    root: &str,
    depth: usize,
    edge_types: Option<&[EdgeType]>,
    include_kinds: Option<&[String]>,
    respect_layers: bool,
) -> Result<GraphQueryResult> {
    let center = graph.get_node(root).ok_or_else(|| KddError::NodeNotFound(root.to_string()))?;
    let traversal = graph.traverse(root, depth, edge_types, respect_layers);
    let distances = bfs_distances(root, &traversal.edges);

    let mut related: Vec<ScoredNode> = traversal
        .nodes
        .into_iter()
        .filter(|n| n.id != root)
        .filter(|n| include_kinds.map(|ks| ks.iter().any(|k| k == &n.kind)).unwrap_or(true))
        .map(|n| {
            let distance = distances.get(&n.id).copied().unwrap_or(1);
            ScoredNode { node: n, score: 1.0 / (1.0 + distance as f64) }
        })
        .collect();
    related.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let total_nodes = related.len() + 1;
    let total_edges = traversal.edges.len();
    Ok(GraphQueryResult { center, related, edges: traversal.edges, total_nodes, total_edges })
}

/// Undirected BFS distance from `root` over the edges a traversal returned.
fn bfs_distances(root: &str, edges: &[GraphEdge]) -> HashMap<String, usize> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency.entry(&edge.from).or_default().push(&edge.to);
        adjacency.entry(&edge.to).or_default().push(&edge.from);
    }

    let mut distances = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(root);
    distances.insert(root.to_string(), 0);
    queue.push_back(root);

    while let Some(current) = queue.pop_front() {
        let current_distance = distances[current];
        for &neighbor in adjacency.get(current).into_iter().flatten() {
            if visited.insert(neighbor) {
                distances.insert(neighbor.to_string(), current_distance + 1);
                queue.push_back(neighbor);
            }
        }
    }
    distances
}
