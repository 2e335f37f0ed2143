//! Impact query (§4.9.4): direct predecessors, transitive predecessors via
//! reverse BFS, and BDD scenarios that should be rerun.

use kdd_core::{impact_description, EdgeType, GraphEdge, KddError, Result};
use kdd_graph::GraphStore;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct ImpactedNode {
    pub node_id: String,
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitiveImpact {
    pub node_id: String,
    pub kind: String,
    pub path: Vec<String>,
    pub edge_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRerun {
    pub node_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactResult {
    pub node_id: String,
    pub change_type: String,
    pub directly_affected: Vec<ImpactedNode>,
    pub transitively_affected: Vec<TransitiveImpact>,
    pub scenarios_to_rerun: Vec<ScenarioRerun>,
    pub total_directly: usize,
    pub total_transitively: usize,
}

pub fn impact_query(graph: &GraphStore, node_id: &str, change_type: &str, depth: usize) -> Result<ImpactResult> {
    if !graph.has_node(node_id) {
        return Err(KddError::NodeNotFound(node_id.to_string()));
    }

    let mut directly_affected = Vec::new();
    let mut seen_predecessors = HashSet::new();
    for edge in graph.incoming_edges(node_id) {
        if !seen_predecessors.insert(edge.from.clone()) {
            continue;
        }
        let Some(predecessor) = graph.get_node(&edge.from) else { continue };
        let Some(edge_type) = EdgeType::from_str(&edge.edge_type) else { continue };
        directly_affected.push(ImpactedNode {
            node_id: predecessor.id,
            kind: predecessor.kind,
            description: impact_description(&edge_type),
        });
    }

    let mut transitively_affected = Vec::new();
    if depth > 1 {
        for (node, path) in graph.reverse_traverse(node_id, depth) {
            if seen_predecessors.contains(&node.id) {
                continue;
            }
            let mut ids = vec![node_id.to_string()];
            ids.extend(path.iter().map(|e| e.from.clone()));
            let edge_types = path.iter().map(|e| e.edge_type.clone()).collect();
            transitively_affected.push(TransitiveImpact { node_id: node.id, kind: node.kind, path: ids, edge_types });
        }
    }

    let mut affected: HashSet<String> = seen_predecessors;
    affected.extend(transitively_affected.iter().map(|t| t.node_id.clone()));
    affected.insert(node_id.to_string());

    let mut scenarios_to_rerun = Vec::new();
    for edge in all_validates_edges(graph) {
        if affected.contains(&edge.to) {
            scenarios_to_rerun.push(ScenarioRerun {
                node_id: edge.from.clone(),
                reason: format!("Validates {} which is affected", edge.to),
            });
        }
    }

    let total_directly = directly_affected.len();
    let total_transitively = transitively_affected.len();
    Ok(ImpactResult {
        node_id: node_id.to_string(),
        change_type: change_type.to_string(),
        directly_affected,
        transitively_affected,
        scenarios_to_rerun,
        total_directly,
        total_transitively,
    })
}

fn all_validates_edges(graph: &GraphStore) -> Vec<GraphEdge> {
    graph.all_edges().into_iter().filter(|e| e.edge_type == "VALIDATES").collect()
}
