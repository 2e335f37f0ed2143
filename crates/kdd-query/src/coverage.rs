//! Coverage query (§4.9.5): for each fixed rule of a node's kind, is there
//! at least one incident edge of the required type.

use kdd_core::{coverage_rules, KddError, Result};
use kdd_graph::GraphStore;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct CoverageCategory {
    pub name: String,
    pub description: String,
    pub status: String,
    pub found: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageResult {
    pub node_id: String,
    pub categories: Vec<CoverageCategory>,
    pub coverage_percent: f64,
}

pub fn coverage_query(graph: &GraphStore, node_id: &str) -> Result<CoverageResult> {
    let node = graph.get_node(node_id).ok_or_else(|| KddError::NodeNotFound(node_id.to_string()))?;
    let rules = coverage_rules(&node.kind).ok_or_else(|| KddError::UnknownKind(node.kind.clone()))?;

    let mut incident = graph.incoming_edges(node_id);
    incident.extend(graph.outgoing_edges(node_id));

    let mut categories = Vec::new();
    for (name, description, edge_type) in rules {
        let others: HashSet<String> = incident
            .iter()
            .filter(|e| e.edge_type == edge_type.as_str())
            .map(|e| if e.from == node_id { e.to.clone() } else { e.from.clone() })
            .collect();
        let status = if others.is_empty() { "missing" } else { "covered" };
        categories.push(CoverageCategory {
            name: name.to_string(),
            description: description.to_string(),
            status: status.to_string(),
            found: others.into_iter().collect(),
        });
    }

    let present = categories.iter().filter(|c| c.status == "covered").count();
    let total = categories.len();
    let coverage_percent = if total == 0 { 0.0 } else { (present as f64 / total as f64 * 1000.0).round() / 10.0 };

    Ok(CoverageResult { node_id: node_id.to_string(), categories, coverage_percent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{EdgeType, GraphEdge, GraphNode, JsonMap};

    fn node(id: &str, kind: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: kind.to_string(),
            source_path: format!("specs/{id}.md"),
            source_hash: "hash".to_string(),
            layer: "domain".to_string(),
            status: "draft".to_string(),
            aliases: vec![],
            domain: None,
            indexed_fields: JsonMap::new(),
            indexed_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn edge(from: &str, to: &str, edge_type: EdgeType) -> GraphEdge {
        GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type: edge_type.as_str().to_string(),
            source_path: format!("specs/{from}.md"),
            extraction_method: "structured".to_string(),
            metadata: JsonMap::new(),
            layer_violation: false,
            bidirectional: false,
        }
    }

    #[test]
    fn unknown_node_fails() {
        let graph = GraphStore::new();
        let err = coverage_query(&graph, "ENT:Missing").unwrap_err();
        assert!(matches!(err, KddError::NodeNotFound(_)));
    }

    #[test]
    fn unknown_kind_fails() {
        let graph = GraphStore::new();
        graph.load(vec![node("UIV:V", "ui-view")], vec![]);
        let err = coverage_query(&graph, "UIV:V").unwrap_err();
        assert!(matches!(err, KddError::UnknownKind(_)));
    }

    #[test]
    fn entity_with_one_emits_edge_is_one_third_covered() {
        let graph = GraphStore::new();
        graph.load(
            vec![node("ENT:E", "entity"), node("EVT:Shipped", "event")],
            vec![edge("ENT:E", "EVT:Shipped", EdgeType::Emits)],
        );
        let result = coverage_query(&graph, "ENT:E").unwrap();
        assert_eq!(result.categories.len(), 3);
        let events = result.categories.iter().find(|c| c.name == "events").unwrap();
        assert_eq!(events.status, "covered");
        assert_eq!(events.found, vec!["EVT:Shipped".to_string()]);
        let rules = result.categories.iter().find(|c| c.name == "business_rules").unwrap();
        assert_eq!(rules.status, "missing");
        assert_eq!(result.coverage_percent, 33.3);
    }
}
