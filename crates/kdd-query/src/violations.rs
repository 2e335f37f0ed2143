//! Layer-violation query (§4.9.6): every edge already flagged during
//! extraction, filtered and summarized as a violation rate.

use kdd_core::GraphNode;
use kdd_graph::GraphStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ViolationRecord {
    pub from: String,
    pub to: String,
    pub from_layer: String,
    pub to_layer: String,
    pub edge_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationsResult {
    pub violations: Vec<ViolationRecord>,
    pub rate: f64,
}

pub fn violations_query(graph: &GraphStore, include_kinds: Option<&[String]>, include_layers: Option<&[String]>) -> ViolationsResult {
    let total_edges = graph.edge_count();

    let mut violations = Vec::new();
    for edge in graph.find_violations() {
        let from_node = graph.get_node(&edge.from);
        let to_node = graph.get_node(&edge.to);
        let matches = from_node.as_ref().map(|n| endpoint_matches(n, include_kinds, include_layers)).unwrap_or(false)
            || to_node.as_ref().map(|n| endpoint_matches(n, include_kinds, include_layers)).unwrap_or(false);
        if !matches {
            continue;
        }
        let (Some(from_node), Some(to_node)) = (from_node, to_node) else { continue };
        violations.push(ViolationRecord {
            from: edge.from,
            to: edge.to,
            from_layer: from_node.layer,
            to_layer: to_node.layer,
            edge_type: edge.edge_type,
        });
    }

    let rate = if total_edges == 0 {
        0.0
    } else {
        (10000.0 * violations.len() as f64 / total_edges as f64).round() / 100.0
    };

    ViolationsResult { violations, rate }
}

fn endpoint_matches(node: &GraphNode, include_kinds: Option<&[String]>, include_layers: Option<&[String]>) -> bool {
    let kind_ok = include_kinds.map(|ks| ks.iter().any(|k| k == &node.kind)).unwrap_or(true);
    let layer_ok = include_layers.map(|ls| ls.iter().any(|l| l == &node.layer)).unwrap_or(true);
    kind_ok && layer_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{EdgeType, GraphEdge, JsonMap};

    fn node(id: &str, kind: &str, layer: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: kind.to_string(),
            source_path: format!("specs/{id}.md"),
            source_hash: "hash".to_string(),
            layer: layer.to_string(),
            status: "draft".to_string(),
            aliases: vec![],
            domain: None,
            indexed_fields: JsonMap::new(),
            indexed_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn edge(from: &str, to: &str, violation: bool) -> GraphEdge {
        GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type: EdgeType::WikiLink.as_str().to_string(),
            source_path: format!("specs/{from}.md"),
            extraction_method: "wikilink".to_string(),
            metadata: JsonMap::new(),
            layer_violation: violation,
            bidirectional: true,
        }
    }

    #[test]
    fn rate_is_zero_with_no_edges() {
        let graph = GraphStore::new();
        let result = violations_query(&graph, None, None);
        assert_eq!(result.rate, 0.0);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn one_violation_out_of_two_edges_is_fifty_percent() {
        let graph = GraphStore::new();
        graph.load(
            vec![node("ENT:A", "entity", "domain"), node("UC:B", "use-case", "behavior"), node("ENT:C", "entity", "domain")],
            vec![edge("ENT:A", "UC:B", true), edge("ENT:A", "ENT:C", false)],
        );
        let result = violations_query(&graph, None, None);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.rate, 50.0);
    }

    #[test]
    fn include_kinds_restricts_to_matching_endpoint() {
        let graph = GraphStore::new();
        graph.load(
            vec![node("ENT:A", "entity", "domain"), node("UC:B", "use-case", "behavior")],
            vec![edge("ENT:A", "UC:B", true)],
        );
        let result = violations_query(&graph, Some(&["glossary".to_string()]), None);
        assert!(result.violations.is_empty());
    }
}
