//! In-memory directed multigraph over `GraphNode`/`GraphEdge`.
//!
//! The store is rebuilt wholesale by `load()` on every program start (or
//! reindex) and treated as read-only during serving, mirroring the
//! single-writer/many-reader shape the teacher crate uses for its cached
//! graph views, but without a backing database: everything here lives in
//! `DashMap`s guarded for interior mutability only during `load`.

use dashmap::DashMap;
use kdd_core::{EdgeType, GraphEdge, GraphNode};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: DashMap<String, GraphNode>,
    edges: RwLock<Vec<GraphEdge>>,
    outgoing: DashMap<String, Vec<usize>>,
    incoming: DashMap<String, Vec<usize>>,
}

/// Result of a bidirectional or reverse traversal.
#[derive(Debug, Default, Clone)]
pub struct TraversalResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe and insert. Edges whose endpoints are not present, or that
    /// duplicate an existing `(from, to, edge_type)` key, are dropped.
    pub fn load(&self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        self.nodes.clear();
        self.outgoing.clear();
        self.incoming.clear();

        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(edges.len());
        for edge in edges {
            if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
                continue;
            }
            let key = format!("{}\u{0}{}\u{0}{}", edge.from, edge.to, edge.edge_type);
            if !seen.insert(key) {
                continue;
            }
            kept.push(edge);
        }

        for (idx, edge) in kept.iter().enumerate() {
            self.outgoing.entry(edge.from.clone()).or_default().push(idx);
            self.incoming.entry(edge.to.clone()).or_default().push(idx);
        }

        *self.edges.write() = kept;
    }

    pub fn get_node(&self, id: &str) -> Option<GraphNode> {
        self.nodes.get(id).map(|n| n.clone())
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn all_nodes(&self) -> Vec<GraphNode> {
        self.nodes.iter().map(|e| e.value().clone()).collect()
    }

    pub fn all_edges(&self) -> Vec<GraphEdge> {
        self.edges.read().clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.read().len()
    }

    pub fn outgoing_edges(&self, node_id: &str) -> Vec<GraphEdge> {
        let edges = self.edges.read();
        self.outgoing
            .get(node_id)
            .map(|idxs| idxs.iter().map(|i| edges[*i].clone()).collect())
            .unwrap_or_default()
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<GraphEdge> {
        let edges = self.edges.read();
        self.incoming
            .get(node_id)
            .map(|idxs| idxs.iter().map(|i| edges[*i].clone()).collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring scan. The searched text per node is its
    /// stringified indexed fields (all of them, or only those named in
    /// `fields`), plus the node id and all aliases.
    pub fn text_search(&self, query: &str, fields: Option<&[String]>) -> Vec<GraphNode> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|entry| node_matches(entry.value(), &needle, fields))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Bidirectional breadth-first exploration from `root` up to `depth`
    /// hops (inclusive). Visits outgoing and incoming edges from every
    /// frontier node; `edge_types`, when set, restricts which edge types are
    /// followed; `respect_layers` skips edges flagged as layer-violating.
    pub fn traverse(
        &self,
        root: &str,
        depth: usize,
        edge_types: Option<&[EdgeType]>,
        respect_layers: bool,
    ) -> TraversalResult {
        let mut visited_ids = Vec::new();
        let mut visited_set = HashSet::new();
        let mut edge_seen = HashSet::new();
        let mut result_edges = Vec::new();

        if !self.has_node(root) {
            return TraversalResult::default();
        }

        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((root.to_string(), 0));
        visited_set.insert(root.to_string());
        visited_ids.push(root.to_string());

        while let Some((current, dist)) = queue.pop_front() {
            if dist >= depth {
                continue;
            }
            let mut neighbors = self.outgoing_edges(&current);
            neighbors.extend(self.incoming_edges(&current));

            for edge in neighbors {
                if !edge_type_allowed(&edge, edge_types) {
                    continue;
                }
                if respect_layers && edge.layer_violation {
                    continue;
                }
                let key = edge.dedup_key();
                let key = format!("{}\u{0}{}\u{0}{}", key.0, key.1, key.2);
                if edge_seen.insert(key) {
                    result_edges.push(edge.clone());
                }

                let other = if edge.from == current { &edge.to } else { &edge.from };
                if visited_set.insert(other.clone()) {
                    visited_ids.push(other.clone());
                    queue.push_back((other.clone(), dist + 1));
                }
            }
        }

        let nodes = visited_ids
            .into_iter()
            .filter_map(|id| self.get_node(&id))
            .collect();

        TraversalResult { nodes, edges: result_edges }
    }

    /// Follows only incoming edges, recording the reversed edge path taken
    /// to reach each discovered predecessor. Returns every predecessor
    /// other than the root.
    pub fn reverse_traverse(&self, root: &str, depth: usize) -> Vec<(GraphNode, Vec<GraphEdge>)> {
        if !self.has_node(root) {
            return Vec::new();
        }

        let mut results = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(root.to_string());

        let mut queue: VecDeque<(String, usize, Vec<GraphEdge>)> = VecDeque::new();
        queue.push_back((root.to_string(), 0, Vec::new()));

        while let Some((current, dist, path)) = queue.pop_front() {
            if dist >= depth {
                continue;
            }
            for edge in self.incoming_edges(&current) {
                if visited.contains(&edge.from) {
                    continue;
                }
                visited.insert(edge.from.clone());
                let mut new_path = path.clone();
                new_path.push(edge.clone());

                if let Some(node) = self.get_node(&edge.from) {
                    results.push((node, new_path.clone()));
                }
                queue.push_back((edge.from.clone(), dist + 1, new_path));
            }
        }

        results
    }

    /// All edges flagged as layer-violating.
    pub fn find_violations(&self) -> Vec<GraphEdge> {
        self.edges
            .read()
            .iter()
            .filter(|e| e.layer_violation)
            .cloned()
            .collect()
    }
}

fn edge_type_allowed(edge: &GraphEdge, edge_types: Option<&[EdgeType]>) -> bool {
    match edge_types {
        None => true,
        Some(types) => {
            let Some(et) = EdgeType::from_str(&edge.edge_type) else { return false };
            types.contains(&et)
        }
    }
}

fn node_matches(node: &GraphNode, needle: &str, fields: Option<&[String]>) -> bool {
    if node.id.to_lowercase().contains(needle) {
        return true;
    }
    if node.aliases.iter().any(|a| a.to_lowercase().contains(needle)) {
        return true;
    }

    match fields {
        Some(names) => names.iter().any(|name| {
            node.indexed_fields
                .get(name)
                .map(|v| stringify(v).to_lowercase().contains(needle))
                .unwrap_or(false)
        }),
        None => node
            .indexed_fields
            .values()
            .any(|v| stringify(v).to_lowercase().contains(needle)),
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::JsonMap;
    use serde_json::json;

    fn node(id: &str, layer: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: "entity".to_string(),
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

    fn edge(from: &str, to: &str, edge_type: EdgeType, violation: bool) -> GraphEdge {
        GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type: edge_type.as_str().to_string(),
            source_path: format!("specs/{from}.md"),
            extraction_method: "wikilink".to_string(),
            metadata: JsonMap::new(),
            layer_violation: violation,
            bidirectional: true,
        }
    }

    #[test]
    fn load_drops_edges_with_missing_endpoints() {
        let store = GraphStore::new();
        store.load(vec![node("A", "domain")], vec![edge("A", "B", EdgeType::WikiLink, false)]);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn load_dedups_edges_by_from_to_type() {
        let store = GraphStore::new();
        let nodes = vec![node("A", "domain"), node("B", "domain")];
        let edges = vec![
            edge("A", "B", EdgeType::WikiLink, false),
            edge("A", "B", EdgeType::WikiLink, false),
        ];
        store.load(nodes, edges);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn depth_zero_returns_only_root() {
        let store = GraphStore::new();
        let nodes = vec![node("A", "domain"), node("B", "domain")];
        let edges = vec![edge("A", "B", EdgeType::WikiLink, false)];
        store.load(nodes, edges);
        let result = store.traverse("A", 0, None, true);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].id, "A");
    }

    #[test]
    fn respect_layers_excludes_violating_edges_both_directions() {
        let store = GraphStore::new();
        let nodes = vec![node("A", "domain"), node("B", "behavior"), node("C", "domain")];
        let edges = vec![
            edge("A", "B", EdgeType::WikiLink, true),
            edge("C", "A", EdgeType::WikiLink, false),
        ];
        store.load(nodes, edges);
        let result = store.traverse("A", 2, None, true);
        let ids: Vec<_> = result.nodes.iter().map(|n| n.id.clone()).collect();
        assert!(ids.contains(&"C".to_string()));
        assert!(!ids.contains(&"B".to_string()));
    }

    #[test]
    fn find_violations_returns_flagged_edges_only() {
        let store = GraphStore::new();
        let nodes = vec![node("A", "domain"), node("B", "behavior")];
        let edges = vec![edge("A", "B", EdgeType::WikiLink, true)];
        store.load(nodes, edges);
        assert_eq!(store.find_violations().len(), 1);
    }

    #[test]
    fn reverse_traverse_excludes_root_and_records_path() {
        let store = GraphStore::new();
        let nodes = vec![node("A", "domain"), node("B", "domain"), node("C", "domain")];
        let edges = vec![
            edge("B", "A", EdgeType::EntityRule, false),
            edge("C", "B", EdgeType::EntityRule, false),
        ];
        store.load(nodes, edges);
        let result = store.reverse_traverse("A", 3);
        let ids: Vec<_> = result.iter().map(|(n, _)| n.id.clone()).collect();
        assert_eq!(ids, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(result[1].1.len(), 2);
    }

    #[test]
    fn text_search_matches_id_alias_and_indexed_fields() {
        let store = GraphStore::new();
        let mut n = node("ENT:Order", "domain");
        n.indexed_fields.insert("description".to_string(), json!("An impact analysis subject"));
        store.load(vec![n], vec![]);
        let results = store.text_search("impact analysis", None);
        assert_eq!(results.len(), 1);
    }
}
