//! Shared helpers across the six query kinds: embedding-to-node resolution,
//! kind/layer filtering, and a scored-node type used by graph and semantic
//! queries alike.

use kdd_core::{GraphNode, ALL_KINDS};
use kdd_graph::GraphStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredNode {
    pub node: GraphNode,
    pub score: f64,
}

/// An embedding/chunk id is `<documentId>:chunk-<n>`. Strip the chunk
/// suffix (or everything after the first colon if the id has no chunk
/// marker) to recover the document id, then try every known kind prefix
/// until one resolves to an existing node.
pub fn resolve_node_for_chunk_id(graph: &GraphStore, chunk_id: &str) -> Option<GraphNode> {
    let document_id = document_id_from_chunk_id(chunk_id);
    ALL_KINDS
        .iter()
        .find_map(|kind| graph.get_node(&format!("{}:{}", kind.node_id_prefix(), document_id)))
}

fn document_id_from_chunk_id(id: &str) -> &str {
    if let Some((document_id, _)) = id.split_once(":chunk-") {
        return document_id;
    }
    id.split_once(':').map(|(document_id, _)| document_id).unwrap_or(id)
}

pub fn passes_filters(node: &GraphNode, include_kinds: Option<&[String]>, include_layers: Option<&[String]>) -> bool {
    if let Some(kinds) = include_kinds {
        if !kinds.iter().any(|k| k == &node.kind) {
            return false;
        }
    }
    if let Some(layers) = include_layers {
        if !layers.iter().any(|l| l == &node.layer) {
            return false;
        }
    }
    true
}
