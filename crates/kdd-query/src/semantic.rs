//! Semantic query (§4.9.2): pure vector search resolved back to nodes.

use crate::common::{passes_filters, resolve_node_for_chunk_id, ScoredNode};
use kdd_core::{KddError, Result};
use kdd_graph::GraphStore;
use kdd_vector::{Embedder, VectorStore};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct SemanticQueryResult {
    pub results: Vec<ScoredNode>,
    pub warnings: Vec<String>,
}

pub async fn semantic_query(
    graph: &GraphStore,
    vectors: &VectorStore,
    embedder: &dyn Embedder,
    query_text: &str,
    include_kinds: Option<&[String]>,
    include_layers: Option<&[String]>,
    min_score: f64,
    limit: usize,
) -> Result<SemanticQueryResult> {
    let trimmed = query_text.trim();
    if trimmed.chars().count() < 3 {
        return Err(KddError::QueryTooShort);
    }

    let vectors_out = embedder.embed(&[trimmed.to_string()]).await?;
    let query_vector: Vec<f64> = vectors_out.into_iter().next().unwrap_or_default().into_iter().map(|v| v as f64).collect();

    let hits = vectors.search(&query_vector, 3 * limit, min_score);

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for (chunk_id, score) in hits {
        let Some(node) = resolve_node_for_chunk_id(graph, &chunk_id) else { continue };
        if !seen.insert(node.id.clone()) {
            continue;
        }
        if !passes_filters(&node, include_kinds, include_layers) {
            continue;
        }
        results.push(ScoredNode { node, score });
        if results.len() >= limit {
            break;
        }
    }

    Ok(SemanticQueryResult { results, warnings: Vec::new() })
}
