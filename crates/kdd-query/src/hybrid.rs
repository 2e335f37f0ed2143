//! Hybrid query (§4.9.3): the primary search surface, fusing lexical,
//! semantic and graph-expansion evidence into one ranked result list.

use crate::common::{passes_filters, resolve_node_for_chunk_id};
use kdd_core::{GraphEdge, KddError, Result};
use kdd_graph::GraphStore;
use kdd_vector::{Embedder, VectorStore};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Evidence {
    semantic: f64,
    lexical: f64,
    graph: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HybridHit {
    pub node_id: String,
    pub kind: String,
    pub snippet: String,
    pub score: f64,
    pub match_source: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HybridQueryResult {
    pub results: Vec<HybridHit>,
    pub edges: Vec<GraphEdge>,
    pub warnings: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
pub async fn hybrid_query(
    graph: &GraphStore,
    vectors: &VectorStore,
    embedder: Option<&dyn Embedder>,
    query_text: &str,
    expand_graph: bool,
    depth: usize,
    include_kinds: Option<&[String]>,
    include_layers: Option<&[String]>,
    respect_layers: bool,
    min_score: f64,
    limit: usize,
    max_tokens: usize,
) -> Result<HybridQueryResult> {
    let trimmed = query_text.trim();
    if trimmed.chars().count() < 3 {
        return Err(KddError::QueryTooShort);
    }

    let mut warnings = Vec::new();
    let mut evidence: HashMap<String, Evidence> = HashMap::new();

    // 1. Semantic phase.
    match embedder {
        Some(embedder) => {
            let vectors_out = embedder.embed(&[trimmed.to_string()]).await?;
            let query_vector: Vec<f64> =
                vectors_out.into_iter().next().unwrap_or_default().into_iter().map(|v| v as f64).collect();
            let hits = vectors.search(&query_vector, 3 * limit, min_score * 0.8);
            for (chunk_id, score) in hits {
                let Some(node) = resolve_node_for_chunk_id(graph, &chunk_id) else { continue };
                let entry = evidence.entry(node.id).or_default();
                entry.semantic = entry.semantic.max(score);
            }
        }
        None => warnings.push("NO_EMBEDDINGS".to_string()),
    }

    // 2. Lexical phase.
    for node in graph.text_search(trimmed, None) {
        if !passes_filters(&node, include_kinds, include_layers) {
            continue;
        }
        evidence.entry(node.id).or_default().lexical = 0.5;
    }

    // 3. Graph expansion.
    let mut collected_edges: HashMap<(String, String, String), GraphEdge> = HashMap::new();
    if expand_graph {
        let seeds: Vec<String> = evidence.keys().cloned().collect();
        for seed in seeds {
            if !graph.has_node(&seed) {
                continue;
            }
            let traversal = graph.traverse(&seed, depth, None, respect_layers);
            for edge in traversal.edges {
                collected_edges.entry(edge.dedup_key()).or_insert(edge);
            }
            for node in traversal.nodes {
                if node.id == seed {
                    continue;
                }
                if !passes_filters(&node, include_kinds, include_layers) {
                    continue;
                }
                evidence.entry(node.id).or_default().graph = 0.5;
            }
        }
    }

    // 4. Fusion.
    let mut hits = Vec::new();
    for (node_id, scores) in &evidence {
        let Some(node) = graph.get_node(node_id) else { continue };
        if !passes_filters(&node, include_kinds, include_layers) {
            continue;
        }

        let sources = [scores.semantic > 0.0, scores.graph > 0.0, scores.lexical > 0.0]
            .into_iter()
            .filter(|b| *b)
            .count();
        let raw = 0.6 * scores.semantic + 0.3 * scores.graph + 0.1 * scores.lexical + 0.1 * (sources as f64 - 1.0).max(0.0);
        let score = (raw / 1.2).min(1.0);
        if score < min_score {
            continue;
        }

        let match_source = if scores.semantic > 0.0 && scores.graph > 0.0 {
            "fusion"
        } else if scores.semantic > 0.0 {
            "semantic"
        } else if scores.graph > 0.0 {
            "graph"
        } else {
            "lexical"
        };

        let snippet = format!("[{}] {}", node.kind, node.title());
        hits.push(HybridHit { node_id: node.id.clone(), kind: node.kind.clone(), snippet, score, match_source: match_source.to_string() });
    }

    // 5. Ordering and token budget.
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let mut results = Vec::new();
    let mut spent_tokens = 0usize;
    for (idx, hit) in hits.into_iter().enumerate() {
        if results.len() >= limit {
            break;
        }
        let tokens = (hit.snippet.len() / 4).max(1);
        if idx > 0 && spent_tokens + tokens > max_tokens {
            break;
        }
        spent_tokens += tokens;
        results.push(hit);
    }

    let edges: Vec<GraphEdge> = collected_edges.into_values().collect();
    Ok(HybridQueryResult { results, edges, warnings })
}
