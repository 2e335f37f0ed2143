//! The index command pipeline (§4.8): one source file in, artifact writes
//! and a result summary out.
//!
//! Grounded on `codegraph-cli`'s `index` command, generalized from a
//! tree-sitter parse-and-embed pipeline to the markdown route/extract/chunk
//! pipeline this spec describes.

use crate::artifact::ArtifactStore;
use crate::extractors::{self, ExtractorInput};
use kdd_core::{route, Kind, Layer, Result};
use kdd_parser::markdown;
use kdd_vector::{chunk_document, ChunkConfig, DocumentContext, Embedder};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Outcome of indexing a single source file.
#[derive(Debug, Clone)]
pub struct IndexResult {
    pub success: bool,
    pub node_id: Option<String>,
    pub edge_count: usize,
    pub embedding_count: usize,
    pub skipped_reason: Option<String>,
    pub warning: Option<String>,
}

impl IndexResult {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            node_id: None,
            edge_count: 0,
            embedding_count: 0,
            skipped_reason: Some(reason.into()),
            warning: None,
        }
    }
}

/// Index one source file: parse, route, extract, persist, and (if an
/// encoder is supplied) chunk and embed. `indexed_at` is the caller-supplied
/// timestamp (callers pass a single timestamp for the whole run so every
/// node in a batch shares it).
pub async fn index_document(
    store: &ArtifactStore,
    source_path: &Path,
    content: &[u8],
    indexed_at: &str,
    embedder: Option<&dyn Embedder>,
) -> Result<IndexResult> {
    let path_str = source_path.to_string_lossy().to_string();
    let text = String::from_utf8_lossy(content).to_string();
    let parsed = markdown::parse(&text);

    let (kind, route_warning) = route(Some(&parsed.front_matter), &path_str);
    let Some(kind) = kind else {
        return Ok(IndexResult::skipped("no recognized kind in front-matter"));
    };

    let layer = Layer::detect_from_path(&path_str).unwrap_or(Layer::Domain);
    let document_id = document_id_from_front_matter(&parsed.front_matter).unwrap_or_else(|| document_id_from_path(source_path));
    let source_hash = hash_bytes(content);

    let input = ExtractorInput {
        document_id: &document_id,
        source_path: &path_str,
        source_hash: &source_hash,
        layer,
        front_matter: &parsed.front_matter,
        sections: &parsed.sections,
        indexed_at,
    };
    let (node, edges) = extractors::extract(kind, &input);

    store.write_node(&node)?;
    store.append_edges(&edges)?;

    let mut embedding_count = 0;
    if let Some(embedder) = embedder {
        embedding_count = embed_document(store, kind, &document_id, layer, &parsed.sections, embedder).await?;
    }

    Ok(IndexResult {
        success: true,
        node_id: Some(node.id),
        edge_count: edges.len(),
        embedding_count,
        skipped_reason: None,
        warning: route_warning,
    })
}

async fn embed_document(
    store: &ArtifactStore,
    kind: Kind,
    document_id: &str,
    layer: Layer,
    sections: &[kdd_core::Section],
    embedder: &dyn Embedder,
) -> Result<usize> {
    let ctx = DocumentContext { document_id, kind, layer, title: None };
    let chunks = chunk_document(&ctx, sections, ChunkConfig::default());
    if chunks.is_empty() {
        store.write_embeddings(kind.as_str(), document_id, &[])?;
        return Ok(0);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.context_content.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    let embeddings = kdd_vector::build_embedding_records(kind.as_str(), document_id, &chunks, vectors, embedder.model_name())?;
    store.write_embeddings(kind.as_str(), document_id, &embeddings)?;
    Ok(embeddings.len())
}

/// `documentId` per §4.8 step 8 / §4.4: front-matter `id` wins when present,
/// the file stem is only a fallback for documents that omit it.
fn document_id_from_front_matter(front_matter: &kdd_core::JsonMap) -> Option<String> {
    match front_matter.get("id") {
        Some(serde_json::Value::String(id)) if !id.is_empty() => Some(id.clone()),
        _ => None,
    }
}

fn document_id_from_path(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_string()
}

fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
