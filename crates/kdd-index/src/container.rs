//! Wires the graph and vector stores together from an artifact tree at
//! startup, and swaps them wholesale after a reindex (§5).
//!
//! Grounded on `codegraph-api::state::AppState`'s `Arc`-wrapped service
//! handles shared across async handlers.

use crate::artifact::ArtifactStore;
use kdd_core::{IndexLevel, Result};
use kdd_graph::GraphStore;
use kdd_vector::VectorStore;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Holds the in-memory graph and vector stores for one index tree. Queries
/// take a cloned `Arc` so a concurrent reindex can swap both stores without
/// blocking readers already holding a snapshot.
pub struct Container {
    graph: RwLock<Arc<GraphStore>>,
    vectors: RwLock<Arc<VectorStore>>,
    index_level: RwLock<IndexLevel>,
}

impl Container {
    pub fn empty() -> Self {
        Self {
            graph: RwLock::new(Arc::new(GraphStore::new())),
            vectors: RwLock::new(Arc::new(VectorStore::new())),
            index_level: RwLock::new(IndexLevel::L1),
        }
    }

    /// Load an artifact tree from disk into fresh in-memory stores.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let store = ArtifactStore::new(root.as_ref());
        let nodes = store.read_all_nodes()?;
        let edges = store.read_all_edges()?;
        let embeddings = store.read_all_embeddings()?;

        let graph = GraphStore::new();
        graph.load(nodes, edges);

        let mut vectors = VectorStore::new();
        vectors.load(&embeddings);

        let manifest = store.read_manifest()?;
        let index_level = manifest.map(|m| m.index_level).unwrap_or(IndexLevel::L1);

        Ok(Self {
            graph: RwLock::new(Arc::new(graph)),
            vectors: RwLock::new(Arc::new(vectors)),
            index_level: RwLock::new(index_level),
        })
    }

    pub fn graph(&self) -> Arc<GraphStore> {
        self.graph.read().clone()
    }

    pub fn vectors(&self) -> Arc<VectorStore> {
        self.vectors.read().clone()
    }

    pub fn index_level(&self) -> IndexLevel {
        *self.index_level.read()
    }

    /// Replace both stores after a reindex run. Readers holding an `Arc`
    /// obtained before the swap keep reading the pre-swap snapshot.
    pub fn swap(&self, graph: GraphStore, vectors: VectorStore, index_level: IndexLevel) {
        *self.graph.write() = Arc::new(graph);
        *self.vectors.write() = Arc::new(vectors);
        *self.index_level.write() = index_level;
    }
}
