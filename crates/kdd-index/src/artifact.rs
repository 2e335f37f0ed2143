//! On-disk artifact tree (§6): `manifest.json`, `nodes/<kind>/<id>.json`,
//! `edges/edges.jsonl`, `embeddings/<kind>/<id>.json`.
//!
//! Grounded on `codegraph-graph`'s RocksDB column-family layout, generalized
//! here to a plain JSON file tree since the spec drops the embedded-database
//! requirement in favor of a format a developer can `cat` and diff.

use kdd_core::{Embedding, GraphEdge, GraphNode, KddError, Manifest, Result};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    fn node_path(&self, kind: &str, document_id: &str) -> PathBuf {
        self.root.join("nodes").join(kind).join(format!("{document_id}.json"))
    }

    fn edges_path(&self) -> PathBuf {
        self.root.join("edges").join("edges.jsonl")
    }

    fn embeddings_path(&self, kind: &str, document_id: &str) -> PathBuf {
        self.root.join("embeddings").join(kind).join(format!("{document_id}.json"))
    }

    pub fn read_manifest(&self) -> Result<Option<Manifest>> {
        read_json_opt(&self.manifest_path())
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        write_json(&self.manifest_path(), manifest)
    }

    pub fn write_node(&self, node: &GraphNode) -> Result<()> {
        write_json(&self.node_path(&node.kind, node.document_id()), node)
    }

    pub fn delete_node(&self, kind: &str, document_id: &str) -> Result<()> {
        remove_if_exists(&self.node_path(kind, document_id))
    }

    /// Load every `nodes/<kind>/<id>.json` file under the tree.
    pub fn read_all_nodes(&self) -> Result<Vec<GraphNode>> {
        let nodes_dir = self.root.join("nodes");
        if !nodes_dir.exists() {
            return Ok(Vec::new());
        }
        let mut nodes = Vec::new();
        for kind_dir in fs::read_dir(&nodes_dir)? {
            let kind_dir = kind_dir?.path();
            if !kind_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&kind_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    nodes.push(read_json(&path)?);
                }
            }
        }
        Ok(nodes)
    }

    /// Append edges to `edges/edges.jsonl`, creating the file (and parent
    /// directory) if it does not exist yet.
    pub fn append_edges(&self, edges: &[GraphEdge]) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let path = self.edges_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        for edge in edges {
            let line = serde_json::to_string(edge)?;
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    pub fn clear_edges(&self) -> Result<()> {
        let path = self.edges_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::File::create(&path)?;
        Ok(())
    }

    pub fn read_all_edges(&self) -> Result<Vec<GraphEdge>> {
        let path = self.edges_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(KddError::from))
            .collect()
    }

    /// Replace the embeddings file for `(kind, documentId)` wholesale — a
    /// reindex of a document always supersedes its prior chunk set.
    pub fn write_embeddings(&self, kind: &str, document_id: &str, embeddings: &[Embedding]) -> Result<()> {
        write_json(&self.embeddings_path(kind, document_id), embeddings)
    }

    pub fn delete_embeddings(&self, kind: &str, document_id: &str) -> Result<()> {
        remove_if_exists(&self.embeddings_path(kind, document_id))
    }

    pub fn read_all_embeddings(&self) -> Result<Vec<Embedding>> {
        let dir = self.root.join("embeddings");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut embeddings = Vec::new();
        for kind_dir in fs::read_dir(&dir)? {
            let kind_dir = kind_dir?.path();
            if !kind_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&kind_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    let mut batch: Vec<Embedding> = read_json(&path)?;
                    embeddings.append(&mut batch);
                }
            }
        }
        Ok(embeddings)
    }

    /// Remove everything a prior index run produced for one document: its
    /// node file, its embeddings file, and any edge whose `from`/`to` names
    /// it (§6).
    pub fn delete_document_artifacts(&self, kind: &str, document_id: &str) -> Result<()> {
        self.delete_node(kind, document_id)?;
        self.delete_embeddings(kind, document_id)?;
        if let Some(node_id) = kdd_core::Kind::from_str(kind).map(|k| format!("{}:{document_id}", k.node_id_prefix())) {
            self.strip_edges_touching(&node_id)?;
        }
        Ok(())
    }

    /// Rewrite `edges.jsonl` without any line whose `from`/`to` equals
    /// `node_id`.
    fn strip_edges_touching(&self, node_id: &str) -> Result<()> {
        let remaining: Vec<GraphEdge> =
            self.read_all_edges()?.into_iter().filter(|e| e.from != node_id && e.to != node_id).collect();
        self.clear_edges()?;
        self.append_edges(&remaining)
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(KddError::from)
}

fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_json(path)?))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
