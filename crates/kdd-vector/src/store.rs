//! Brute-force cosine similarity search over a contiguous vector pool.
//!
//! Grounded on `codegraph-vector::search`'s free-function `cosine_similarity`,
//! generalized into a store that owns the pool instead of scoring against an
//! externally supplied index. No approximate index (FAISS/ANN) is carried
//! over: the spec only requires `O(n*d)` exhaustive search.

use kdd_core::Embedding;
use std::cmp::Ordering;

#[derive(Debug, Default)]
pub struct VectorStore {
    ids: Vec<String>,
    vectors: Vec<Vec<f64>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replace the pool wholesale. Vectors are widened to `f64` for the
    /// similarity math, matching the spec's "double-precision vectors"
    /// requirement even though stored `Embedding`s are `f32`.
    pub fn load(&mut self, embeddings: &[Embedding]) {
        self.ids = embeddings.iter().map(|e| e.id.clone()).collect();
        self.vectors = embeddings
            .iter()
            .map(|e| e.vector.iter().map(|v| *v as f64).collect())
            .collect();
    }

    /// Cosine-similarity top-k search. Returns `(embedding_id, score)` pairs
    /// sorted by descending score. A zero-norm query, a `limit` of zero, or a
    /// `min_score` above every candidate's similarity all yield an empty
    /// result.
    pub fn search(&self, query: &[f64], limit: usize, min_score: f64) -> Vec<(String, f64)> {
        if limit == 0 {
            return Vec::new();
        }
        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut scored: Vec<(String, f64)> = self
            .ids
            .iter()
            .zip(self.vectors.iter())
            .filter_map(|(id, vector)| {
                let score = cosine_similarity(query, vector, query_norm);
                if score.is_nan() || score < min_score {
                    None
                } else {
                    Some((id.clone(), score))
                }
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn cosine_similarity(query: &[f64], candidate: &[f64], query_norm: f64) -> f64 {
    let candidate_norm = norm(candidate);
    if candidate_norm == 0.0 {
        return f64::NAN;
    }
    let dot: f64 = query.iter().zip(candidate.iter()).map(|(a, b)| a * b).sum();
    dot / (query_norm * candidate_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::Embedding;

    fn embedding(id: &str, vector: Vec<f32>) -> Embedding {
        Embedding {
            id: id.to_string(),
            document_id: "Doc".to_string(),
            kind: "entity".to_string(),
            section_path: "description".to_string(),
            chunk_index: 0,
            raw_text: String::new(),
            context_text: String::new(),
            vector,
            model: "test".to_string(),
            dimensions: 0,
            text_hash: String::new(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn ranks_by_cosine_similarity() {
        let mut store = VectorStore::new();
        store.load(&[
            embedding("a", vec![1.0, 0.0]),
            embedding("b", vec![0.0, 1.0]),
            embedding("c", vec![1.0, 1.0]),
        ]);
        let results = store.search(&[1.0, 0.0], 10, 0.0);
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_norm_query_returns_none() {
        let mut store = VectorStore::new();
        store.load(&[embedding("a", vec![1.0, 0.0])]);
        assert!(store.search(&[0.0, 0.0], 10, 0.0).is_empty());
    }

    #[test]
    fn limit_zero_returns_none() {
        let mut store = VectorStore::new();
        store.load(&[embedding("a", vec![1.0, 0.0])]);
        assert!(store.search(&[1.0, 0.0], 0, 0.0).is_empty());
    }

    #[test]
    fn min_score_above_max_similarity_returns_none() {
        let mut store = VectorStore::new();
        store.load(&[embedding("a", vec![1.0, 0.0])]);
        assert!(store.search(&[1.0, 0.0], 10, 1.5).is_empty());
    }

    #[test]
    fn zero_norm_candidate_is_discarded_not_matched() {
        let mut store = VectorStore::new();
        store.load(&[embedding("zero", vec![0.0, 0.0]), embedding("a", vec![1.0, 0.0])]);
        let results = store.search(&[1.0, 0.0], 10, -1.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn truncates_to_limit() {
        let mut store = VectorStore::new();
        store.load(&[
            embedding("a", vec![1.0, 0.0]),
            embedding("b", vec![0.9, 0.1]),
            embedding("c", vec![0.8, 0.2]),
        ]);
        let results = store.search(&[1.0, 0.0], 2, -1.0);
        assert_eq!(results.len(), 2);
    }
}
