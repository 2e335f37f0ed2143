//! Embedding adapter boundary and embedding-record construction.
//!
//! Grounded on `codegraph-vector::providers`' trait-per-backend shape; we
//! keep a single trait since the spec names exactly one encoder call rather
//! than a provider registry.

use chrono::Utc;
use kdd_core::{Chunk, Embedding, KddError, Result};
use sha2::{Digest, Sha256};

/// Encodes a batch of texts into fixed-length float vectors. Implementations
/// wrap a local model, an HTTP provider, or (in tests) a deterministic stub.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier persisted on every `Embedding` produced from this
    /// encoder's output, e.g. `"text-embedding-3-small"`.
    fn model_name(&self) -> &str;
}

/// Build `Embedding` records for a batch of chunks and their freshly encoded
/// vectors. `vectors[i]` must correspond to `chunks[i].context_content`.
pub fn build_embedding_records(
    kind: &str,
    document_id: &str,
    chunks: &[Chunk],
    vectors: Vec<Vec<f32>>,
    model: &str,
) -> Result<Vec<Embedding>> {
    if chunks.len() != vectors.len() {
        return Err(KddError::Configuration(format!(
            "encoder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let generated_at = Utc::now().to_rfc3339();
    Ok(chunks
        .iter()
        .zip(vectors.into_iter())
        .map(|(chunk, vector)| {
            let dimensions = vector.len();
            Embedding {
                id: chunk.id.clone(),
                document_id: document_id.to_string(),
                kind: kind.to_string(),
                section_path: chunk.heading.clone(),
                chunk_index: index_from_chunk_id(&chunk.id),
                raw_text: chunk.raw_content.clone(),
                context_text: chunk.context_content.clone(),
                vector,
                model: model.to_string(),
                dimensions,
                text_hash: text_hash(&chunk.raw_content),
                generated_at: generated_at.clone(),
            }
        })
        .collect())
}

fn index_from_chunk_id(id: &str) -> usize {
    id.rsplit_once("chunk-")
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(0)
}

fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(feature = "http-embedder")]
pub mod http {
    use super::Embedder;
    use kdd_core::{KddError, Result};
    use serde::{Deserialize, Serialize};

    /// An OpenAI-compatible `/embeddings` HTTP adapter, the shape the
    /// teacher's `codegraph-ai` reaches for when talking to hosted and
    /// self-hosted (Ollama/LM Studio) providers alike.
    pub struct HttpEmbedder {
        client: reqwest::Client,
        endpoint: String,
        model: String,
        api_key: Option<String>,
    }

    impl HttpEmbedder {
        pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
            Self { client: reqwest::Client::new(), endpoint: endpoint.into(), model: model.into(), api_key }
        }
    }

    #[derive(Serialize)]
    struct EmbeddingRequest<'a> {
        input: &'a [String],
        model: &'a str,
    }

    #[derive(Deserialize)]
    struct EmbeddingResponse {
        data: Vec<EmbeddingDatum>,
    }

    #[derive(Deserialize)]
    struct EmbeddingDatum {
        embedding: Vec<f32>,
    }

    #[async_trait::async_trait]
    impl Embedder for HttpEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest { input: texts, model: &self.model });
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            let response = request
                .send()
                .await
                .map_err(|e| KddError::Configuration(format!("embedding request failed: {e}")))?
                .error_for_status()
                .map_err(|e| KddError::Configuration(format!("embedding provider error: {e}")))?;
            let parsed: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| KddError::Configuration(format!("malformed embedding response: {e}")))?;
            Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::Chunk;

    fn chunk(id: &str, heading: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "Doc".to_string(),
            heading: heading.to_string(),
            raw_content: "hello world".to_string(),
            context_content: "Document: Doc\n\nhello world".to_string(),
            offset: 0,
        }
    }

    #[test]
    fn builds_embedding_records_with_matching_index() {
        let chunks = vec![chunk("Doc:chunk-0", "Description"), chunk("Doc:chunk-1", "Description")];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let records = build_embedding_records("entity", "Doc", &chunks, vectors, "test-model").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chunk_index, 0);
        assert_eq!(records[1].chunk_index, 1);
        assert_eq!(records[0].dimensions, 2);
        assert!(!records[0].text_hash.is_empty());
    }

    #[test]
    fn mismatched_vector_count_is_an_error() {
        let chunks = vec![chunk("Doc:chunk-0", "Description")];
        let vectors = vec![vec![1.0], vec![2.0]];
        assert!(build_embedding_records("entity", "Doc", &chunks, vectors, "test-model").is_err());
    }
}
