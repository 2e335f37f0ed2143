pub mod chunker;
pub mod embedding;
pub mod store;

pub use chunker::{chunk_document, ChunkConfig, DocumentContext};
pub use embedding::{build_embedding_records, Embedder};
pub use store::VectorStore;

#[cfg(feature = "http-embedder")]
pub use embedding::http::HttpEmbedder;
