use thiserror::Error;

/// Error kinds surfaced across the knowledge-graph core.
///
/// Indexing failures are not represented here: a document that fails to
/// route or extract is reported as a skipped result (see `kdd-index`), never
/// as an error. This enum only covers failures a caller must react to:
/// malformed queries, unknown lookups, and I/O/serialization problems from
/// the artifact tree.
#[derive(Error, Debug)]
pub enum KddError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("front-matter parse error: {0}")]
    FrontMatter(String),

    #[error("query text too short: must be at least 3 characters after trimming")]
    QueryTooShort,

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("kind has no coverage rules: {0}")]
    UnknownKind(String),

    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, KddError>;
