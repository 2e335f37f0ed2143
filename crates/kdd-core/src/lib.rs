pub mod config;
pub mod domain;
pub mod error;
pub mod types;

pub use config::Settings;
pub use domain::{
    coverage_rules, impact_description, is_layer_violation, layer_of_target, reserved_prefixes,
    resolve_target_id, route, FrontMatter, Kind, Layer, ALL_KINDS, RESERVED_PREFIXES,
};
pub use error::{KddError, Result};
pub use types::{
    Chunk, Embedding, EdgeType, GraphEdge, GraphNode, IndexLevel, JsonMap, Manifest, ManifestStats,
    Section,
};
