use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form JSON value used for front-matter and extractor-specific fields.
/// Carried through I/O verbatim rather than typed, per the open key/value
/// nature of front-matter and per-kind indexed fields.
pub type JsonMap = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    /// `prefix(kind) + ":" + document_id`, globally unique.
    pub id: String,
    pub kind: String,
    pub source_path: String,
    pub source_hash: String,
    pub layer: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub indexed_fields: JsonMap,
    pub indexed_at: String,
}

fn default_status() -> String {
    "draft".to_string()
}

impl GraphNode {
    /// Best-effort human title: `title` indexed field, falling back to the
    /// document id portion of `id`.
    pub fn title(&self) -> String {
        if let Some(serde_json::Value::String(title)) = self.indexed_fields.get("title") {
            return title.clone();
        }
        self.document_id().to_string()
    }

    pub fn document_id(&self) -> &str {
        self.id.split_once(':').map(|(_, rest)| rest).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeType {
    WikiLink,
    DomainRelation,
    EntityRule,
    EntityPolicy,
    Emits,
    Consumes,
    UcAppliesRule,
    UcExecutesCmd,
    UcStory,
    ViewTriggersUseCase,
    ViewUsesComponent,
    ComponentUsesEntity,
    RequirementTracesTo,
    Validates,
    DecidesFor,
    CrossDomainRef,
    GlossaryDefines,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::WikiLink => "WIKI_LINK",
            EdgeType::DomainRelation => "DOMAIN_RELATION",
            EdgeType::EntityRule => "ENTITY_RULE",
            EdgeType::EntityPolicy => "ENTITY_POLICY",
            EdgeType::Emits => "EMITS",
            EdgeType::Consumes => "CONSUMES",
            EdgeType::UcAppliesRule => "UC_APPLIES_RULE",
            EdgeType::UcExecutesCmd => "UC_EXECUTES_CMD",
            EdgeType::UcStory => "UC_STORY",
            EdgeType::ViewTriggersUseCase => "VIEW_TRIGGERS_USE_CASE",
            EdgeType::ViewUsesComponent => "VIEW_USES_COMPONENT",
            EdgeType::ComponentUsesEntity => "COMPONENT_USES_ENTITY",
            EdgeType::RequirementTracesTo => "REQ_TRACES_TO",
            EdgeType::Validates => "VALIDATES",
            EdgeType::DecidesFor => "DECIDES_FOR",
            EdgeType::CrossDomainRef => "CROSS_DOMAIN_REF",
            EdgeType::GlossaryDefines => "GLOSSARY_DEFINES",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "WIKI_LINK" => EdgeType::WikiLink,
            "DOMAIN_RELATION" => EdgeType::DomainRelation,
            "ENTITY_RULE" => EdgeType::EntityRule,
            "ENTITY_POLICY" => EdgeType::EntityPolicy,
            "EMITS" => EdgeType::Emits,
            "CONSUMES" => EdgeType::Consumes,
            "UC_APPLIES_RULE" => EdgeType::UcAppliesRule,
            "UC_EXECUTES_CMD" => EdgeType::UcExecutesCmd,
            "UC_STORY" => EdgeType::UcStory,
            "VIEW_TRIGGERS_USE_CASE" => EdgeType::ViewTriggersUseCase,
            "VIEW_USES_COMPONENT" => EdgeType::ViewUsesComponent,
            "COMPONENT_USES_ENTITY" => EdgeType::ComponentUsesEntity,
            "REQ_TRACES_TO" => EdgeType::RequirementTracesTo,
            "VALIDATES" => EdgeType::Validates,
            "DECIDES_FOR" => EdgeType::DecidesFor,
            "CROSS_DOMAIN_REF" => EdgeType::CrossDomainRef,
            "GLOSSARY_DEFINES" => EdgeType::GlossaryDefines,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    pub source_path: String,
    pub extraction_method: String,
    #[serde(default)]
    pub metadata: JsonMap,
    #[serde(default)]
    pub layer_violation: bool,
    #[serde(default)]
    pub bidirectional: bool,
}

impl GraphEdge {
    pub fn dedup_key(&self) -> (String, String, String) {
        (self.from.clone(), self.to.clone(), self.edge_type.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub level: u8,
    pub body: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub heading: String,
    pub raw_content: String,
    pub context_content: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: String,
    pub document_id: String,
    pub kind: String,
    pub section_path: String,
    pub chunk_index: usize,
    pub raw_text: String,
    pub context_text: String,
    pub vector: Vec<f32>,
    pub model: String,
    pub dimensions: usize,
    pub text_hash: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexLevel {
    L1,
    L2,
    L3,
}

impl IndexLevel {
    pub fn determine(has_encoder: bool, has_agent_api: bool) -> Self {
        if has_encoder && has_agent_api {
            IndexLevel::L3
        } else if has_encoder {
            IndexLevel::L2
        } else {
            IndexLevel::L1
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestStats {
    pub nodes: usize,
    pub edges: usize,
    pub embeddings: usize,
    pub enrichments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: String,
    pub kdd_version: String,
    pub embedding_model: Option<String>,
    pub dimensions: Option<usize>,
    pub indexed_at: String,
    pub indexer: String,
    pub structure: String,
    pub index_level: IndexLevel,
    pub stats: ManifestStats,
    pub domains: Vec<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
}
