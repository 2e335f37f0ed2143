//! Pure domain rules: kind routing, embeddable-section policy, layer
//! detection and the layer-violation predicate. No I/O, no state.

use crate::types::{EdgeType, JsonMap};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Requirements = 0,
    Domain = 1,
    Behavior = 2,
    Experience = 3,
    Verification = 4,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Requirements => "requirements",
            Layer::Domain => "domain",
            Layer::Behavior => "behavior",
            Layer::Experience => "experience",
            Layer::Verification => "verification",
        }
    }

    pub fn numeric(&self) -> u8 {
        *self as u8
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "requirements" => Layer::Requirements,
            "domain" => Layer::Domain,
            "behavior" => Layer::Behavior,
            "experience" => Layer::Experience,
            "verification" => Layer::Verification,
            _ => return None,
        })
    }

    /// Path-prefix → layer table. The first matching numeric segment in the
    /// path wins, e.g. `specs/01-domain/entities/X.md` -> `Domain`.
    pub fn detect_from_path(path: &str) -> Option<Self> {
        const PREFIXES: &[(&str, Layer)] = &[
            ("00-requirements", Layer::Requirements),
            ("01-domain", Layer::Domain),
            ("02-behavior", Layer::Behavior),
            ("03-experience", Layer::Experience),
            ("04-verification", Layer::Verification),
        ];
        for (prefix, layer) in PREFIXES {
            if path.contains(prefix) {
                return Some(*layer);
            }
        }
        None
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Entity,
    Event,
    BusinessRule,
    BusinessPolicy,
    CrossPolicy,
    Command,
    Query,
    Process,
    UseCase,
    UiView,
    UiComponent,
    Requirement,
    Objective,
    Prd,
    Adr,
    Glossary,
}

pub const ALL_KINDS: &[Kind] = &[
    Kind::Entity,
    Kind::Event,
    Kind::BusinessRule,
    Kind::BusinessPolicy,
    Kind::CrossPolicy,
    Kind::Command,
    Kind::Query,
    Kind::Process,
    Kind::UseCase,
    Kind::UiView,
    Kind::UiComponent,
    Kind::Requirement,
    Kind::Objective,
    Kind::Prd,
    Kind::Adr,
    Kind::Glossary,
];

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Entity => "entity",
            Kind::Event => "event",
            Kind::BusinessRule => "business-rule",
            Kind::BusinessPolicy => "business-policy",
            Kind::CrossPolicy => "cross-policy",
            Kind::Command => "command",
            Kind::Query => "query",
            Kind::Process => "process",
            Kind::UseCase => "use-case",
            Kind::UiView => "ui-view",
            Kind::UiComponent => "ui-component",
            Kind::Requirement => "requirement",
            Kind::Objective => "objective",
            Kind::Prd => "prd",
            Kind::Adr => "adr",
            Kind::Glossary => "glossary",
        }
    }

    /// Lower-cased, trimmed `kind` front-matter value -> `Kind`.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        ALL_KINDS.iter().copied().find(|k| k.as_str() == normalized)
    }

    pub fn node_id_prefix(&self) -> &'static str {
        match self {
            Kind::Entity => "ENT",
            Kind::Event => "EVT",
            Kind::BusinessRule => "BR",
            Kind::BusinessPolicy => "BP",
            Kind::CrossPolicy => "XP",
            Kind::Command => "CMD",
            Kind::Query => "QRY",
            Kind::Process => "PROC",
            Kind::UseCase => "UC",
            Kind::UiView => "UIV",
            Kind::UiComponent => "UIC",
            Kind::Requirement => "REQ",
            Kind::Objective => "OBJ",
            Kind::Prd => "PRD",
            Kind::Adr => "ADR",
            Kind::Glossary => "GLOS",
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Kind::Requirement | Kind::Objective | Kind::Prd | Kind::Adr => Layer::Requirements,
            Kind::Entity
            | Kind::Event
            | Kind::BusinessRule
            | Kind::BusinessPolicy
            | Kind::CrossPolicy
            | Kind::Glossary => Layer::Domain,
            Kind::Command | Kind::Query | Kind::Process | Kind::UseCase => Layer::Behavior,
            Kind::UiView | Kind::UiComponent => Layer::Experience,
        }
    }

    /// Expected source-path prefix, relative to the specs root, used by
    /// `route()` to warn about misplaced documents.
    pub fn expected_path_prefix(&self) -> &'static str {
        match self {
            Kind::Requirement => "00-requirements/requirements/",
            Kind::Objective => "00-requirements/objectives/",
            Kind::Prd => "00-requirements/prd/",
            Kind::Adr => "00-requirements/adr/",
            Kind::Entity => "01-domain/entities/",
            Kind::Event => "01-domain/events/",
            Kind::BusinessRule => "01-domain/business-rules/",
            Kind::BusinessPolicy => "01-domain/business-policies/",
            Kind::CrossPolicy => "01-domain/cross-policies/",
            Kind::Glossary => "01-domain/glossary/",
            Kind::Command => "02-behavior/commands/",
            Kind::Query => "02-behavior/queries/",
            Kind::Process => "02-behavior/processes/",
            Kind::UseCase => "02-behavior/use-cases/",
            Kind::UiView => "03-experience/views/",
            Kind::UiComponent => "03-experience/components/",
        }
    }

    /// Section headings (lower-case, bilingual synonyms) whose bodies become
    /// indexed fields. Synonyms map to a single canonical field name.
    pub fn indexed_sections(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Kind::Entity => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("attributes", &["attributes", "atributos"]),
                ("relations", &["relations", "relationships", "relaciones"]),
                ("invariants", &["invariants", "constraints", "invariantes", "restricciones"]),
                ("lifecycle", &["lifecycle", "state machine", "ciclo de vida", "máquina de estados"]),
                ("lifecycle_events", &["lifecycle events", "eventos de ciclo de vida"]),
            ],
            Kind::Event => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("payload", &["payload"]),
                ("producer", &["producer", "productor"]),
                ("consumers", &["consumers", "consumidores"]),
            ],
            Kind::BusinessRule => &[
                ("declaration", &["declaration", "declaración", "declaracion"]),
                ("when_applies", &["when applies", "cuándo aplica", "cuando aplica"]),
                ("why_it_exists", &["why it exists", "por qué existe", "por que existe"]),
                ("violation", &["violation", "violación", "violacion"]),
                ("examples", &["examples", "ejemplos"]),
            ],
            Kind::BusinessPolicy => &[
                ("declaration", &["declaration", "declaración", "declaracion"]),
                ("when_applies", &["when applies", "cuándo aplica", "cuando aplica"]),
                ("parameters", &["parameters", "parámetros", "parametros"]),
                ("violation", &["violation", "violación", "violacion"]),
            ],
            Kind::CrossPolicy => &[
                ("purpose", &["purpose", "propósito", "proposito"]),
                ("declaration", &["declaration", "declaración", "declaracion"]),
                ("ears", &["ears formalization", "formalización ears", "formalizacion ears"]),
                ("standard_behavior", &["standard behavior", "comportamiento estándar", "comportamiento estandar"]),
            ],
            Kind::Command => &[
                ("purpose", &["purpose", "propósito", "proposito"]),
                ("input", &["input", "entrada"]),
                ("preconditions", &["preconditions", "precondiciones"]),
                ("postconditions", &["postconditions", "postcondiciones"]),
                ("possible_errors", &["possible errors", "errores posibles"]),
            ],
            Kind::Query => &[
                ("purpose", &["purpose", "propósito", "proposito"]),
                ("input", &["input", "entrada"]),
                ("output", &["output", "salida"]),
                ("possible_errors", &["possible errors", "errores posibles"]),
            ],
            Kind::Process => &[
                ("participants", &["participants", "participantes"]),
                ("steps", &["steps", "pasos"]),
                ("diagram", &["diagram", "diagrama"]),
            ],
            Kind::UseCase => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("actors", &["actors", "actores"]),
                ("preconditions", &["preconditions", "precondiciones"]),
                ("main_flow", &["main flow", "flujo principal"]),
                ("alternative_flows", &["alternative flows", "flujos alternativos"]),
                ("exceptions", &["exceptions", "excepciones"]),
                ("postconditions", &["postconditions", "postcondiciones"]),
                ("applied_rules", &["applied rules", "reglas aplicadas"]),
                ("commands_executed", &["commands executed", "comandos ejecutados"]),
            ],
            Kind::UiView => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("layout", &["layout", "diseño", "diseno"]),
                ("components", &["components", "componentes"]),
                ("states", &["states", "estados"]),
                ("behavior", &["behavior", "comportamiento"]),
            ],
            Kind::UiComponent => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("entities", &["entities", "entidades"]),
                ("use_cases", &["use cases", "casos de uso"]),
            ],
            Kind::Requirement => &[
                ("description", &["description", "descripción", "descripcion"]),
                ("acceptance_criteria", &["acceptance criteria", "criterios de aceptación", "criterios de aceptacion"]),
                ("traceability", &["traceability", "trazabilidad"]),
            ],
            Kind::Objective => &[
                ("actor", &["actor"]),
                ("objective", &["objective", "objetivo"]),
                ("success_criteria", &["success criteria", "criterios de éxito", "criterios de exito"]),
            ],
            Kind::Prd => &[
                ("problem_opportunity", &["problem/opportunity", "problema/oportunidad"]),
                ("scope", &["scope", "alcance"]),
                ("users", &["users", "usuarios"]),
                ("success_metrics", &["success metrics", "métricas de éxito", "metricas de exito"]),
                ("dependencies", &["dependencies", "dependencias"]),
            ],
            Kind::Adr => &[
                ("context", &["context", "contexto"]),
                ("decision", &["decision", "decisión", "decision_accented"]),
                ("consequences", &["consequences", "consecuencias"]),
            ],
            Kind::Glossary => &[
                ("definition", &["definition", "definición", "definicion"]),
                ("context", &["context", "contexto"]),
                ("related_terms", &["related terms", "términos relacionados", "terminos relacionados"]),
            ],
        }
    }

    /// Subset of `indexed_sections()` whose body text is eligible for
    /// embedding: prose-bearing sections only, never structured
    /// tables/lists. An empty slice means the kind never produces
    /// embeddings (e.g. `event`).
    pub fn embeddable_sections(&self) -> &'static [&'static str] {
        match self {
            Kind::Entity => &["description"],
            Kind::Event => &[],
            Kind::BusinessRule => &["declaration", "when_applies", "why_it_exists"],
            Kind::BusinessPolicy => &["declaration", "when_applies"],
            Kind::CrossPolicy => &["purpose", "declaration", "standard_behavior"],
            Kind::Command => &["purpose"],
            Kind::Query => &["purpose"],
            Kind::Process => &["steps"],
            Kind::UseCase => &["description", "main_flow", "alternative_flows", "exceptions"],
            Kind::UiView => &["description", "behavior"],
            Kind::UiComponent => &["description"],
            Kind::Requirement => &["description", "acceptance_criteria"],
            Kind::Objective => &["objective", "success_criteria"],
            Kind::Prd => &["problem_opportunity", "scope"],
            Kind::Adr => &["context", "decision", "consequences"],
            Kind::Glossary => &["definition", "context"],
        }
    }

    /// Expands `embeddable_sections()`'s canonical field keys into the
    /// actual (lower-case) heading-name synonyms a document may use, for
    /// matching against a parsed section's heading text.
    pub fn embeddable_heading_names(&self) -> Vec<&'static str> {
        let embeddable = self.embeddable_sections();
        self.indexed_sections()
            .iter()
            .filter(|(canonical, _)| embeddable.contains(canonical))
            .flat_map(|(_, synonyms)| synonyms.iter().copied())
            .collect()
    }
}

/// Reserved wiki-link target prefixes and the layer they resolve to; used to
/// flag layer-violating `WIKI_LINK` edges without requiring the destination
/// node to already exist in the graph.
pub const RESERVED_PREFIXES: &[(&str, Layer)] = &[
    ("EVT-", Layer::Domain),
    ("BR-", Layer::Domain),
    ("BP-", Layer::Domain),
    ("XP-", Layer::Domain),
    ("CMD-", Layer::Behavior),
    ("QRY-", Layer::Behavior),
    ("UC-", Layer::Behavior),
    ("PROC-", Layer::Behavior),
    ("REQ-", Layer::Requirements),
    ("OBJ-", Layer::Requirements),
    ("ADR-", Layer::Requirements),
    ("PRD-", Layer::Requirements),
    ("UI-", Layer::Experience),
];

pub fn reserved_prefixes() -> impl Iterator<Item = &'static str> {
    RESERVED_PREFIXES.iter().map(|(p, _)| *p)
}

/// Layer of a wiki-link target resolved purely from its reserved prefix; a
/// target with no reserved prefix (entity/glossary references) has no
/// resolvable layer.
pub fn layer_of_target(target: &str) -> Option<Layer> {
    RESERVED_PREFIXES
        .iter()
        .find(|(prefix, _)| target.starts_with(prefix))
        .map(|(_, layer)| *layer)
}

/// Resolve a wiki-link target into the node ID it should point at: a
/// reserved-prefix target (`UC-042`) maps to that kind's node-ID prefix
/// (`UC:042`); anything else is treated as an entity target (`ENT:<target>`).
pub fn resolve_target_id(target: &str) -> String {
    for (prefix, _layer) in RESERVED_PREFIXES {
        if let Some(rest) = target.strip_prefix(prefix) {
            let short_prefix = prefix.trim_end_matches('-');
            return format!("{}:{}", short_prefix, rest);
        }
    }
    format!("ENT:{}", target)
}

/// `origin != requirements && numeric(origin) < numeric(destination)`.
/// An undefined destination layer never counts as a violation.
pub fn is_layer_violation(origin: Layer, destination: Option<Layer>) -> bool {
    match destination {
        Some(dest) => origin != Layer::Requirements && origin.numeric() < dest.numeric(),
        None => false,
    }
}

/// Front-matter mapping, pre-parsed by `kdd-parser`.
pub type FrontMatter = JsonMap;

/// Kind routing: resolve `(kind, warning)` from front-matter + source path.
/// Absent front-matter, or a missing/unrecognized `kind` value, yields
/// `(None, None)` without error.
pub fn route(front_matter: Option<&FrontMatter>, source_path: &str) -> (Option<Kind>, Option<String>) {
    let Some(fm) = front_matter else {
        return (None, None);
    };
    let Some(Value::String(raw_kind)) = fm.get("kind") else {
        return (None, None);
    };
    let Some(kind) = Kind::from_str(raw_kind) else {
        return (None, None);
    };
    let expected = kind.expected_path_prefix();
    if source_path.contains(expected) {
        (Some(kind), None)
    } else {
        let warning = format!(
            "{} '{}' found outside expected path '{}'",
            kind.as_str(),
            source_path,
            expected
        );
        (Some(kind), Some(warning))
    }
}

/// Fixed edge-type -> human phrase table used by the impact query.
pub fn impact_description(edge_type: &EdgeType) -> String {
    match edge_type {
        EdgeType::EntityRule => "Business rule validates this entity".to_string(),
        EdgeType::UcAppliesRule => "Use case applies this rule".to_string(),
        EdgeType::UcExecutesCmd => "Use case executes this command".to_string(),
        EdgeType::Emits => "Emits this event".to_string(),
        EdgeType::Consumes => "Consumes this event".to_string(),
        EdgeType::WikiLink => "References this artifact".to_string(),
        EdgeType::DomainRelation => "Has a domain relationship".to_string(),
        EdgeType::RequirementTracesTo => "Requirement traces to this artifact".to_string(),
        EdgeType::Validates => "Validates this artifact via BDD scenarios".to_string(),
        other => format!("Connected via {}", other.as_str()),
    }
}

/// `(name, description, edge_type)` coverage rule triples, keyed by kind.
pub fn coverage_rules(kind: &str) -> Option<&'static [(&'static str, &'static str, EdgeType)]> {
    match kind {
        "entity" => Some(&[
            ("events", "Lifecycle events emitted by this entity", EdgeType::Emits),
            ("business_rules", "Business rules that validate this entity", EdgeType::EntityRule),
            ("use_cases", "Use cases that reference this entity", EdgeType::WikiLink),
        ]),
        "command" => Some(&[
            ("events", "Events emitted by this command", EdgeType::Emits),
            ("use_cases", "Use cases that execute this command", EdgeType::UcExecutesCmd),
        ]),
        "use-case" => Some(&[
            ("applied_rules", "Business rules applied by this use case", EdgeType::UcAppliesRule),
            ("commands", "Commands executed by this use case", EdgeType::UcExecutesCmd),
            ("objectives", "Objectives this use case tells the story of", EdgeType::UcStory),
        ]),
        "business-rule" => Some(&[
            ("entities", "Entities this rule validates", EdgeType::EntityRule),
            ("use_cases", "Use cases that apply this rule", EdgeType::UcAppliesRule),
        ]),
        "requirement" => Some(&[
            ("traces", "Artifacts this requirement traces to", EdgeType::RequirementTracesTo),
            ("validations", "BDD scenarios validating this requirement", EdgeType::Validates),
        ]),
        _ => None,
    }
}
