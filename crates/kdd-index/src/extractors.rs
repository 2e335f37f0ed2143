//! One extractor per document kind, dispatched by enum value (§4.4).
//!
//! Grounded on `codegraph-parser`'s per-language dispatch pattern
//! (`enum Language -> impl`), generalized here to per-kind node/edge
//! extraction instead of per-language AST parsing.

use kdd_core::{domain::resolve_target_id, is_layer_violation, layer_of_target, EdgeType, GraphEdge, GraphNode, JsonMap, Kind, Layer};
use kdd_parser::markdown::{parse_list_items, parse_table_rows};
use kdd_parser::wikilink::{parse_wikilinks, WikiLink};
use serde_json::Value;
use std::collections::HashSet;

/// Everything an extractor needs, assembled by the index command before
/// dispatch: parsed sections, front-matter, and identity fields computed
/// earlier in the pipeline (§4.8 steps 1-8).
pub struct ExtractorInput<'a> {
    pub document_id: &'a str,
    pub source_path: &'a str,
    pub source_hash: &'a str,
    pub layer: Layer,
    pub front_matter: &'a JsonMap,
    pub sections: &'a [kdd_core::Section],
    pub indexed_at: &'a str,
}

/// Run the extractor for `kind` against `input`. Never fails: missing
/// sections just omit the corresponding indexed field.
pub fn extract(kind: Kind, input: &ExtractorInput) -> (GraphNode, Vec<GraphEdge>) {
    let node_id = format!("{}:{}", kind.node_id_prefix(), input.document_id);
    let indexed_fields = build_indexed_fields(kind, input);
    let node = build_node(kind, input, &node_id, indexed_fields);

    let mut edges = wiki_link_edges(&node_id, input.layer, input.source_path, input.sections);
    edges.extend(additional_edges(kind, &node_id, input.layer, input.source_path, input.sections));

    (node, dedup_edges(edges))
}

fn build_node(kind: Kind, input: &ExtractorInput, node_id: &str, mut indexed_fields: JsonMap) -> GraphNode {
    if let Some(Value::String(title)) = input.front_matter.get("title") {
        indexed_fields.insert("title".to_string(), Value::String(title.clone()));
    }

    GraphNode {
        id: node_id.to_string(),
        kind: kind.as_str().to_string(),
        source_path: input.source_path.to_string(),
        source_hash: input.source_hash.to_string(),
        layer: input.layer.as_str().to_string(),
        status: status_of(input.front_matter),
        aliases: aliases_of(input.front_matter),
        domain: domain_of(input.front_matter),
        indexed_fields,
        indexed_at: input.indexed_at.to_string(),
    }
}

fn status_of(front_matter: &JsonMap) -> String {
    match front_matter.get("status") {
        Some(Value::String(s)) => s.clone(),
        _ => "draft".to_string(),
    }
}

fn aliases_of(front_matter: &JsonMap) -> Vec<String> {
    match front_matter.get("aliases") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn domain_of(front_matter: &JsonMap) -> Option<String> {
    match front_matter.get("domain") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn find_section<'a>(sections: &'a [kdd_core::Section], synonyms: &[&str]) -> Option<&'a kdd_core::Section> {
    sections.iter().find(|s| {
        let heading = s.heading.to_lowercase();
        synonyms.iter().any(|syn| heading == *syn)
    })
}

fn build_indexed_fields(kind: Kind, input: &ExtractorInput) -> JsonMap {
    let mut fields = JsonMap::new();
    for (canonical, synonyms) in kind.indexed_sections() {
        if let Some(section) = find_section(input.sections, synonyms) {
            if !section.body.is_empty() {
                fields.insert(canonical.to_string(), Value::String(section.body.clone()));
            }
        }
    }
    fields
}

/// Every unique wiki-link target across the whole document becomes a
/// `WIKI_LINK` edge: `bidirectional = true`, `layer_violation` computed from
/// the destination's resolved layer.
fn wiki_link_edges(node_id: &str, origin_layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    let mut seen_targets = HashSet::new();
    let mut edges = Vec::new();

    for section in sections {
        for link in parse_wikilinks(&section.body) {
            if !seen_targets.insert(link.target.clone()) {
                continue;
            }
            let to = resolve_target_id(&link.target);
            let violation = is_layer_violation(origin_layer, layer_of_target(&link.target));
            edges.push(GraphEdge {
                from: node_id.to_string(),
                to,
                edge_type: EdgeType::WikiLink.as_str().to_string(),
                source_path: source_path.to_string(),
                extraction_method: "wikilink".to_string(),
                metadata: JsonMap::new(),
                layer_violation: violation,
                bidirectional: true,
            });
        }
    }
    edges
}

fn typed_edge(
    node_id: &str,
    origin_layer: Layer,
    source_path: &str,
    target: &str,
    edge_type: EdgeType,
    metadata: JsonMap,
) -> GraphEdge {
    let to = resolve_target_id(target);
    let violation = is_layer_violation(origin_layer, layer_of_target(target));
    GraphEdge {
        from: node_id.to_string(),
        to,
        edge_type: edge_type.as_str().to_string(),
        source_path: source_path.to_string(),
        extraction_method: "structured".to_string(),
        metadata,
        layer_violation: violation,
        bidirectional: false,
    }
}

fn targets_from_wikilinks(section: Option<&kdd_core::Section>, filter: impl Fn(&WikiLink) -> bool) -> Vec<String> {
    let Some(section) = section else { return Vec::new() };
    let mut seen = HashSet::new();
    parse_wikilinks(&section.body)
        .into_iter()
        .filter(|l| filter(l))
        .filter(|l| seen.insert(l.target.clone()))
        .map(|l| l.target)
        .collect()
}

fn additional_edges(kind: Kind, node_id: &str, layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    match kind {
        Kind::Entity => entity_edges(node_id, layer, source_path, sections),
        Kind::Command => command_edges(node_id, layer, source_path, sections),
        Kind::BusinessRule | Kind::BusinessPolicy | Kind::CrossPolicy => {
            rule_policy_edges(kind, node_id, layer, source_path, sections)
        }
        Kind::UseCase => use_case_edges(node_id, layer, source_path, sections),
        _ => Vec::new(),
    }
}

fn entity_edges(node_id: &str, layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    let mut edges = Vec::new();

    if let Some(section) = find_section(sections, &["relations", "relationships", "relaciones"]) {
        for row in parse_table_rows(&section.body) {
            let as_map: std::collections::HashMap<_, _> = row.into_iter().collect();
            let Some(name) = as_map.get("Name").or_else(|| as_map.get("Entity")) else { continue };
            if name.is_empty() {
                continue;
            }
            let mut metadata = JsonMap::new();
            if let Some(relation) = as_map.get("Relation").or_else(|| as_map.get("Type")) {
                metadata.insert("relation".to_string(), Value::String(relation.clone()));
            }
            if let Some(cardinality) = as_map.get("Cardinality") {
                metadata.insert("cardinality".to_string(), Value::String(cardinality.clone()));
            }
            edges.push(typed_edge(node_id, layer, source_path, name, EdgeType::DomainRelation, metadata));
        }
    }

    let lifecycle_events = find_section(sections, &["lifecycle events", "eventos de ciclo de vida"]);
    for target in targets_from_wikilinks(lifecycle_events, |l| l.target.starts_with("EVT-")) {
        edges.push(typed_edge(node_id, layer, source_path, &target, EdgeType::Emits, JsonMap::new()));
    }

    edges
}

fn command_edges(node_id: &str, layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    let postconditions = find_section(sections, &["postconditions", "postcondiciones"]);
    targets_from_wikilinks(postconditions, |l| l.target.starts_with("EVT-"))
        .into_iter()
        .map(|target| typed_edge(node_id, layer, source_path, &target, EdgeType::Emits, JsonMap::new()))
        .collect()
}

fn rule_policy_edges(kind: Kind, node_id: &str, layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    let section = if matches!(kind, Kind::CrossPolicy) {
        find_section(sections, &["purpose", "propósito", "proposito"])
    } else {
        find_section(sections, &["declaration", "declaración", "declaracion"])
    };
    targets_from_wikilinks(section, |l| !l.is_typed_reference())
        .into_iter()
        .map(|target| typed_edge(node_id, layer, source_path, &target, EdgeType::EntityRule, JsonMap::new()))
        .collect()
}

fn use_case_edges(node_id: &str, layer: Layer, source_path: &str, sections: &[kdd_core::Section]) -> Vec<GraphEdge> {
    let mut edges = Vec::new();

    let applied_rules = find_section(sections, &["applied rules", "reglas aplicadas"]);
    for target in targets_from_wikilinks(applied_rules, |l| {
        l.target.starts_with("BR-") || l.target.starts_with("BP-") || l.target.starts_with("XP-")
    }) {
        edges.push(typed_edge(node_id, layer, source_path, &target, EdgeType::UcAppliesRule, JsonMap::new()));
    }

    let commands_executed = find_section(sections, &["commands executed", "comandos ejecutados"]);
    for target in targets_from_wikilinks(commands_executed, |l| l.target.starts_with("CMD-")) {
        edges.push(typed_edge(node_id, layer, source_path, &target, EdgeType::UcExecutesCmd, JsonMap::new()));
    }

    let mut seen_objectives = HashSet::new();
    for section in sections {
        for link in parse_wikilinks(&section.body) {
            if link.target.starts_with("OBJ-") && seen_objectives.insert(link.target.clone()) {
                edges.push(typed_edge(node_id, layer, source_path, &link.target, EdgeType::UcStory, JsonMap::new()));
            }
        }
    }

    edges
}

/// Deduplicate by `(from, to, edge_type)`, keeping first occurrence.
/// `deduplicateEdges(deduplicateEdges(x)) = deduplicateEdges(x)` holds since
/// the output already satisfies the uniqueness invariant.
pub fn dedup_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut seen = HashSet::new();
    edges
        .into_iter()
        .filter(|e| seen.insert(e.dedup_key()))
        .collect()
}

#[allow(dead_code)]
fn unused_list_items_helper_reference() {
    // `parse_list_items` is part of the §4.4 helper pair even though no
    // current kind's additional edges need list parsing; kept imported so
    // extractor authors reach for it instead of hand-rolling list splitting.
    let _ = parse_list_items;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::Section;
    use serde_json::json;

    fn section(heading: &str, body: &str) -> Section {
        Section { heading: heading.to_string(), level: 2, body: body.to_string(), path: heading.to_lowercase() }
    }

    fn fm(kind: &str) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("kind".to_string(), json!(kind));
        map
    }

    #[test]
    fn entity_node_has_prefixed_id_and_indexed_fields() {
        let front_matter = fm("entity");
        let sections = vec![section("Description", "An order placed by a customer.")];
        let input = ExtractorInput {
            document_id: "Order",
            source_path: "specs/01-domain/entities/Order.md",
            source_hash: "abc123",
            layer: Layer::Domain,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (node, edges) = extract(Kind::Entity, &input);
        assert_eq!(node.id, "ENT:Order");
        assert_eq!(node.status, "draft");
        assert_eq!(node.indexed_fields.get("description").unwrap(), "An order placed by a customer.");
        assert!(edges.is_empty());
    }

    #[test]
    fn entity_emits_edges_from_lifecycle_events() {
        let front_matter = fm("entity");
        let sections = vec![section("Lifecycle Events", "See [[EVT-OrderPlaced]] and [[EVT-OrderShipped]].")];
        let input = ExtractorInput {
            document_id: "Order",
            source_path: "specs/01-domain/entities/Order.md",
            source_hash: "abc123",
            layer: Layer::Domain,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (_, edges) = extract(Kind::Entity, &input);
        let emits: Vec<_> = edges.iter().filter(|e| e.edge_type == "EMITS").collect();
        assert_eq!(emits.len(), 2);
        assert!(emits.iter().any(|e| e.to == "EVT:OrderPlaced"));
    }

    #[test]
    fn wiki_link_edge_flags_layer_violation_domain_to_behavior() {
        let front_matter = fm("entity");
        let sections = vec![section("Description", "Related to [[UC-042]].")];
        let input = ExtractorInput {
            document_id: "Order",
            source_path: "specs/01-domain/entities/Order.md",
            source_hash: "abc123",
            layer: Layer::Domain,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (_, edges) = extract(Kind::Entity, &input);
        let wiki = edges.iter().find(|e| e.edge_type == "WIKI_LINK").unwrap();
        assert_eq!(wiki.to, "UC:042");
        assert!(wiki.layer_violation);
    }

    #[test]
    fn wiki_link_edge_no_violation_behavior_to_domain() {
        let front_matter = fm("command");
        let sections = vec![section("Purpose", "Related to [[EVT-001]].")];
        let input = ExtractorInput {
            document_id: "PlaceOrder",
            source_path: "specs/02-behavior/commands/PlaceOrder.md",
            source_hash: "abc123",
            layer: Layer::Behavior,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (_, edges) = extract(Kind::Command, &input);
        let wiki = edges.iter().find(|e| e.edge_type == "WIKI_LINK").unwrap();
        assert!(!wiki.layer_violation);
    }

    #[test]
    fn use_case_emits_applies_rule_executes_cmd_and_story_edges() {
        let front_matter = fm("use-case");
        let sections = vec![
            section("Applied Rules", "[[BR-001]]"),
            section("Commands Executed", "[[CMD-001]]"),
            section("Description", "Tells the story of [[OBJ-001]]."),
        ];
        let input = ExtractorInput {
            document_id: "Checkout",
            source_path: "specs/02-behavior/use-cases/Checkout.md",
            source_hash: "abc123",
            layer: Layer::Behavior,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (_, edges) = extract(Kind::UseCase, &input);
        assert!(edges.iter().any(|e| e.edge_type == "UC_APPLIES_RULE" && e.to == "BR:001"));
        assert!(edges.iter().any(|e| e.edge_type == "UC_EXECUTES_CMD" && e.to == "CMD:001"));
        assert!(edges.iter().any(|e| e.edge_type == "UC_STORY" && e.to == "OBJ:001"));
    }

    #[test]
    fn aliases_of_wrong_type_coerce_to_empty() {
        let mut front_matter = fm("entity");
        front_matter.insert("aliases".to_string(), json!("not-an-array"));
        assert!(aliases_of(&front_matter).is_empty());
    }

    #[test]
    fn dedup_edges_is_idempotent() {
        let front_matter = fm("entity");
        let sections = vec![section("Description", "[[KDDDocument]] and [[KDDDocument]] again.")];
        let input = ExtractorInput {
            document_id: "Order",
            source_path: "specs/01-domain/entities/Order.md",
            source_hash: "abc123",
            layer: Layer::Domain,
            front_matter: &front_matter,
            sections: &sections,
            indexed_at: "2026-01-01T00:00:00Z",
        };
        let (_, edges) = extract(Kind::Entity, &input);
        let once = dedup_edges(edges.clone());
        let twice = dedup_edges(once.clone());
        assert_eq!(once.len(), twice.len());
        assert_eq!(once.len(), 1);
    }
}
