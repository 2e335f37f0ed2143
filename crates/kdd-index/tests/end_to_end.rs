//! End-to-end pipeline: index a handful of markdown documents, load them
//! into a `Container`, and check the resulting graph against §8's worked
//! scenarios.

use kdd_index::{index_document, ArtifactStore, Container};

const ENTITY_MD: &str = "---\nkind: entity\n---\n\n## Description\n\nAn order placed by a customer.\n\n## Lifecycle Events\n\nEmits [[EVT-OrderPlaced]] when created.\n";

const EVENT_MD: &str = "---\nkind: event\n---\n\n## Description\n\nRaised once an order has been placed.\n";

const RULE_MD: &str =
    "---\nkind: business-rule\n---\n\n## Declaration\n\nAn order must reference [[Order]] before it can be placed.\n";

#[tokio::test]
async fn indexing_three_documents_builds_a_queryable_graph() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let indexed_at = "2026-01-01T00:00:00Z";

    let entity = index_document(
        &store,
        "specs/01-domain/entities/Order.md".as_ref(),
        ENTITY_MD.as_bytes(),
        indexed_at,
        None,
    )
    .await
    .unwrap();
    assert!(entity.success);
    assert_eq!(entity.node_id.as_deref(), Some("ENT:Order"));

    let event = index_document(
        &store,
        "specs/01-domain/events/OrderPlaced.md".as_ref(),
        EVENT_MD.as_bytes(),
        indexed_at,
        None,
    )
    .await
    .unwrap();
    assert!(event.success);

    let rule = index_document(
        &store,
        "specs/01-domain/business-rules/OrderRequiresEntity.md".as_ref(),
        RULE_MD.as_bytes(),
        indexed_at,
        None,
    )
    .await
    .unwrap();
    assert!(rule.success);

    let container = Container::load(dir.path()).unwrap();
    let graph = container.graph();
    assert_eq!(graph.node_count(), 3);
    assert!(graph.get_node("ENT:Order").is_some());
    assert!(graph.get_node("EVT:OrderPlaced").is_some());

    let coverage = kdd_query::coverage_query(&graph, "ENT:Order").unwrap();
    let events = coverage.categories.iter().find(|c| c.name == "events").unwrap();
    assert_eq!(events.status, "covered");

    let impact = kdd_query::impact_query(&graph, "ENT:Order", "modify_attribute", 3).unwrap();
    assert_eq!(impact.total_directly, 1);
    assert_eq!(impact.directly_affected[0].node_id, "BR:OrderRequiresEntity");
}

#[tokio::test]
async fn reindexing_the_same_file_replaces_the_node_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let path: &std::path::Path = "specs/01-domain/entities/Order.md".as_ref();

    index_document(&store, path, ENTITY_MD.as_bytes(), "2026-01-01T00:00:00Z", None).await.unwrap();
    index_document(&store, path, ENTITY_MD.as_bytes(), "2026-01-02T00:00:00Z", None).await.unwrap();

    let nodes = store.read_all_nodes().unwrap();
    assert_eq!(nodes.iter().filter(|n| n.id == "ENT:Order").count(), 1);
}

#[tokio::test]
async fn misplaced_document_is_indexed_with_a_routing_warning() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let result = index_document(
        &store,
        "specs/02-behavior/Stray.md".as_ref(),
        "---\nkind: entity\n---\n\n## Description\n\nMisplaced.\n".as_bytes(),
        "2026-01-01T00:00:00Z",
        None,
    )
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(
        result.warning.as_deref(),
        Some("entity 'specs/02-behavior/Stray.md' found outside expected path '01-domain/entities/'")
    );
}
