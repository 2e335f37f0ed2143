mod common;
pub mod coverage;
pub mod graph;
pub mod hybrid;
pub mod impact;
pub mod semantic;
pub mod violations;

pub use common::ScoredNode;
pub use coverage::{coverage_query, CoverageCategory, CoverageResult};
pub use graph::{graph_query, GraphQueryResult};
pub use hybrid::{hybrid_query, HybridHit, HybridQueryResult};
pub use impact::{impact_query, ImpactResult, ImpactedNode, ScenarioRerun, TransitiveImpact};
pub use semantic::{semantic_query, SemanticQueryResult};
pub use violations::{violations_query, ViolationRecord, ViolationsResult};
