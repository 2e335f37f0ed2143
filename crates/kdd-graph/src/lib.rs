pub mod store;

pub use store::{GraphStore, TraversalResult};
