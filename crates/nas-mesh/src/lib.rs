//! # nas-mesh
//!
//! Mesh clean-up on a [`nas_model::BdfModel`]: a k-d tree over node
//! positions and the node equivalencing pass built on it.

pub mod equivalence;
pub mod error;
pub mod kdtree;

pub use equivalence::{
    EquivalenceConfig, EquivalenceResult, MergePlan, StaleReference, equivalence_nodes, plan_merges, resolve_clusters,
};
pub use error::{DegenerateElement, EquivalenceError, Result};
pub use kdtree::{KdTree, Neighbor};
