//! In-memory taxonomic graph.
//!
//! # Responsibility
//! - Hold name and usage nodes with their typed relations.
//! - Offer the mutation, lookup and traversal primitives used by the
//!   normalizer passes.
//!
//! The store is owned by one normalization run and never shared.

pub mod batch;
pub mod store;
pub mod traverse;

pub use batch::NodeBatchProcessor;
pub use store::{
    Edge, EdgeId, GraphStore, Label, Labels, NodeId, RelType, StoreError, StoreResult,
};
