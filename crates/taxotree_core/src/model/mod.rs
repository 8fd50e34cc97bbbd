//! Taxonomic domain model.
//!
//! # Responsibility
//! - Define names, usages, classifications and issues shared by the graph
//!   store, the repositories and the normalizer.
//!
//! # Invariants
//! - Every record that originates from a source file links back to its raw
//!   record through a `VerbatimKey`.

pub mod classification;
pub mod import_metadata;
pub mod issue;
pub mod name;
pub mod name_match;
pub mod rank;
pub mod reference;
pub mod usage;
pub mod verbatim;
