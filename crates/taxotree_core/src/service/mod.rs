//! Normalization services.
//!
//! # Responsibility
//! - Run the graph sanitization pipeline over one dataset.
//! - Provide the name checks and status heuristics it relies on.

pub mod misapplied;
pub mod name_validator;
pub mod normalizer;
