//! Per-dataset mapping flags computed while raw records were inserted.
//!
//! Read-only input to the normalizer.

use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportMetadata {
    /// Higher ranks were supplied as flat strings per record.
    pub denormed_classification_mapped: bool,
    /// Parents were supplied as explicit links.
    pub parent_name_mapped: bool,
    pub accepted_name_mapped: bool,
    pub original_name_mapped: bool,
    /// Ranks present in the denormalized classification columns.
    pub denormed_ranks_mapped: BTreeSet<Rank>,
}

impl ImportMetadata {
    /// Flags for a dataset that supplied explicit parents plus the given
    /// denormalized ranks.
    pub fn with_denormed_ranks(ranks: impl IntoIterator<Item = Rank>) -> Self {
        let denormed_ranks_mapped: BTreeSet<Rank> = ranks.into_iter().collect();
        Self {
            denormed_classification_mapped: !denormed_ranks_mapped.is_empty(),
            parent_name_mapped: true,
            accepted_name_mapped: true,
            original_name_mapped: false,
            denormed_ranks_mapped,
        }
    }
}
