//! Denormalized higher classification snapshot of one usage.
//!
//! # Invariants
//! - Only ranks listed in [`Classification::RANKS`] can hold a value.
//! - Blank values are never stored.

use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification {
    entries: BTreeMap<Rank, String>,
}

impl Classification {
    /// Ranks a classification can carry, highest first.
    pub const RANKS: [Rank; 16] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Subphylum,
        Rank::Class,
        Rank::Subclass,
        Rank::Order,
        Rank::Suborder,
        Rank::Superfamily,
        Rank::Family,
        Rank::Subfamily,
        Rank::Tribe,
        Rank::Subtribe,
        Rank::Genus,
        Rank::Subgenus,
        // botanical placement
        Rank::Section,
        Rank::Species,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, ignoring ranks a classification cannot hold.
    pub fn with(mut self, rank: Rank, value: impl Into<String>) -> Self {
        self.set(rank, Some(value.into()));
        self
    }

    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.entries.get(&rank).map(String::as_str)
    }

    /// Sets or clears the value for `rank`.
    ///
    /// Returns `false` when the rank is not a classification rank.
    pub fn set(&mut self, rank: Rank, value: Option<String>) -> bool {
        if !Self::RANKS.contains(&rank) {
            return false;
        }
        match value.map(|value| value.trim().to_string()) {
            Some(value) if !value.is_empty() => {
                self.entries.insert(rank, value);
            }
            _ => {
                self.entries.remove(&rank);
            }
        }
        true
    }

    pub fn lowest_existing_rank(&self) -> Option<Rank> {
        Self::RANKS
            .iter()
            .rev()
            .copied()
            .find(|rank| self.entries.contains_key(rank))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compares all entries strictly above `lowest`.
    pub fn equals_above_rank(&self, other: &Classification, lowest: Rank) -> bool {
        Self::RANKS
            .iter()
            .take_while(|rank| rank.higher_than(lowest))
            .all(|rank| self.get(*rank) == other.get(*rank))
    }
}

#[cfg(test)]
mod tests {
    use super::Classification;
    use crate::model::rank::Rank;

    #[test]
    fn set_ignores_non_classification_ranks_and_blanks() {
        let mut cl = Classification::new();
        assert!(!cl.set(Rank::Variety, Some("alba".to_string())));
        assert!(cl.set(Rank::Family, Some("  ".to_string())));
        assert!(cl.is_empty());
    }

    #[test]
    fn lowest_existing_rank_scans_bottom_up() {
        let cl = Classification::new()
            .with(Rank::Kingdom, "Plantae")
            .with(Rank::Family, "Fabaceae");
        assert_eq!(cl.lowest_existing_rank(), Some(Rank::Family));
    }

    #[test]
    fn equals_above_rank_ignores_lower_entries() {
        let a = Classification::new()
            .with(Rank::Kingdom, "Plantae")
            .with(Rank::Family, "Fabaceae")
            .with(Rank::Genus, "Acacia");
        let b = Classification::new()
            .with(Rank::Kingdom, "Plantae")
            .with(Rank::Family, "Fabaceae")
            .with(Rank::Genus, "Mimosa");
        assert!(a.equals_above_rank(&b, Rank::Genus));
        assert!(!a.equals_above_rank(&b, Rank::Species));
    }
}
