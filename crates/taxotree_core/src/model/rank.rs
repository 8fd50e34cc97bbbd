//! Taxonomic rank vocabulary.
//!
//! # Invariants
//! - Declaration order runs from highest to lowest concrete rank.
//! - `Other` and `Unranked` are uncomparable and never take part in
//!   higher/lower comparisons.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    Domain,
    Superkingdom,
    Kingdom,
    Subkingdom,
    Superphylum,
    Phylum,
    Subphylum,
    Superclass,
    Class,
    Subclass,
    Superorder,
    Order,
    Suborder,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    Genus,
    Subgenus,
    Section,
    Series,
    Species,
    Subspecies,
    Variety,
    Form,
    Other,
    Unranked,
}

impl Rank {
    /// True for ranks that have no place in the linnean order.
    pub fn is_uncomparable(self) -> bool {
        matches!(self, Self::Other | Self::Unranked)
    }

    pub fn not_other_or_unranked(self) -> bool {
        !self.is_uncomparable()
    }

    /// Returns whether `self` sits strictly above `other`.
    ///
    /// Always `false` when either side is uncomparable.
    pub fn higher_than(self, other: Rank) -> bool {
        if self.is_uncomparable() || other.is_uncomparable() {
            return false;
        }
        self < other
    }

    pub fn is_species_or_below(self) -> bool {
        !self.is_uncomparable() && self >= Self::Species
    }

    pub fn is_infraspecific(self) -> bool {
        !self.is_uncomparable() && self > Self::Species
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Superkingdom => "superkingdom",
            Self::Kingdom => "kingdom",
            Self::Subkingdom => "subkingdom",
            Self::Superphylum => "superphylum",
            Self::Phylum => "phylum",
            Self::Subphylum => "subphylum",
            Self::Superclass => "superclass",
            Self::Class => "class",
            Self::Subclass => "subclass",
            Self::Superorder => "superorder",
            Self::Order => "order",
            Self::Suborder => "suborder",
            Self::Superfamily => "superfamily",
            Self::Family => "family",
            Self::Subfamily => "subfamily",
            Self::Tribe => "tribe",
            Self::Subtribe => "subtribe",
            Self::Genus => "genus",
            Self::Subgenus => "subgenus",
            Self::Section => "section",
            Self::Series => "series",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Variety => "variety",
            Self::Form => "form",
            Self::Other => "other",
            Self::Unranked => "unranked",
        }
    }

    /// Parses a rank name case-insensitively.
    pub fn parse(value: &str) -> Option<Rank> {
        let rank = match value.trim().to_ascii_lowercase().as_str() {
            "domain" => Self::Domain,
            "superkingdom" => Self::Superkingdom,
            "kingdom" => Self::Kingdom,
            "subkingdom" => Self::Subkingdom,
            "superphylum" => Self::Superphylum,
            "phylum" | "division" => Self::Phylum,
            "subphylum" => Self::Subphylum,
            "superclass" => Self::Superclass,
            "class" => Self::Class,
            "subclass" => Self::Subclass,
            "superorder" => Self::Superorder,
            "order" => Self::Order,
            "suborder" => Self::Suborder,
            "superfamily" => Self::Superfamily,
            "family" => Self::Family,
            "subfamily" => Self::Subfamily,
            "tribe" => Self::Tribe,
            "subtribe" => Self::Subtribe,
            "genus" => Self::Genus,
            "subgenus" => Self::Subgenus,
            "section" => Self::Section,
            "series" => Self::Series,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "variety" => Self::Variety,
            "form" => Self::Form,
            "other" => Self::Other,
            "unranked" => Self::Unranked,
            _ => return None,
        };
        Some(rank)
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Rank;

    #[test]
    fn higher_than_follows_linnean_order() {
        assert!(Rank::Kingdom.higher_than(Rank::Family));
        assert!(!Rank::Family.higher_than(Rank::Family));
        assert!(!Rank::Species.higher_than(Rank::Genus));
    }

    #[test]
    fn uncomparable_ranks_never_compare() {
        assert!(!Rank::Unranked.higher_than(Rank::Species));
        assert!(!Rank::Kingdom.higher_than(Rank::Other));
        assert!(!Rank::Unranked.is_species_or_below());
    }

    #[test]
    fn infraspecific_excludes_species() {
        assert!(Rank::Variety.is_infraspecific());
        assert!(!Rank::Species.is_infraspecific());
        assert!(Rank::Species.is_species_or_below());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Rank::parse(" Family "), Some(Rank::Family));
        assert_eq!(Rank::parse("division"), Some(Rank::Phylum));
        assert_eq!(Rank::parse("clade"), None);
    }
}
