//! Nomenclatural name record.
//!
//! # Responsibility
//! - Carry the parsed and unparsed parts of one scientific name.
//! - Keep issue annotations recorded against the name.
//!
//! # Invariants
//! - Required fields (`id`, `origin`, `scientific_name`, `rank`, `name_type`)
//!   stay optional here; their presence is enforced by the verify pass so that
//!   insertion never silently invents values.

use crate::model::issue::Issue;
use crate::model::name_match::MatchType;
use crate::model::rank::Rank;
use crate::model::verbatim::VerbatimKey;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Leading marker of a named hybrid, e.g. `× Agropogon`.
pub const HYBRID_MARKER: char = '×';

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(incertae\s+sedis|unknown|unassigned|not\s+assigned|unplaced|undetermined|dummy|\?+)\s*$",
    )
    .expect("valid placeholder regex")
});

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    /// Read directly from a source record.
    Source,
    /// Created from a denormalized higher classification.
    DenormedClassification,
    /// Created from a parent name given by value.
    VerbatimParent,
    /// Created from an accepted name given by value.
    VerbatimAccepted,
    /// Created from a basionym given by value.
    VerbatimBasionym,
    Implicit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameType {
    Scientific,
    Virus,
    HybridFormula,
    Informal,
    Otu,
    Placeholder,
    NoName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomCode {
    Bacterial,
    Botanical,
    Cultivars,
    Virus,
    Zoological,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Name {
    pub id: Option<String>,
    pub scientific_name: Option<String>,
    pub authorship: Option<String>,
    pub rank: Option<Rank>,
    pub name_type: Option<NameType>,
    pub code: Option<NomCode>,
    pub origin: Option<Origin>,
    /// Id of the first name of the homotypic group this name belongs to.
    pub homotypic_name_id: Option<String>,
    pub uninomial: Option<String>,
    pub genus: Option<String>,
    pub infrageneric_epithet: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    /// Year of the combination authorship, kept verbatim.
    pub combination_year: Option<String>,
    /// Reference id of the original publication.
    pub published_in_id: Option<String>,
    /// Set once the name has been split into its parts.
    pub parsed: bool,
    pub verbatim_key: Option<VerbatimKey>,
    /// Names index id assigned by the match step.
    pub names_index_id: Option<i64>,
    pub names_index_match_type: Option<MatchType>,
    pub issues: BTreeSet<Issue>,
}

impl Name {
    /// Builds a parsed monomial name of the given rank.
    pub fn uninomial(uninomial: impl Into<String>, rank: Rank) -> Self {
        let mut name = Self {
            uninomial: Some(uninomial.into()),
            rank: Some(rank),
            parsed: true,
            ..Self::default()
        };
        name.rebuild_scientific_name();
        name
    }

    /// Builds a parsed binomial or trinomial name.
    pub fn species(
        genus: impl Into<String>,
        specific_epithet: impl Into<String>,
        infraspecific_epithet: Option<&str>,
        rank: Rank,
    ) -> Self {
        let mut name = Self {
            genus: Some(genus.into()),
            specific_epithet: Some(specific_epithet.into()),
            infraspecific_epithet: infraspecific_epithet.map(str::to_string),
            rank: Some(rank),
            parsed: true,
            ..Self::default()
        };
        name.rebuild_scientific_name();
        name
    }

    /// Rebuilds `scientific_name` from the parsed name parts.
    ///
    /// Leaves the current value untouched when there are no parts.
    pub fn rebuild_scientific_name(&mut self) {
        let parts: Vec<&str> = [
            self.uninomial.as_deref(),
            self.genus.as_deref(),
            self.specific_epithet.as_deref(),
            self.infraspecific_epithet.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
        if !parts.is_empty() {
            self.scientific_name = Some(parts.join(" "));
        }
    }

    /// Scientific name followed by authorship, for log lines.
    pub fn label(&self) -> String {
        match (self.scientific_name.as_deref(), self.authorship.as_deref()) {
            (Some(name), Some(author)) => format!("{name} {author}"),
            (Some(name), None) => name.to_string(),
            (None, _) => self.id.clone().unwrap_or_else(|| "<unnamed>".to_string()),
        }
    }

    /// Rank of the name, treating a missing rank as unranked.
    pub fn rank_or_unranked(&self) -> Rank {
        self.rank.unwrap_or(Rank::Unranked)
    }
}

/// Determines the name type from a monomial alone.
pub fn determine_type(uninomial: &str) -> NameType {
    if PLACEHOLDER_RE.is_match(uninomial) {
        NameType::Placeholder
    } else {
        NameType::Scientific
    }
}

#[cfg(test)]
mod tests {
    use super::{determine_type, Name, NameType};
    use crate::model::rank::Rank;

    #[test]
    fn species_builds_scientific_name_from_parts() {
        let name = Name::species("Abies", "alba", Some("nana"), Rank::Variety);
        assert_eq!(name.scientific_name.as_deref(), Some("Abies alba nana"));
        assert!(name.parsed);
    }

    #[test]
    fn placeholders_are_detected() {
        assert_eq!(determine_type("Incertae sedis"), NameType::Placeholder);
        assert_eq!(determine_type("??"), NameType::Placeholder);
        assert_eq!(determine_type("Fabaceae"), NameType::Scientific);
    }

    #[test]
    fn label_falls_back_to_id() {
        let name = Name {
            id: Some("n1".to_string()),
            ..Name::default()
        };
        assert_eq!(name.label(), "n1");
    }
}
