//! Taxonomic usage of a name: an accepted taxon or a synonym.
//!
//! # Invariants
//! - `kind` is fixed when the usage is created.
//! - Synonyms carry no descriptive data once normalization completed.

use crate::model::classification::Classification;
use crate::model::issue::Issue;
use crate::model::name::Origin;
use crate::model::verbatim::VerbatimKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Taxon,
    Synonym,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomicStatus {
    Accepted,
    ProvisionallyAccepted,
    Synonym,
    AmbiguousSynonym,
    Misapplied,
}

impl TaxonomicStatus {
    pub fn is_synonym(self) -> bool {
        matches!(
            self,
            Self::Synonym | Self::AmbiguousSynonym | Self::Misapplied
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VernacularName {
    pub name: Option<String>,
    pub language: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Distribution {
    pub area: Option<String>,
    pub gazetteer: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Description {
    pub text: Option<String>,
    pub category: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Media {
    pub url: Option<String>,
    pub title: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
}

/// Estimated number of species below a higher taxon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeciesEstimate {
    pub estimate: Option<i64>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub id: Option<String>,
    pub kind: UsageKind,
    pub status: Option<TaxonomicStatus>,
    pub origin: Option<Origin>,
    /// Free-text "according to" annotation, e.g. `sensu auct. non L.`.
    pub according_to: Option<String>,
    pub classification: Option<Classification>,
    pub vernacular_names: Vec<VernacularName>,
    pub distributions: Vec<Distribution>,
    pub descriptions: Vec<Description>,
    pub media: Vec<Media>,
    /// Reference ids of the taxon bibliography.
    pub bibliography: Vec<String>,
    pub estimates: Vec<SpeciesEstimate>,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: BTreeSet<Issue>,
}

impl Usage {
    pub fn new(kind: UsageKind, status: TaxonomicStatus, origin: Origin) -> Self {
        Self {
            id: None,
            kind,
            status: Some(status),
            origin: Some(origin),
            according_to: None,
            classification: None,
            vernacular_names: Vec::new(),
            distributions: Vec::new(),
            descriptions: Vec::new(),
            media: Vec::new(),
            bibliography: Vec::new(),
            estimates: Vec::new(),
            verbatim_key: None,
            issues: BTreeSet::new(),
        }
    }

    pub fn taxon(id: impl Into<String>) -> Self {
        let mut usage = Self::new(UsageKind::Taxon, TaxonomicStatus::Accepted, Origin::Source);
        usage.id = Some(id.into());
        usage
    }

    pub fn synonym(id: impl Into<String>) -> Self {
        let mut usage = Self::new(UsageKind::Synonym, TaxonomicStatus::Synonym, Origin::Source);
        usage.id = Some(id.into());
        usage
    }

    pub fn is_synonym(&self) -> bool {
        self.kind == UsageKind::Synonym
    }

    /// Returns whether any data that synonyms must not keep is attached.
    pub fn has_synonym_data(&self) -> bool {
        !self.vernacular_names.is_empty()
            || !self.distributions.is_empty()
            || !self.descriptions.is_empty()
            || !self.media.is_empty()
            || !self.bibliography.is_empty()
    }

    /// Moves the synonym-restricted collections out, leaving them empty.
    pub fn take_synonym_data(&mut self) -> SynonymData {
        SynonymData {
            vernacular_names: std::mem::take(&mut self.vernacular_names),
            distributions: std::mem::take(&mut self.distributions),
            descriptions: std::mem::take(&mut self.descriptions),
            media: std::mem::take(&mut self.media),
            bibliography: std::mem::take(&mut self.bibliography),
        }
    }

    /// Appends moved data, skipping bibliography entries already present.
    pub fn absorb(&mut self, data: &SynonymData) {
        self.vernacular_names
            .extend(data.vernacular_names.iter().cloned());
        self.distributions.extend(data.distributions.iter().cloned());
        self.descriptions.extend(data.descriptions.iter().cloned());
        self.media.extend(data.media.iter().cloned());
        for reference_id in &data.bibliography {
            if !self.bibliography.contains(reference_id) {
                self.bibliography.push(reference_id.clone());
            }
        }
    }
}

/// Descriptive data detached from a synonym.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SynonymData {
    pub vernacular_names: Vec<VernacularName>,
    pub distributions: Vec<Distribution>,
    pub descriptions: Vec<Description>,
    pub media: Vec<Media>,
    pub bibliography: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{Distribution, Usage};

    #[test]
    fn take_synonym_data_clears_source() {
        let mut syn = Usage::synonym("s1");
        syn.distributions.push(Distribution {
            area: Some("DE".to_string()),
            ..Distribution::default()
        });
        syn.bibliography.push("r1".to_string());
        assert!(syn.has_synonym_data());

        let data = syn.take_synonym_data();
        assert!(!syn.has_synonym_data());
        assert_eq!(data.distributions.len(), 1);
    }

    #[test]
    fn absorb_deduplicates_bibliography() {
        let mut syn = Usage::synonym("s1");
        syn.bibliography.push("r1".to_string());
        let data = syn.take_synonym_data();

        let mut taxon = Usage::taxon("t1");
        taxon.bibliography.push("r1".to_string());
        taxon.absorb(&data);
        assert_eq!(taxon.bibliography, vec!["r1".to_string()]);
    }
}
