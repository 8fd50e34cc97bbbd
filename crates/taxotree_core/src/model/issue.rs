//! Data-quality issue vocabulary.
//!
//! Every automatic repair done by the normalizer is recorded as one of these
//! issues, on the affected entity and on its raw source record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    /// Synonym took part in a synonym cycle or a multi-hop synonym chain.
    ChainedSynonym,
    /// Name took part in a chain of basionym relations.
    ChainedBasionym,
    /// Synonym was used as parent or child in the hierarchy.
    SynonymParent,
    /// Descriptive data was moved from a synonym to its accepted taxa.
    SynonymDataMoved,
    /// Synonym lost or never had an accepted taxon.
    AcceptedNameMissing,
    TaxonomicStatusDoubtful,
    DerivedTaxonomicStatus,
    ClassificationNotApplied,
    ClassificationRankOrderInvalid,
    ParentNameMismatch,
    ParentSpeciesMissing,
    PublishedBeforeGenus,
    UnmatchedReferenceBrackets,
    UnmatchedNameBrackets,
    AuthorshipUnlikely,
    UnlikelyYear,
    DuplicateName,
}

impl Issue {
    pub const ALL: [Issue; 17] = [
        Self::ChainedSynonym,
        Self::ChainedBasionym,
        Self::SynonymParent,
        Self::SynonymDataMoved,
        Self::AcceptedNameMissing,
        Self::TaxonomicStatusDoubtful,
        Self::DerivedTaxonomicStatus,
        Self::ClassificationNotApplied,
        Self::ClassificationRankOrderInvalid,
        Self::ParentNameMismatch,
        Self::ParentSpeciesMissing,
        Self::PublishedBeforeGenus,
        Self::UnmatchedReferenceBrackets,
        Self::UnmatchedNameBrackets,
        Self::AuthorshipUnlikely,
        Self::UnlikelyYear,
        Self::DuplicateName,
    ];

    /// Stable storage code, also used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChainedSynonym => "CHAINED_SYNONYM",
            Self::ChainedBasionym => "CHAINED_BASIONYM",
            Self::SynonymParent => "SYNONYM_PARENT",
            Self::SynonymDataMoved => "SYNONYM_DATA_MOVED",
            Self::AcceptedNameMissing => "ACCEPTED_NAME_MISSING",
            Self::TaxonomicStatusDoubtful => "TAXONOMIC_STATUS_DOUBTFUL",
            Self::DerivedTaxonomicStatus => "DERIVED_TAXONOMIC_STATUS",
            Self::ClassificationNotApplied => "CLASSIFICATION_NOT_APPLIED",
            Self::ClassificationRankOrderInvalid => "CLASSIFICATION_RANK_ORDER_INVALID",
            Self::ParentNameMismatch => "PARENT_NAME_MISMATCH",
            Self::ParentSpeciesMissing => "PARENT_SPECIES_MISSING",
            Self::PublishedBeforeGenus => "PUBLISHED_BEFORE_GENUS",
            Self::UnmatchedReferenceBrackets => "UNMATCHED_REFERENCE_BRACKETS",
            Self::UnmatchedNameBrackets => "UNMATCHED_NAME_BRACKETS",
            Self::AuthorshipUnlikely => "AUTHORSHIP_UNLIKELY",
            Self::UnlikelyYear => "UNLIKELY_YEAR",
            Self::DuplicateName => "DUPLICATE_NAME",
        }
    }

    pub fn parse(value: &str) -> Option<Issue> {
        Self::ALL.into_iter().find(|issue| issue.as_str() == value)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
