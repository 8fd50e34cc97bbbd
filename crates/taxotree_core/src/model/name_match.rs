//! Result vocabulary of a names index lookup.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    /// Matched after normalizing spelling or authorship variants.
    Variant,
    /// Not known before; the index created a new entry.
    Inserted,
    Ambiguous,
    None,
}

impl MatchType {
    pub const ALL: [MatchType; 5] = [
        Self::Exact,
        Self::Variant,
        Self::Inserted,
        Self::Ambiguous,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::Variant => "VARIANT",
            Self::Inserted => "INSERTED",
            Self::Ambiguous => "AMBIGUOUS",
            Self::None => "NONE",
        }
    }
}

impl Display for MatchType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub match_type: MatchType,
    /// Key of the matched index entry.
    pub name_key: Option<i64>,
}

impl NameMatch {
    pub fn none() -> Self {
        Self {
            match_type: MatchType::None,
            name_key: None,
        }
    }

    pub fn matched(match_type: MatchType, name_key: i64) -> Self {
        Self {
            match_type,
            name_key: Some(name_key),
        }
    }

    pub fn has_match(&self) -> bool {
        self.name_key.is_some()
    }
}
