//! Raw source record as read from a dataset archive.
//!
//! # Invariants
//! - `key` is assigned by storage and never reused within one dataset.
//! - Issues form a set; flagging the same issue twice is a no-op.

use crate::model::issue::Issue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Storage key of a raw source record.
pub type VerbatimKey = i64;

/// Raw record input before storage assigns a key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewVerbatimRecord {
    /// Archive file the record was read from, e.g. `NameUsage.tsv`.
    pub source_file: String,
    /// 1-based line number inside `source_file`.
    pub line: Option<i64>,
    /// Term name to raw value.
    pub terms: BTreeMap<String, String>,
}

impl NewVerbatimRecord {
    pub fn new(source_file: impl Into<String>, line: i64) -> Self {
        Self {
            source_file: source_file.into(),
            line: Some(line),
            terms: BTreeMap::new(),
        }
    }

    pub fn with_term(mut self, term: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.insert(term.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbatimRecord {
    pub key: VerbatimKey,
    pub source_file: String,
    pub line: Option<i64>,
    pub terms: BTreeMap<String, String>,
    pub issues: BTreeSet<Issue>,
}

impl VerbatimRecord {
    /// Compact one-line rendering used when logging fatal data problems.
    pub fn to_string_complete(&self) -> String {
        let terms = self
            .terms
            .iter()
            .map(|(term, value)| format!("{term}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}:{} [{}]",
            self.source_file,
            self.line.map_or_else(|| "?".to_string(), |line| line.to_string()),
            terms
        )
    }
}
