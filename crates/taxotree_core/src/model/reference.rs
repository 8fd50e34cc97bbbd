//! Bibliographic reference cited by names and taxa.

use crate::model::verbatim::VerbatimKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub citation: Option<String>,
    /// Publication year, if known.
    pub year: Option<i32>,
    pub verbatim_key: Option<VerbatimKey>,
}

impl Reference {
    pub fn new(id: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            citation: Some(citation.into()),
            year: None,
            verbatim_key: None,
        }
    }
}
