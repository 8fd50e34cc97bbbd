//! Failure and cancellation outcomes of a normalization run.

use crate::graph::StoreError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NormalizerResult<T> = Result<T, NormalizerError>;

/// Outcome of an aborted normalization run.
///
/// Every variant aborts the whole pipeline; the scratch graph must be
/// discarded. `Cancelled` is not a failure and must not trigger retries.
#[derive(Debug)]
pub enum NormalizerError {
    /// A graph invariant check failed.
    Assertion(String),
    /// A mandatory field is absent on a record about to be persisted.
    MissingData {
        entity: &'static str,
        field: &'static str,
        id: String,
    },
    /// The run observed the interruption flag at a checkpoint.
    Cancelled,
    /// The names index failed to answer.
    NameIndex(String),
    Repo(RepoError),
}

impl NormalizerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Assertion(_) => "assertion_failed",
            Self::MissingData { .. } => "missing_data",
            Self::Cancelled => "cancelled",
            Self::NameIndex(_) => "name_index_failed",
            Self::Repo(_) => "repo_failed",
        }
    }
}

impl Display for NormalizerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assertion(message) => write!(f, "normalizer assertion failed: {message}"),
            Self::MissingData { entity, field, id } => {
                write!(f, "{field} missing for {entity} {id}")
            }
            Self::Cancelled => write!(f, "normalizer was interrupted"),
            Self::NameIndex(message) => write!(f, "names index failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NormalizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NormalizerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for NormalizerError {
    fn from(value: StoreError) -> Self {
        Self::Assertion(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::NormalizerError;
    use crate::graph::StoreError;

    #[test]
    fn store_errors_become_assertions() {
        let err: NormalizerError = StoreError::NotUnique {
            entity: "usage",
            id: "t1".to_string(),
        }
        .into();
        assert!(matches!(err, NormalizerError::Assertion(ref message) if message.contains("t1")));
        assert!(!err.is_cancelled());
        assert!(NormalizerError::Cancelled.is_cancelled());
    }
}
