//! Taxonomic status rectification of synonyms.

use super::issues::IssueRecorder;
use super::{Interrupt, NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{GraphStore, Label, NodeBatchProcessor, NodeId, RelType};
use crate::model::issue::Issue;
use crate::model::usage::TaxonomicStatus;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use crate::service::misapplied::is_misapplied;
use log::{debug, info};

/// Status transition for a synonym, plus the issue to flag.
///
/// Status only moves toward stronger evidence; contradicting evidence is
/// flagged as doubtful instead of downgrading.
pub(crate) fn rectify(
    status: TaxonomicStatus,
    misapplied: bool,
    ambiguous: bool,
) -> Option<(TaxonomicStatus, Issue)> {
    use TaxonomicStatus::{AmbiguousSynonym, Misapplied, Synonym};
    match status {
        Misapplied if !misapplied => Some((Misapplied, Issue::TaxonomicStatusDoubtful)),
        AmbiguousSynonym if misapplied => Some((Misapplied, Issue::DerivedTaxonomicStatus)),
        AmbiguousSynonym if !ambiguous => {
            Some((AmbiguousSynonym, Issue::TaxonomicStatusDoubtful))
        }
        Synonym if misapplied => Some((Misapplied, Issue::DerivedTaxonomicStatus)),
        Synonym if ambiguous => Some((AmbiguousSynonym, Issue::DerivedTaxonomicStatus)),
        _ => None,
    }
}

struct StatusRectifier<'a, V> {
    recorder: &'a mut IssueRecorder,
    verbatim: &'a V,
    interrupt: &'a Interrupt,
    changed: usize,
}

impl<V: VerbatimRepository> NodeBatchProcessor for StatusRectifier<'_, V> {
    type Error = NormalizerError;

    fn process(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let Some(usage) = store.usage(node) else {
            return Ok(());
        };
        let Some(status) = usage.status else {
            return Ok(());
        };
        let ambiguous = store.out_degree(node, RelType::SynonymOf) > 1;
        let authorship = store
            .name_of_usage(node)
            .and_then(|name| name.authorship.as_deref());
        let misapplied = is_misapplied(usage.according_to.as_deref(), authorship);

        let Some((next, issue)) = rectify(status, misapplied, ambiguous) else {
            return Ok(());
        };
        if next != status {
            if let Some(usage) = store.usage_mut(node) {
                usage.status = Some(next);
            }
            self.changed += 1;
        }
        self.recorder.usage(store, node, issue);
        Ok(())
    }

    fn commit_batch(&mut self, _store: &mut GraphStore, counter: usize) -> NormalizerResult<()> {
        self.recorder.flush(self.verbatim)?;
        debug!("event=status_batch module=normalizer status=ok processed={counter}");
        self.interrupt.check()
    }
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Derives ambiguous and misapplied status for synonyms.
    pub(super) fn rectify_taxonomic_status(&mut self) -> NormalizerResult<usize> {
        let mut rectifier = StatusRectifier {
            recorder: &mut self.recorder,
            verbatim: &self.verbatim,
            interrupt: &self.interrupt,
            changed: 0,
        };
        let processed =
            self.store
                .process(Label::Synonym, self.config.batch_size, &mut rectifier)?;
        let changed = rectifier.changed;
        info!(
            "event=taxonomic_status module=normalizer status=ok processed={processed} changed={changed}"
        );
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::rectify;
    use crate::model::issue::Issue;
    use crate::model::usage::TaxonomicStatus::{
        Accepted, AmbiguousSynonym, Misapplied, Synonym,
    };

    #[test]
    fn transition_table() {
        assert_eq!(
            rectify(Misapplied, false, true),
            Some((Misapplied, Issue::TaxonomicStatusDoubtful))
        );
        assert_eq!(rectify(Misapplied, true, false), None);
        assert_eq!(
            rectify(AmbiguousSynonym, true, false),
            Some((Misapplied, Issue::DerivedTaxonomicStatus))
        );
        assert_eq!(
            rectify(AmbiguousSynonym, false, false),
            Some((AmbiguousSynonym, Issue::TaxonomicStatusDoubtful))
        );
        assert_eq!(rectify(AmbiguousSynonym, false, true), None);
        assert_eq!(
            rectify(Synonym, true, true),
            Some((Misapplied, Issue::DerivedTaxonomicStatus))
        );
        assert_eq!(
            rectify(Synonym, false, true),
            Some((AmbiguousSynonym, Issue::DerivedTaxonomicStatus))
        );
        assert_eq!(rectify(Synonym, false, false), None);
        assert_eq!(rectify(Accepted, true, true), None);
    }
}
