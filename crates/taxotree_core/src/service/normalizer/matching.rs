//! Names index matching after normalization.

use super::issues::IssueRecorder;
use super::{Interrupt, NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{GraphStore, Label, NodeBatchProcessor, NodeId};
use crate::model::issue::Issue;
use crate::model::name::Name;
use crate::model::name_match::{MatchType, NameMatch};
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::fmt::Display;

/// Canonical name matching service.
pub trait NameIndex {
    type Error: Display;

    /// Matches `name`, inserting unknown names when `allow_inserts` is set.
    fn match_name(
        &mut self,
        name: &Name,
        allow_inserts: bool,
        verbose: bool,
    ) -> Result<NameMatch, Self::Error>;
}

/// Placeholder index type for runs without matching.
pub(crate) enum NoIndex {}

impl NameIndex for NoIndex {
    type Error = Infallible;

    fn match_name(&mut self, _: &Name, _: bool, _: bool) -> Result<NameMatch, Infallible> {
        match *self {}
    }
}

struct Matcher<'a, I, V> {
    index: &'a mut I,
    recorder: &'a mut IssueRecorder,
    verbatim: &'a V,
    interrupt: &'a Interrupt,
    counts: BTreeMap<MatchType, usize>,
    /// First raw-record-backed name seen per index key.
    first_by_key: HashMap<i64, NodeId>,
    flagged_first: HashSet<NodeId>,
}

impl<I: NameIndex, V: VerbatimRepository> NodeBatchProcessor for Matcher<'_, I, V> {
    type Error = NormalizerError;

    fn process(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let Some(name) = store.name(node) else {
            return Ok(());
        };
        let from_verbatim = name.verbatim_key.is_some();
        let matched = self
            .index
            .match_name(name, true, false)
            .map_err(|err| NormalizerError::NameIndex(err.to_string()))?;

        store.update_name(node, |name| {
            name.names_index_match_type = Some(matched.match_type);
            name.names_index_id = matched.name_key;
        })?;
        *self.counts.entry(matched.match_type).or_default() += 1;

        let Some(key) = matched.name_key.filter(|_| from_verbatim) else {
            return Ok(());
        };
        match self.first_by_key.get(&key).copied() {
            None => {
                self.first_by_key.insert(key, node);
            }
            Some(first) => {
                if self.flagged_first.insert(first) {
                    self.recorder.name(store, first, Issue::DuplicateName);
                }
                self.recorder.name(store, node, Issue::DuplicateName);
                debug!(
                    "event=name_match module=normalizer status=duplicate name_key={key} first={first} name={node}"
                );
            }
        }
        Ok(())
    }

    fn commit_batch(&mut self, _store: &mut GraphStore, counter: usize) -> NormalizerResult<()> {
        self.recorder.flush(self.verbatim)?;
        debug!("event=name_match_batch module=normalizer status=ok processed={counter}");
        self.interrupt.check()
    }
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Matches every name against `index` and counts names per match type.
    ///
    /// Every match type is present in the result, unmatched types with zero.
    pub(super) fn match_and_count<I: NameIndex>(
        &mut self,
        index: &mut I,
    ) -> NormalizerResult<BTreeMap<MatchType, usize>> {
        let mut matcher = Matcher {
            index,
            recorder: &mut self.recorder,
            verbatim: &self.verbatim,
            interrupt: &self.interrupt,
            counts: MatchType::ALL.into_iter().map(|t| (t, 0)).collect(),
            first_by_key: HashMap::new(),
            flagged_first: HashSet::new(),
        };
        let processed = self
            .store
            .process(Label::Name, self.config.batch_size, &mut matcher)?;
        let counts = matcher.counts;
        self.recorder.flush(&self.verbatim)?;

        let summary = counts
            .iter()
            .map(|(match_type, count)| format!("{match_type}:{count}"))
            .collect::<Vec<_>>()
            .join(",");
        info!(
            "event=name_match module=normalizer status=ok run_id={} processed={} counts={}",
            self.run_id, processed, summary
        );
        Ok(counts)
    }
}
