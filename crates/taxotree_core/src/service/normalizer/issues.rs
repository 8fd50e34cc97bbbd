//! Issue bookkeeping for one run.
//!
//! Issues land on the in-graph entity immediately. Raw record writes are
//! buffered until the next checkpoint and then written in one transaction.

use crate::graph::{GraphStore, NodeId};
use crate::model::issue::Issue;
use crate::model::verbatim::VerbatimKey;
use crate::repo::verbatim_repo::VerbatimRepository;
use crate::repo::RepoResult;
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub(crate) struct IssueRecorder {
    pending: Vec<(VerbatimKey, Issue)>,
    counts: BTreeMap<Issue, u64>,
}

impl IssueRecorder {
    pub(crate) fn usage(&mut self, store: &mut GraphStore, node: NodeId, issue: Issue) {
        let key = store.add_usage_issue(node, issue);
        self.track(key, issue);
    }

    pub(crate) fn name(&mut self, store: &mut GraphStore, node: NodeId, issue: Issue) {
        let key = store.add_name_issue(node, issue);
        self.track(key, issue);
    }

    /// Flags a raw record that has no live graph entity, e.g. a removed
    /// orphan or a reference.
    pub(crate) fn verbatim(&mut self, key: Option<VerbatimKey>, issue: Issue) {
        self.track(key, issue);
    }

    fn track(&mut self, key: Option<VerbatimKey>, issue: Issue) {
        if let Some(key) = key {
            self.pending.push((key, issue));
        }
        *self.counts.entry(issue).or_default() += 1;
    }

    /// Writes buffered raw record issues. Returns the number of new rows.
    pub(crate) fn flush<V: VerbatimRepository>(&mut self, repo: &V) -> RepoResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let written = repo.add_issues(&self.pending)?;
        debug!(
            "event=issues_flush module=normalizer status=ok buffered={} written={}",
            self.pending.len(),
            written
        );
        self.pending.clear();
        Ok(written)
    }

    pub(crate) fn counts(&self) -> &BTreeMap<Issue, u64> {
        &self.counts
    }
}
