//! Nomenclatural relation cleanup.

use super::{NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{EdgeId, Label, NodeId, RelType};
use crate::model::issue::Issue;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Reduces parallel name relations of one type to a single edge.
    ///
    /// Keeps the first edge carrying a note or reference, otherwise the
    /// first edge.
    pub(super) fn reduce_redundant_name_rels(&mut self) -> NormalizerResult<usize> {
        let mut deleted = 0;
        for rel in RelType::NAME_RELATIONS {
            for name in self.store.nodes_with_label(Label::Name) {
                let edges = self.store.outgoing(name, rel);
                if edges.len() < 2 {
                    continue;
                }
                let mut by_target: BTreeMap<NodeId, Vec<EdgeId>> = BTreeMap::new();
                for edge_id in edges {
                    if let Some(edge) = self.store.edge(edge_id) {
                        by_target.entry(edge.to).or_default().push(edge_id);
                    }
                }
                for parallel in by_target.into_values().filter(|edges| edges.len() > 1) {
                    let keep = parallel
                        .iter()
                        .copied()
                        .find(|edge_id| self.store.edge(*edge_id).is_some_and(|e| e.is_rich()))
                        .unwrap_or(parallel[0]);
                    for edge_id in parallel.into_iter().filter(|edge_id| *edge_id != keep) {
                        if self.store.delete_edge(edge_id).is_some() {
                            deleted += 1;
                        }
                    }
                }
            }
            debug!("event=name_rels module=normalizer status=ok rel={rel} deleted={deleted}");
        }
        info!("event=name_rels module=normalizer status=ok deleted={deleted}");
        Ok(deleted)
    }

    /// Cuts 2-hop basionym chains `x -> b1 -> b2` until none is left.
    ///
    /// The edge into the less cited basionym is deleted; on a tie the second
    /// edge `b1 -> b2` goes. Chains of one round never overlap.
    pub(super) fn cut_basionym_chains(&mut self) -> NormalizerResult<usize> {
        let bound = self.store.edge_count() + 1;
        let mut total = 0;
        let mut rounds = 0;
        loop {
            let cut = self.cut_non_overlapping_basionym_chains();
            if cut == 0 {
                break;
            }
            total += cut;
            rounds += 1;
            if rounds > bound {
                return Err(NormalizerError::Assertion(format!(
                    "basionym chains still present after {rounds} rounds"
                )));
            }
        }
        info!("event=basionym_chains module=normalizer status=ok cut={total} rounds={rounds}");
        Ok(total)
    }

    fn cut_non_overlapping_basionym_chains(&mut self) -> usize {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut cut = 0;
        for name in self.store.nodes_with_label(Label::Name) {
            for first in self.store.outgoing(name, RelType::HasBasionym) {
                let Some(b1) = self.store.edge(first).map(|edge| edge.to) else {
                    continue;
                };
                for second in self.store.outgoing(b1, RelType::HasBasionym) {
                    let Some(b2) = self.store.edge(second).map(|edge| edge.to) else {
                        continue;
                    };
                    if self.store.edge(first).is_none()
                        || [name, b1, b2].iter().any(|node| visited.contains(node))
                    {
                        continue;
                    }
                    visited.extend([name, b1, b2]);

                    let d1 = self.store.in_degree(b1, RelType::HasBasionym);
                    let d2 = self.store.in_degree(b2, RelType::HasBasionym);
                    let (edge_id, from, to) = if d1 < d2 {
                        (first, name, b1)
                    } else {
                        (second, b1, b2)
                    };
                    self.store.delete_edge(edge_id);
                    self.recorder
                        .name(&mut self.store, from, Issue::ChainedBasionym);
                    self.recorder
                        .name(&mut self.store, to, Issue::ChainedBasionym);
                    debug!(
                        "event=basionym_chain module=normalizer status=cut from={from} to={to} d1={d1} d2={d2}"
                    );
                    cut += 1;
                }
            }
        }
        cut
    }
}
