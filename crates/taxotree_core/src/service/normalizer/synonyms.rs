//! Synonym relation repairs: cycles, chains, synonym parents, orphans and
//! synonym data.

use super::{NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{GraphStore, Label, NodeId, RelType};
use crate::model::issue::Issue;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

/// Finds one directed cycle of `SynonymOf` edges, in edge order.
fn find_synonym_cycle(store: &GraphStore) -> Option<Vec<NodeId>> {
    let mut state: HashMap<NodeId, Visit> = HashMap::new();
    for start in store.nodes_with_label(Label::Usage) {
        if state.contains_key(&start) {
            continue;
        }
        state.insert(start, Visit::Open);
        let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> =
            vec![(start, store.targets(start, RelType::SynonymOf), 0)];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let node = frame.0;
            let next = frame.1.get(frame.2).copied();
            frame.2 += 1;

            let Some(next) = next else {
                state.insert(node, Visit::Done);
                stack.pop();
                continue;
            };
            match state.get(&next) {
                Some(Visit::Open) => {
                    let from = stack.iter().position(|frame| frame.0 == next)?;
                    return Some(stack[from..].iter().map(|frame| frame.0).collect());
                }
                Some(Visit::Done) => {}
                None => {
                    state.insert(next, Visit::Open);
                    stack.push((next, store.targets(next, RelType::SynonymOf), 0));
                }
            }
        }
    }
    None
}

/// Taxa reachable from `start` over `SynonymOf` edges through non-taxon nodes.
fn terminal_taxa(store: &GraphStore, start: NodeId) -> Vec<NodeId> {
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];
    let mut found = Vec::new();
    while let Some(current) = stack.pop() {
        for target in store.targets(current, RelType::SynonymOf) {
            if !visited.insert(target) {
                continue;
            }
            if store.has_label(target, Label::Taxon) {
                found.push(target);
            } else {
                stack.push(target);
            }
        }
    }
    found.sort();
    found
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Cuts synonym cycles one at a time until none is left.
    ///
    /// The cut edge is the outgoing cycle edge of the cycle node with the
    /// lowest node id.
    pub(super) fn cut_synonym_cycles(&mut self) -> NormalizerResult<usize> {
        let bound = self.store.edge_count() + 1;
        let mut cut = 0;
        while let Some(cycle) = find_synonym_cycle(&self.store) {
            if cut >= bound {
                return Err(NormalizerError::Assertion(format!(
                    "synonym cycles still present after {cut} cuts"
                )));
            }
            let (position, origin) = cycle
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|(_, node)| *node)
                .ok_or_else(|| NormalizerError::Assertion("empty synonym cycle".to_string()))?;
            let next = cycle[(position + 1) % cycle.len()];
            let edge = self
                .store
                .find_edge(origin, next, RelType::SynonymOf)
                .ok_or_else(|| {
                    NormalizerError::Assertion(format!("cycle edge {origin} -> {next} vanished"))
                })?;

            self.store.delete_edge(edge);
            self.recorder
                .usage(&mut self.store, origin, Issue::ChainedSynonym);
            debug!(
                "event=synonym_cycle module=normalizer status=cut usage={} cycle_len={}",
                self.store.usage_label(origin),
                cycle.len()
            );
            cut += 1;
        }
        info!("event=synonym_cycles module=normalizer status=ok cut={cut}");
        Ok(cut)
    }

    /// Makes every synonym point straight at a taxon.
    ///
    /// Chains ending in a taxon are relinked to that taxon. Chains that end
    /// in a synonym without target lose all their edges.
    pub(super) fn relink_synonym_chains(&mut self) -> NormalizerResult<usize> {
        let mut plan = Vec::new();
        for usage in self.store.nodes_with_label(Label::Usage) {
            for edge_id in self.store.outgoing(usage, RelType::SynonymOf) {
                let Some(edge) = self.store.edge(edge_id) else {
                    continue;
                };
                if self.store.has_label(edge.to, Label::Taxon) {
                    continue;
                }
                let taxa = terminal_taxa(&self.store, edge.to);
                if !taxa.is_empty() {
                    plan.push((edge_id, usage, edge.to, taxa));
                }
            }
        }

        let mut relinked = 0;
        for (edge_id, synonym, intermediate, taxa) in plan {
            for taxon in taxa {
                if !self.store.create_synonym_rel(synonym, taxon)? {
                    debug!(
                        "event=synonym_chain module=normalizer status=skipped reason=same_name usage={}",
                        self.store.usage_label(synonym)
                    );
                }
            }
            self.store.delete_edge(edge_id);
            self.recorder
                .usage(&mut self.store, synonym, Issue::ChainedSynonym);
            self.recorder
                .usage(&mut self.store, intermediate, Issue::ChainedSynonym);
            relinked += 1;
        }

        let mut removed = 0;
        let dead_ends: Vec<NodeId> = self
            .store
            .nodes_with_label(Label::Usage)
            .into_iter()
            .filter(|node| {
                !self.store.has_label(*node, Label::Taxon)
                    && self.store.out_degree(*node, RelType::SynonymOf) == 0
                    && self.store.in_degree(*node, RelType::SynonymOf) > 0
            })
            .collect();
        for dead_end in dead_ends {
            self.recorder
                .usage(&mut self.store, dead_end, Issue::ChainedSynonym);
            let mut stack = vec![dead_end];
            let mut visited = HashSet::from([dead_end]);
            while let Some(current) = stack.pop() {
                for edge_id in self.store.incoming(current, RelType::SynonymOf) {
                    let Some(edge) = self.store.delete_edge(edge_id) else {
                        continue;
                    };
                    self.recorder
                        .usage(&mut self.store, edge.from, Issue::ChainedSynonym);
                    removed += 1;
                    if self.store.out_degree(edge.from, RelType::SynonymOf) == 0
                        && visited.insert(edge.from)
                    {
                        stack.push(edge.from);
                    }
                }
            }
        }

        info!(
            "event=synonym_chains module=normalizer status=ok relinked={relinked} removed={removed}"
        );
        Ok(relinked + removed)
    }

    /// Removes every parent relation touching a synonym.
    ///
    /// Children of a synonym move under its first accepted taxon unless one
    /// of its accepted taxa already holds them; without accepted taxon they
    /// become roots.
    pub(super) fn prefer_synonym_over_parent_rel(&mut self) -> NormalizerResult<usize> {
        let mut deleted = 0;
        let mut relinked = 0;
        for synonym in self.store.nodes_with_label(Label::Synonym) {
            let accepted: Vec<NodeId> = self
                .store
                .accepted_of(synonym)
                .into_iter()
                .filter(|node| self.store.has_label(*node, Label::Taxon))
                .collect();

            for edge_id in self.store.outgoing(synonym, RelType::ParentOf) {
                let Some(edge) = self.store.delete_edge(edge_id) else {
                    continue;
                };
                deleted += 1;
                let child = edge.to;
                self.recorder
                    .usage(&mut self.store, synonym, Issue::SynonymParent);

                let covered = accepted.iter().any(|taxon| {
                    *taxon == child || self.store.is_ancestor(*taxon, child)
                });
                if covered || self.store.has_label(child, Label::Synonym) {
                    continue;
                }
                let Some(first) = accepted.first().copied() else {
                    info!(
                        "event=synonym_parent module=normalizer status=root synonym={} child={}",
                        self.store.usage_label(synonym),
                        self.store.usage_label(child)
                    );
                    continue;
                };
                if self.store.is_ancestor(child, first) {
                    debug!(
                        "event=synonym_parent module=normalizer status=skipped reason=cycle child={}",
                        self.store.usage_label(child)
                    );
                    continue;
                }
                if accepted.len() > 1 {
                    info!(
                        "event=synonym_parent module=normalizer status=first_accepted synonym={} accepted={}",
                        self.store.usage_label(synonym),
                        accepted.len()
                    );
                }
                self.store.assign_parent(Some(first), child)?;
                relinked += 1;
            }

            for edge_id in self.store.incoming(synonym, RelType::ParentOf) {
                if self.store.delete_edge(edge_id).is_some() {
                    deleted += 1;
                    self.recorder
                        .usage(&mut self.store, synonym, Issue::SynonymParent);
                }
            }
        }
        info!(
            "event=synonym_parents module=normalizer status=ok deleted={deleted} relinked={relinked}"
        );
        Ok(deleted)
    }

    /// Deletes synonyms left without accepted taxon, plus names nobody uses.
    pub(super) fn remove_orphan_synonyms(&mut self) -> NormalizerResult<usize> {
        let mut removed = 0;
        for synonym in self.store.nodes_with_label(Label::Synonym) {
            if self.store.out_degree(synonym, RelType::SynonymOf) > 0 {
                continue;
            }
            let key = self.store.usage(synonym).and_then(|usage| usage.verbatim_key);
            self.recorder.verbatim(key, Issue::AcceptedNameMissing);
            debug!(
                "event=orphan_synonym module=normalizer status=removed usage={}",
                self.store.usage_label(synonym)
            );

            let name_node = self.store.name_node_of(synonym);
            self.store.remove(synonym)?;
            if let Some(name_node) = name_node {
                if self.store.usages_of_name(name_node).is_empty() {
                    self.store.remove(name_node)?;
                }
            }
            removed += 1;
        }
        info!("event=orphan_synonyms module=normalizer status=ok removed={removed}");
        Ok(removed)
    }

    /// Moves vernacular names, distributions, descriptions, media and
    /// bibliography from synonyms to all of their accepted taxa.
    ///
    /// A synonym without accepted taxon loses its data.
    pub(super) fn move_synonym_data(&mut self) -> NormalizerResult<usize> {
        let mut moved = 0;
        for synonym in self.store.nodes_with_label(Label::Synonym) {
            if !self
                .store
                .usage(synonym)
                .is_some_and(|usage| usage.has_synonym_data())
            {
                continue;
            }
            let accepted: Vec<NodeId> = self
                .store
                .accepted_of(synonym)
                .into_iter()
                .filter(|node| self.store.has_label(*node, Label::Taxon))
                .collect();
            let Some(data) = self
                .store
                .usage_mut(synonym)
                .map(|usage| usage.take_synonym_data())
            else {
                continue;
            };
            if accepted.is_empty() {
                warn!(
                    "event=synonym_data module=normalizer status=dropped synonym={}",
                    self.store.usage_label(synonym)
                );
                continue;
            }
            for taxon in &accepted {
                if let Some(usage) = self.store.usage_mut(*taxon) {
                    usage.absorb(&data);
                }
            }
            self.recorder
                .usage(&mut self.store, synonym, Issue::SynonymDataMoved);
            moved += 1;
        }
        info!("event=synonym_data module=normalizer status=ok moved={moved}");
        Ok(moved)
    }
}
