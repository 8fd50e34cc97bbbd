//! Rebuilds parent links from denormalized per-record classifications.
//!
//! # Invariants
//! - A taxon is never linked under itself or under one of its descendants.
//! - Existing usages are reused before new higher taxa are created.

use super::issues::IssueRecorder;
use super::{Interrupt, NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{GraphStore, Label, NodeBatchProcessor, NodeId, StoreResult};
use crate::model::classification::Classification;
use crate::model::import_metadata::ImportMetadata;
use crate::model::issue::Issue;
use crate::model::name::{determine_type, Name, Origin};
use crate::model::rank::Rank;
use crate::model::usage::{TaxonomicStatus, Usage, UsageKind};
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use log::{debug, info};

/// Strips the entries that must not be turned into parents of `taxon`.
///
/// Returns the rank the taxon should be promoted to when it is unranked
/// and its name repeats the lowest classification entry.
pub(crate) fn prepare_classification(
    classification: &mut Classification,
    taxon_name: Option<&str>,
    taxon_rank: Rank,
    synonym: bool,
) -> Option<Rank> {
    let mut promoted = None;
    if let Some(lowest) = classification.lowest_existing_rank() {
        let same_name = match (classification.get(lowest), taxon_name) {
            (Some(value), Some(name)) => value.eq_ignore_ascii_case(name),
            _ => false,
        };
        if same_name {
            classification.set(lowest, None);
            if taxon_rank.is_uncomparable() {
                promoted = Some(lowest);
            }
        }
    }
    let rank = promoted.unwrap_or(taxon_rank);

    if !synonym {
        classification.set(rank, None);
    } else {
        for rank in [Rank::Genus, Rank::Subgenus, Rank::Section, Rank::Species] {
            classification.set(rank, None);
        }
    }
    promoted
}

fn set_rank(store: &mut GraphStore, usage: NodeId, rank: Rank) -> StoreResult<()> {
    if let Some(name_node) = store.name_node_of(usage) {
        store.update_name(name_node, |name| name.rank = Some(rank))?;
    }
    Ok(())
}

fn create_higher_taxon(store: &mut GraphStore, uninomial: &str, rank: Rank) -> StoreResult<NodeId> {
    let id = store.next_id();
    let mut name = Name::uninomial(uninomial, rank);
    name.id = Some(id.clone());
    name.origin = Some(Origin::DenormedClassification);
    name.name_type = Some(determine_type(uninomial));

    let mut usage = Usage::new(
        UsageKind::Taxon,
        TaxonomicStatus::Accepted,
        Origin::DenormedClassification,
    );
    usage.id = Some(id);
    let (_, usage_node) = store.create_name_and_usage(name, usage)?;
    Ok(usage_node)
}

struct ClassificationApplier<'a, V> {
    meta: &'a ImportMetadata,
    recorder: &'a mut IssueRecorder,
    verbatim: &'a V,
    interrupt: &'a Interrupt,
    applied: usize,
    created: usize,
}

impl<V: VerbatimRepository> ClassificationApplier<'_, V> {
    /// Topmost usage the classification should be attached to.
    ///
    /// `None` when the existing hierarchy already ends in an uncomparable
    /// rank, which is flagged on `node`.
    fn find_highest_parent(&mut self, store: &mut GraphStore, node: NodeId) -> Option<NodeId> {
        if self.meta.parent_name_mapped {
            let highest = store.highest_parent(node);
            if highest != node && store.usage_rank(highest).is_uncomparable() {
                debug!(
                    "event=classification module=normalizer status=skipped reason=uncomparable_root usage={}",
                    store.usage_label(node)
                );
                self.recorder
                    .usage(store, node, Issue::ClassificationNotApplied);
                return None;
            }
            return Some(highest);
        }
        Some(node)
    }

    /// Whether a rank between `node` and its ancestor `until` is mapped as a
    /// denormalized column.
    fn has_mapped_ranks_between(&self, store: &GraphStore, node: NodeId, until: NodeId) -> bool {
        store
            .parents_until(node, Some(until))
            .into_iter()
            .any(|parent| self.meta.denormed_ranks_mapped.contains(&store.usage_rank(parent)))
    }

    fn aligns(
        &self,
        store: &GraphStore,
        candidate: NodeId,
        parent: Option<(NodeId, Rank)>,
        classification: &Classification,
        rank: Rank,
    ) -> bool {
        let Some((parent, parent_rank)) = parent else {
            return store.parent_with_concrete_rank(candidate).is_none();
        };
        let direct = store.parent_of(candidate);
        if direct == Some(parent) {
            return true;
        }
        if store.parent_with_rank(candidate, parent_rank) == Some(parent)
            && !self.has_mapped_ranks_between(store, candidate, parent)
        {
            return true;
        }
        direct.is_none()
            && store
                .usage(candidate)
                .and_then(|usage| usage.classification.as_ref())
                .is_some_and(|own| own.equals_above_rank(classification, rank))
    }

    fn apply(
        &mut self,
        store: &mut GraphStore,
        taxon: NodeId,
        mut classification: Classification,
    ) -> NormalizerResult<()> {
        let taxon_name = store
            .name_of_usage(taxon)
            .and_then(|name| name.scientific_name.clone());
        let synonym = store.has_label(taxon, Label::Synonym);
        let mut rank = store.usage_rank(taxon);
        if let Some(promoted) =
            prepare_classification(&mut classification, taxon_name.as_deref(), rank, synonym)
        {
            set_rank(store, taxon, promoted)?;
            rank = promoted;
        }

        let mut parent: Option<(NodeId, Rank)> = None;
        for higher_rank in Classification::RANKS {
            if rank.higher_than(higher_rank) {
                continue;
            }
            let Some(value) = classification.get(higher_rank).map(str::to_string) else {
                continue;
            };

            let found = store
                .usages_by_name(&value, None, Some(higher_rank), true)
                .into_iter()
                .filter(|candidate| store.has_label(*candidate, Label::Taxon))
                .filter(|candidate| *candidate != taxon && !store.is_ancestor(taxon, *candidate))
                .find(|candidate| {
                    self.aligns(store, *candidate, parent, &classification, higher_rank)
                });

            let next = match found {
                Some(existing) => {
                    if store.usage_rank(existing) == Rank::Unranked {
                        set_rank(store, existing, higher_rank)?;
                    }
                    existing
                }
                None => {
                    let created = create_higher_taxon(store, &value, higher_rank)?;
                    store.assign_parent(parent.map(|(node, _)| node), created)?;
                    self.created += 1;
                    created
                }
            };
            parent = Some((next, higher_rank));
        }

        store.assign_parent(parent.map(|(node, _)| node), taxon)?;
        Ok(())
    }
}

impl<V: VerbatimRepository> NodeBatchProcessor for ClassificationApplier<'_, V> {
    type Error = NormalizerError;

    fn process(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let Some(classification) = store
            .usage(node)
            .and_then(|usage| usage.classification.clone())
            .filter(|classification| !classification.is_empty())
        else {
            return Ok(());
        };
        let Some(highest) = self.find_highest_parent(store, node) else {
            return Ok(());
        };
        if store.usage_rank(highest) == Rank::Kingdom {
            return Ok(());
        }
        self.apply(store, highest, classification)?;
        self.applied += 1;
        Ok(())
    }

    fn commit_batch(&mut self, _store: &mut GraphStore, counter: usize) -> NormalizerResult<()> {
        self.recorder.flush(self.verbatim)?;
        debug!("event=classification_batch module=normalizer status=ok processed={counter}");
        self.interrupt.check()
    }
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Turns denormalized classifications into parent relations.
    ///
    /// Does nothing unless the dataset mapped a denormalized classification.
    pub(super) fn apply_denormed_classification(&mut self) -> NormalizerResult<usize> {
        if !self.meta.denormed_classification_mapped {
            info!("event=classification module=normalizer status=skipped reason=not_mapped");
            return Ok(0);
        }
        let mut applier = ClassificationApplier {
            meta: &self.meta,
            recorder: &mut self.recorder,
            verbatim: &self.verbatim,
            interrupt: &self.interrupt,
            applied: 0,
            created: 0,
        };
        let processed = self
            .store
            .process(Label::Taxon, self.config.batch_size, &mut applier)?;
        info!(
            "event=classification module=normalizer status=ok processed={} applied={} created={}",
            processed, applier.applied, applier.created
        );
        Ok(applier.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::prepare_classification;
    use crate::model::classification::Classification;
    use crate::model::rank::Rank;

    fn fabaceae() -> Classification {
        Classification::new()
            .with(Rank::Kingdom, "Plantae")
            .with(Rank::Order, "Fabales")
            .with(Rank::Family, "Fabaceae")
    }

    #[test]
    fn own_name_and_rank_are_stripped_for_accepted_taxa() {
        let mut cl = fabaceae();
        let promoted = prepare_classification(&mut cl, Some("Fabaceae"), Rank::Family, false);
        assert_eq!(promoted, None);
        assert_eq!(cl.get(Rank::Family), None);
        assert_eq!(cl.lowest_existing_rank(), Some(Rank::Order));
    }

    #[test]
    fn unranked_taxon_is_promoted_to_matching_lowest_rank() {
        let mut cl = fabaceae();
        let promoted = prepare_classification(&mut cl, Some("fabaceae"), Rank::Unranked, false);
        assert_eq!(promoted, Some(Rank::Family));
        assert_eq!(cl.get(Rank::Family), None);
    }

    #[test]
    fn synonyms_lose_genus_and_below() {
        let mut cl = fabaceae()
            .with(Rank::Genus, "Acacia")
            .with(Rank::Species, "Acacia dealbata");
        prepare_classification(&mut cl, Some("Racosperma"), Rank::Genus, true);
        assert_eq!(cl.get(Rank::Genus), None);
        assert_eq!(cl.get(Rank::Species), None);
        assert_eq!(cl.get(Rank::Family), Some("Fabaceae"));
    }
}
