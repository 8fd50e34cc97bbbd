//! Post-pipeline validation: mandatory fields and cross-record diagnostics.

use super::issues::IssueRecorder;
use super::{Interrupt, NormalizerError, NormalizerResult, Normalizer};
use crate::graph::{GraphStore, Label, NodeBatchProcessor, NodeId, RelType};
use crate::model::issue::Issue;
use crate::model::name::Name;
use crate::model::rank::Rank;
use crate::model::verbatim::VerbatimKey;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use crate::service::name_validator::{has_unmatched_brackets, max_plausible_year, name_issues};
use log::{debug, error, info};

/// True if `year1` lies at least one full year before `year2`.
///
/// Unparsable years never compare as before.
pub(crate) fn is_before(year1: &str, year2: &str) -> bool {
    match (year1.trim().parse::<i32>(), year2.trim().parse::<i32>()) {
        (Ok(y1), Ok(y2)) => y1.checked_add(1).is_some_and(|next| next < y2),
        _ => false,
    }
}

struct Verifier<'a, V, F> {
    recorder: &'a mut IssueRecorder,
    verbatim: &'a V,
    references: &'a F,
    interrupt: &'a Interrupt,
    max_year: i32,
    flagged: usize,
}

impl<V: VerbatimRepository, F: ReferenceRepository> Verifier<'_, V, F> {
    fn require<T>(
        &self,
        value: Option<T>,
        entity: &'static str,
        field: &'static str,
        id: Option<&str>,
        verbatim_key: Option<VerbatimKey>,
    ) -> NormalizerResult<T> {
        if let Some(value) = value {
            return Ok(value);
        }
        let id = id.unwrap_or("<no id>").to_string();
        match verbatim_key.map(|key| self.verbatim.get(key)) {
            Some(Ok(Some(record))) => error!(
                "event=verify module=normalizer status=error error_code=missing_data entity={} field={} id={} verbatim={}",
                entity,
                field,
                id,
                record.to_string_complete()
            ),
            _ => error!(
                "event=verify module=normalizer status=error error_code=missing_data entity={entity} field={field} id={id} verbatim=none"
            ),
        }
        Err(NormalizerError::MissingData { entity, field, id })
    }

    fn broken_tree(&self, id: Option<&str>, reason: String) -> NormalizerError {
        let id = id.unwrap_or("<no id>");
        error!(
            "event=verify module=normalizer status=error error_code=assertion usage={id} reason=\"{reason}\""
        );
        NormalizerError::Assertion(format!("taxon {id} has {reason}"))
    }

    fn verify_name(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let Some(name) = store.name(node) else {
            return Ok(());
        };
        let id = name.id.as_deref();
        self.require(name.id.as_ref(), "name", "id", id, name.verbatim_key)?;
        self.require(name.origin, "name", "origin", id, name.verbatim_key)?;
        self.require(
            name.scientific_name.as_ref(),
            "name",
            "scientific_name",
            id,
            name.verbatim_key,
        )?;
        self.require(name.rank, "name", "rank", id, name.verbatim_key)?;
        self.require(name.name_type, "name", "name_type", id, name.verbatim_key)?;

        if name.verbatim_key.is_some() {
            for issue in name_issues(name, self.max_year) {
                self.flag_name(store, node, issue);
            }
        }
        Ok(())
    }

    fn verify_usage(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let Some(usage) = store.usage(node) else {
            return Ok(());
        };
        let id = usage.id.as_deref();
        let key = usage.verbatim_key;
        self.require(usage.id.as_ref(), "usage", "id", id, key)?;
        self.require(usage.origin, "usage", "origin", id, key)?;
        self.require(usage.status, "usage", "status", id, key)?;

        if usage.is_synonym() {
            if usage.has_synonym_data() {
                return Err(NormalizerError::Assertion(format!(
                    "synonym {} still carries descriptive data",
                    id.unwrap_or("<no id>")
                )));
            }
            return Ok(());
        }

        let parents = store.in_degree(node, RelType::ParentOf);
        if parents > 1 {
            return Err(self.broken_tree(id, format!("{parents} parents")));
        }
        if store.has_parent_cycle(node) {
            return Err(self.broken_tree(id, "a parent cycle above it".to_string()));
        }

        for vernacular in &usage.vernacular_names {
            let key = vernacular.verbatim_key.or(key);
            self.require(vernacular.name.as_ref(), "vernacular_name", "name", id, key)?;
        }
        for distribution in &usage.distributions {
            let key = distribution.verbatim_key.or(key);
            self.require(distribution.area.as_ref(), "distribution", "area", id, key)?;
        }
        for media in &usage.media {
            let key = media.verbatim_key.or(key);
            self.require(media.url.as_ref(), "media", "url", id, key)?;
        }
        for description in &usage.descriptions {
            let key = description.verbatim_key.or(key);
            self.require(description.text.as_ref(), "description", "text", id, key)?;
        }

        self.diagnose_taxon(store, node)
    }

    fn diagnose_taxon(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        let rank = store.usage_rank(node);
        if rank.not_other_or_unranked() {
            if let Some(parent) = store.parent_with_concrete_rank(node) {
                let parent_rank = store.usage_rank(parent);
                if rank == parent_rank || rank.higher_than(parent_rank) {
                    self.recorder
                        .usage(store, node, Issue::ClassificationRankOrderInvalid);
                    self.flagged += 1;
                }
            }
        }

        if !rank.is_species_or_below() {
            return Ok(());
        }
        let Some(name_node) = store.name_node_of(node) else {
            return Ok(());
        };

        if let Some(genus) = store.parent_with_rank(node, Rank::Genus) {
            let (Some(name), Some(genus_name)) = (store.name(name_node), store.name_of_usage(genus))
            else {
                return Ok(());
            };
            let mismatch =
                name.parsed && genus_name.parsed && name.genus != genus_name.uninomial;
            let before = self.published_before(name, genus_name)?;
            if mismatch {
                self.flag_name(store, name_node, Issue::ParentNameMismatch);
            }
            if before {
                self.flag_name(store, name_node, Issue::PublishedBeforeGenus);
            }
        }

        if rank.is_infraspecific() && store.parent_with_rank(node, Rank::Species).is_none() {
            self.flag_name(store, name_node, Issue::ParentSpeciesMissing);
        }
        Ok(())
    }

    /// Compares combination years, falling back to publication years of the
    /// cited references when either year is missing.
    fn published_before(&self, species: &Name, genus: &Name) -> NormalizerResult<bool> {
        if let (Some(y1), Some(y2)) = (
            species.combination_year.as_deref(),
            genus.combination_year.as_deref(),
        ) {
            return Ok(is_before(y1, y2));
        }
        let (Some(species_ref), Some(genus_ref)) = (
            species.published_in_id.as_deref(),
            genus.published_in_id.as_deref(),
        ) else {
            return Ok(false);
        };
        let species_year = self.references.get(species_ref)?.and_then(|r| r.year);
        let genus_year = self.references.get(genus_ref)?.and_then(|r| r.year);
        Ok(matches!((species_year, genus_year), (Some(y1), Some(y2)) if y1 < y2))
    }

    fn flag_name(&mut self, store: &mut GraphStore, node: NodeId, issue: Issue) {
        self.recorder.name(store, node, issue);
        self.flagged += 1;
    }

    fn checkpoint(&mut self, what: &str, counter: usize) -> NormalizerResult<()> {
        self.recorder.flush(self.verbatim)?;
        debug!("event=verify_batch module=normalizer status=ok records={what} processed={counter}");
        self.interrupt.check()
    }
}

/// Batch adapter running either the name or the usage checks.
struct Checks<'v, 'a, V, F> {
    verifier: &'v mut Verifier<'a, V, F>,
    names: bool,
}

impl<V: VerbatimRepository, F: ReferenceRepository> NodeBatchProcessor for Checks<'_, '_, V, F> {
    type Error = NormalizerError;

    fn process(&mut self, store: &mut GraphStore, node: NodeId) -> NormalizerResult<()> {
        if self.names {
            self.verifier.verify_name(store, node)
        } else {
            self.verifier.verify_usage(store, node)
        }
    }

    fn commit_batch(&mut self, _store: &mut GraphStore, counter: usize) -> NormalizerResult<()> {
        let what = if self.names { "names" } else { "usages" };
        self.verifier.checkpoint(what, counter)
    }
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    /// Fails on missing mandatory data and flags diagnostics.
    ///
    /// Returns the number of diagnostics flagged.
    ///
    /// # Errors
    /// - `MissingData` for an absent mandatory field.
    /// - `Assertion` for a synonym still carrying data, a taxon with more
    ///   than one parent, or a taxon without root above it.
    pub(super) fn verify(&mut self) -> NormalizerResult<usize> {
        let mut verifier = Verifier {
            recorder: &mut self.recorder,
            verbatim: &self.verbatim,
            references: &self.references,
            interrupt: &self.interrupt,
            max_year: max_plausible_year(),
            flagged: 0,
        };
        let batch_size = self.config.batch_size;
        let names = self.store.process(
            Label::Name,
            batch_size,
            &mut Checks {
                verifier: &mut verifier,
                names: true,
            },
        )?;
        let usages = self.store.process(
            Label::Usage,
            batch_size,
            &mut Checks {
                verifier: &mut verifier,
                names: false,
            },
        )?;

        let mut references = 0;
        for reference in self.references.list()? {
            if reference
                .citation
                .as_deref()
                .is_some_and(has_unmatched_brackets)
            {
                verifier
                    .recorder
                    .verbatim(reference.verbatim_key, Issue::UnmatchedReferenceBrackets);
                verifier.flagged += 1;
            }
            references += 1;
        }

        info!(
            "event=verify module=normalizer status=ok names={} usages={} references={} flagged={}",
            names, usages, references, verifier.flagged
        );
        Ok(verifier.flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::is_before;

    #[test]
    fn is_before_needs_a_full_year_gap() {
        assert!(is_before("1801", "1803"));
        assert!(!is_before("1802", "1803"));
        assert!(!is_before("1803", "1801"));
        assert!(!is_before("18O1", "1803"));
        assert!(!is_before("2147483647", "1900"));
        assert!(!is_before("1900", "2147483647x"));
        assert!(is_before("1900", "2147483647"));
    }
}
