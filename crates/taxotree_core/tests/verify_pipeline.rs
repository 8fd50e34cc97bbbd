mod common;

use common::{config, db, normalizer, references, verbatim, GraphBuilder};
use std::collections::{BTreeMap, HashMap};
use taxotree_core::graph::{Label, RelType};
use taxotree_core::model::import_metadata::ImportMetadata;
use taxotree_core::model::issue::Issue;
use taxotree_core::model::name::Name;
use taxotree_core::model::name_match::{MatchType, NameMatch};
use taxotree_core::model::rank::Rank;
use taxotree_core::model::reference::Reference;
use taxotree_core::model::usage::{TaxonomicStatus, VernacularName};
use taxotree_core::model::verbatim::{NewVerbatimRecord, VerbatimKey, VerbatimRecord};
use taxotree_core::{
    Interrupt, NameIndex, Normalizer, NormalizerError, ReferenceRepository, RepoResult,
    SqliteVerbatimRepository, Step, VerbatimRepository,
};

struct MapIndex(HashMap<&'static str, i64>);

impl NameIndex for MapIndex {
    type Error = String;

    fn match_name(&mut self, name: &Name, _: bool, _: bool) -> Result<NameMatch, String> {
        Ok(name
            .scientific_name
            .as_deref()
            .and_then(|value| self.0.get(value))
            .map_or_else(NameMatch::none, |key| {
                NameMatch::matched(MatchType::Exact, *key)
            }))
    }
}

struct OfflineIndex;

impl NameIndex for OfflineIndex {
    type Error = String;

    fn match_name(&mut self, _: &Name, _: bool, _: bool) -> Result<NameMatch, String> {
        Err("index offline".to_string())
    }
}

/// Matches nothing and raises the interruption flag on call number `at`.
struct InterruptingIndex {
    interrupt: Interrupt,
    at: usize,
    calls: usize,
}

impl NameIndex for InterruptingIndex {
    type Error = String;

    fn match_name(&mut self, _: &Name, _: bool, _: bool) -> Result<NameMatch, String> {
        self.calls += 1;
        if self.calls == self.at {
            self.interrupt.interrupt();
        }
        Ok(NameMatch::none())
    }
}

/// Raises the interruption flag once the first raw record issues are written.
struct InterruptingVerbatim<'conn> {
    inner: SqliteVerbatimRepository<'conn>,
    interrupt: Interrupt,
}

impl VerbatimRepository for InterruptingVerbatim<'_> {
    fn insert(&self, record: &NewVerbatimRecord) -> RepoResult<VerbatimKey> {
        self.inner.insert(record)
    }

    fn get(&self, key: VerbatimKey) -> RepoResult<Option<VerbatimRecord>> {
        self.inner.get(key)
    }

    fn add_issues(&self, issues: &[(VerbatimKey, Issue)]) -> RepoResult<usize> {
        let written = self.inner.add_issues(issues)?;
        self.interrupt.interrupt();
        Ok(written)
    }

    fn issue_counts(&self) -> RepoResult<BTreeMap<Issue, u64>> {
        self.inner.issue_counts()
    }
}

#[test]
fn full_run_repairs_synonym_parent_and_marks_roots() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let accepted = graph.taxon("Abies", Rank::Genus);
    let synonym = graph.synonym("Pinus", Rank::Genus);
    let child = graph.taxon("Abies alba", Rank::Species);
    graph.synonym_of(synonym, accepted);
    graph.parent(synonym, child);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let report = normalizer.run().unwrap();

    assert_eq!(report.steps.len(), Step::ALL.len());
    assert_eq!(report.run_id, normalizer.run_id());
    assert_eq!(report.dataset_key, 1000);
    assert_eq!(report.changes(Step::PreferSynonymOverParentRel), Some(1));
    assert_eq!(report.changes(Step::SyncRoots), Some(1));
    assert_eq!(report.issue_count(Issue::SynonymParent), 1);
    assert!(report.matches.is_none());

    let store = normalizer.store();
    assert_eq!(store.parent_of(child), Some(accepted));
    assert!(store.has_label(accepted, Label::Root));
    assert!(!store.has_label(child, Label::Root));
    assert!(!store.has_label(synonym, Label::Root));
}

#[test]
fn missing_name_rank_aborts_the_run() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let taxon = graph.taxon("Abies alba", Rank::Species);
    let name_node = graph.name_node(taxon);
    graph
        .store
        .update_name(name_node, |name| name.rank = None)
        .unwrap();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    match normalizer.run().unwrap_err() {
        NormalizerError::MissingData { entity, field, .. } => {
            assert_eq!(entity, "name");
            assert_eq!(field, "rank");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn vernacular_name_without_name_is_missing_data() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let taxon = graph.taxon("Abies alba", Rank::Species);
    graph
        .store
        .usage_mut(taxon)
        .unwrap()
        .vernacular_names
        .push(VernacularName {
            language: Some("de".to_string()),
            ..VernacularName::default()
        });

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let err = normalizer.run_step(Step::Verify).unwrap_err();
    assert_eq!(err.code(), "missing_data");
    assert!(err.to_string().contains("vernacular_name"));
}

#[test]
fn synonym_still_holding_data_fails_verification() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let taxon = graph.taxon("Abies alba", Rank::Species);
    let synonym = graph.synonym("Pinus picea", Rank::Species);
    graph.synonym_of(synonym, taxon);
    graph
        .store
        .usage_mut(synonym)
        .unwrap()
        .bibliography
        .push("r1".to_string());

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let err = normalizer.run_step(Step::Verify).unwrap_err();
    assert!(matches!(err, NormalizerError::Assertion(_)));
}

#[test]
fn taxon_with_two_parents_fails_verification() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let pinaceae = graph.taxon("Pinaceae", Rank::Family);
    let cupressaceae = graph.taxon("Cupressaceae", Rank::Family);
    let abies = graph.taxon("Abies", Rank::Genus);
    graph.parent(pinaceae, abies);
    graph.parent(cupressaceae, abies);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let err = normalizer.run().unwrap_err();

    assert!(
        matches!(&err, NormalizerError::Assertion(message) if message.contains("2 parents")),
        "unexpected error: {err}"
    );
    assert_eq!(normalizer.store().in_degree(abies, RelType::ParentOf), 2);
}

#[test]
fn parent_cycle_without_root_fails_verification() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let pinaceae = graph.taxon("Pinaceae", Rank::Family);
    let abies = graph.taxon("Abies", Rank::Genus);
    let alba = graph.taxon("Abies alba", Rank::Species);
    graph.parent(pinaceae, abies);
    graph.parent(abies, pinaceae);
    graph.parent(abies, alba);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let err = normalizer.run().unwrap_err();

    assert!(
        matches!(&err, NormalizerError::Assertion(message) if message.contains("parent cycle")),
        "unexpected error: {err}"
    );
}

#[test]
fn far_future_year_is_unlikely_but_not_before_genus() {
    let conn = db();
    let repo = verbatim(&conn);
    let mut graph = GraphBuilder::new();
    let genus = graph.taxon("Abies", Rank::Genus);
    let species = graph.taxon("Abies alba", Rank::Species);
    graph.parent(genus, species);
    graph.backed(&repo, species);
    let genus_name = graph.name_node(genus);
    let species_name = graph.name_node(species);
    graph
        .store
        .update_name(genus_name, |name| {
            name.combination_year = Some("1900".to_string())
        })
        .unwrap();
    graph
        .store
        .update_name(species_name, |name| {
            name.combination_year = Some(i32::MAX.to_string())
        })
        .unwrap();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    normalizer.run_step(Step::Verify).unwrap();

    let issues = &normalizer.store().name(species_name).unwrap().issues;
    assert!(issues.contains(&Issue::UnlikelyYear));
    assert!(!issues.contains(&Issue::PublishedBeforeGenus));
}

#[test]
fn species_under_foreign_genus_is_flagged() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let genus = graph.taxon("Picea", Rank::Genus);
    let species = graph.taxon("Abies alba", Rank::Species);
    graph.parent(genus, species);
    let genus_name = graph.name_node(genus);
    let species_name = graph.name_node(species);
    graph
        .store
        .update_name(genus_name, |name| {
            name.combination_year = Some("1820".to_string())
        })
        .unwrap();
    graph
        .store
        .update_name(species_name, |name| {
            name.combination_year = Some("1801".to_string())
        })
        .unwrap();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let flagged = normalizer.run_step(Step::Verify).unwrap();

    let issues = &normalizer.store().name(species_name).unwrap().issues;
    assert_eq!(flagged, 2);
    assert!(issues.contains(&Issue::ParentNameMismatch));
    assert!(issues.contains(&Issue::PublishedBeforeGenus));
}

#[test]
fn publication_years_of_references_are_the_fallback() {
    let conn = db();
    let refs = references(&conn);
    for (id, year) in [("r-species", 1790), ("r-genus", 1800)] {
        let mut reference = Reference::new(id, format!("Smith, J. ({year}). Flora."));
        reference.year = Some(year);
        refs.insert(&reference).unwrap();
    }

    let mut graph = GraphBuilder::new();
    let genus = graph.taxon("Abies", Rank::Genus);
    let species = graph.taxon("Abies alba", Rank::Species);
    graph.parent(genus, species);
    let genus_name = graph.name_node(genus);
    let species_name = graph.name_node(species);
    graph
        .store
        .update_name(genus_name, |name| {
            name.published_in_id = Some("r-genus".to_string())
        })
        .unwrap();
    graph
        .store
        .update_name(species_name, |name| {
            name.published_in_id = Some("r-species".to_string())
        })
        .unwrap();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    normalizer.run_step(Step::Verify).unwrap();

    let issues = &normalizer.store().name(species_name).unwrap().issues;
    assert_eq!(
        issues.iter().copied().collect::<Vec<_>>(),
        vec![Issue::PublishedBeforeGenus]
    );
}

#[test]
fn rank_order_and_missing_species_are_flagged() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let genus = graph.taxon("Abies", Rank::Genus);
    let family = graph.taxon("Pinaceae", Rank::Family);
    let subspecies = graph.taxon("Abies alba nana", Rank::Subspecies);
    graph.parent(genus, family);
    graph.parent(genus, subspecies);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    normalizer.run_step(Step::Verify).unwrap();

    let store = normalizer.store();
    assert!(store
        .usage(family)
        .unwrap()
        .issues
        .contains(&Issue::ClassificationRankOrderInvalid));
    let subspecies_name = store.name_node_of(subspecies).unwrap();
    assert!(store
        .name(subspecies_name)
        .unwrap()
        .issues
        .contains(&Issue::ParentSpeciesMissing));
}

#[test]
fn raw_backed_names_and_citations_are_checked() {
    let conn = db();
    let repo = verbatim(&conn);
    let refs = references(&conn);
    let mut graph = GraphBuilder::new();
    let taxon = graph.taxon("Abies alba", Rank::Species);
    let name_key = graph.backed(&repo, taxon);
    let name_node = graph.name_node(taxon);
    graph
        .store
        .update_name(name_node, |name| {
            name.authorship = Some("Mill.".to_string());
            name.combination_year = Some("1699".to_string());
        })
        .unwrap();

    let citation_key = repo
        .insert(&taxotree_core::model::verbatim::NewVerbatimRecord::new(
            "Reference.tsv",
            2,
        ))
        .unwrap();
    let mut reference = Reference::new("r1", "Miller, P. (1768. The gardeners dictionary.");
    reference.verbatim_key = Some(citation_key);
    refs.insert(&reference).unwrap();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let report = normalizer.run().unwrap();

    assert_eq!(report.issue_count(Issue::UnlikelyYear), 1);
    assert_eq!(report.issue_count(Issue::UnmatchedReferenceBrackets), 1);
    let name_record = repo.get(name_key).unwrap().unwrap();
    assert!(name_record.issues.contains(&Issue::UnlikelyYear));
    let citation_record = repo.get(citation_key).unwrap().unwrap();
    assert!(citation_record
        .issues
        .contains(&Issue::UnmatchedReferenceBrackets));
    assert_eq!(repo.issue_counts().unwrap().get(&Issue::UnlikelyYear), Some(&1));
}

#[test]
fn interrupted_run_is_cancelled_before_any_step() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let a = graph.synonym("Pinus alba", Rank::Species);
    let b = graph.synonym("Pinus nobilis", Rank::Species);
    graph.synonym_of(a, b);
    graph.synonym_of(b, a);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    normalizer.interrupt_handle().interrupt();
    let err = normalizer.run().unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(normalizer.store().edge_count(), 4);
    assert_eq!(normalizer.store().out_degree(a, RelType::SynonymOf), 1);
}

#[test]
fn interrupt_during_matching_stops_at_the_batch_boundary() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let taxa: Vec<_> = ["Abies", "Picea", "Pinus", "Larix", "Cedrus", "Tsuga"]
        .into_iter()
        .map(|genus| graph.taxon(genus, Rank::Genus))
        .collect();
    let names: Vec<_> = taxa.iter().map(|taxon| graph.name_node(*taxon)).collect();

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let mut index = InterruptingIndex {
        interrupt: normalizer.interrupt_handle(),
        at: 3,
        calls: 0,
    };
    let err = normalizer.run_with_index(&mut index).unwrap_err();

    assert!(err.is_cancelled());
    // the batch holding the third call completes, later batches never start
    assert_eq!(index.calls, 4);
    let store = normalizer.store();
    for name in &names[..4] {
        assert_eq!(
            store.name(*name).unwrap().names_index_match_type,
            Some(MatchType::None)
        );
    }
    for name in &names[4..] {
        assert_eq!(store.name(*name).unwrap().names_index_match_type, None);
    }
}

#[test]
fn interrupt_inside_a_step_skips_later_batches_and_steps() {
    let conn = db();
    let repo = verbatim(&conn);
    let mut graph = GraphBuilder::new();
    let t1 = graph.taxon("Abies alba", Rank::Species);
    let t2 = graph.taxon("Abies nobilis", Rank::Species);
    let mut keys = Vec::new();
    let mut synonyms = Vec::new();
    for name in ["Pinus picea", "Pinus alba", "Pinus nobilis"] {
        let synonym = graph.synonym(name, Rank::Species);
        graph.synonym_of(synonym, t1);
        graph.synonym_of(synonym, t2);
        keys.push(graph.backed(&repo, synonym));
        synonyms.push(synonym);
    }
    let orphan = graph.synonym("Larix alba", Rank::Species);

    let interrupt = Interrupt::new();
    let mut normalizer = Normalizer::new(
        graph.store,
        InterruptingVerbatim {
            inner: verbatim(&conn),
            interrupt: interrupt.clone(),
        },
        references(&conn),
        ImportMetadata::default(),
        config(),
    )
    .with_interrupt(interrupt);
    let mut index = MapIndex(HashMap::new());
    let err = normalizer.run_with_index(&mut index).unwrap_err();
    assert!(err.is_cancelled());

    let store = normalizer.store();
    let status = |node| store.usage(node).unwrap().status;
    assert_eq!(status(synonyms[0]), Some(TaxonomicStatus::AmbiguousSynonym));
    assert_eq!(status(synonyms[1]), Some(TaxonomicStatus::AmbiguousSynonym));
    assert_eq!(status(synonyms[2]), Some(TaxonomicStatus::Synonym));
    // orphan removal, root sync and matching never ran
    assert!(store.contains(orphan));
    assert!(!store.has_label(t1, Label::Root));
    assert!(store
        .name_of_usage(t1)
        .unwrap()
        .names_index_match_type
        .is_none());

    let flagged: Vec<bool> = keys
        .iter()
        .map(|key| {
            repo.get(*key)
                .unwrap()
                .unwrap()
                .issues
                .contains(&Issue::DerivedTaxonomicStatus)
        })
        .collect();
    assert_eq!(flagged, vec![true, true, false]);
}

#[test]
fn matching_counts_types_and_flags_duplicates() {
    let conn = db();
    let repo = verbatim(&conn);
    let mut graph = GraphBuilder::new();
    let genus = graph.taxon("Picea", Rank::Genus);
    let first = graph.taxon("Abies alba", Rank::Species);
    let second = graph.taxon("Abies albus", Rank::Species);
    let first_key = graph.backed(&repo, first);
    let second_key = graph.backed(&repo, second);
    let genus_name = graph.name_node(genus);
    let first_name = graph.name_node(first);

    let mut index = MapIndex(HashMap::from([("Abies alba", 7), ("Abies albus", 7)]));
    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let report = normalizer.run_with_index(&mut index).unwrap();

    let matches = report.matches.as_ref().unwrap();
    assert_eq!(matches.len(), MatchType::ALL.len());
    assert_eq!(matches[&MatchType::Exact], 2);
    assert_eq!(matches[&MatchType::None], 1);
    assert_eq!(matches[&MatchType::Variant], 0);
    assert_eq!(report.issue_count(Issue::DuplicateName), 2);

    let store = normalizer.store();
    assert_eq!(store.name(first_name).unwrap().names_index_id, Some(7));
    assert_eq!(
        store.name(genus_name).unwrap().names_index_match_type,
        Some(MatchType::None)
    );
    for key in [first_key, second_key] {
        let record = repo.get(key).unwrap().unwrap();
        assert!(record.issues.contains(&Issue::DuplicateName));
    }
}

#[test]
fn index_failure_aborts_matching() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    graph.taxon("Abies alba", Rank::Species);

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let err = normalizer.run_with_index(&mut OfflineIndex).unwrap_err();
    assert!(matches!(err, NormalizerError::NameIndex(message) if message == "index offline"));
}
