mod common;

use common::{db, normalizer, GraphBuilder};
use taxotree_core::graph::{Label, RelType};
use taxotree_core::model::classification::Classification;
use taxotree_core::model::import_metadata::ImportMetadata;
use taxotree_core::model::issue::Issue;
use taxotree_core::model::name::Origin;
use taxotree_core::model::rank::Rank;
use taxotree_core::{NodeId, Step};

fn classify(graph: &mut GraphBuilder, usage: NodeId, classification: Classification) {
    graph.store.usage_mut(usage).unwrap().classification = Some(classification);
}

#[test]
fn own_family_entry_never_becomes_a_parent() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let fabaceae = graph.taxon("Fabaceae", Rank::Family);
    classify(
        &mut graph,
        fabaceae,
        Classification::new()
            .with(Rank::Kingdom, "Plantae")
            .with(Rank::Order, "Fabales")
            .with(Rank::Family, "Fabaceae"),
    );
    let meta = ImportMetadata::with_denormed_ranks([Rank::Kingdom, Rank::Order, Rank::Family]);

    let mut normalizer = normalizer(&conn, graph.store, meta);
    let applied = normalizer
        .run_step(Step::ApplyDenormedClassification)
        .unwrap();

    let store = normalizer.store();
    assert_eq!(applied, 1);
    assert!(store.find_edge(fabaceae, fabaceae, RelType::ParentOf).is_none());

    let order = store.parent_of(fabaceae).unwrap();
    assert_eq!(store.usage_rank(order), Rank::Order);
    assert_eq!(
        store.name_of_usage(order).unwrap().scientific_name.as_deref(),
        Some("Fabales")
    );
    assert_eq!(
        store.usage(order).unwrap().origin,
        Some(Origin::DenormedClassification)
    );
    assert!(store.usage(order).unwrap().id.as_deref().unwrap().starts_with('~'));

    let kingdom = store.parent_of(order).unwrap();
    assert_eq!(store.usage_rank(kingdom), Rank::Kingdom);
    assert_eq!(store.parent_of(kingdom), None);
    assert_eq!(store.usages_by_name("Fabaceae", None, None, false), vec![fabaceae]);
}

#[test]
fn consistent_higher_taxa_are_reused() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let family = graph.taxon("Pinaceae", Rank::Family);
    let abies = graph.taxon("Abies", Rank::Genus);
    let picea = graph.taxon("Picea", Rank::Genus);
    let plantae = Classification::new().with(Rank::Kingdom, "Plantae");
    classify(&mut graph, family, plantae.clone());
    for genus in [abies, picea] {
        classify(
            &mut graph,
            genus,
            plantae.clone().with(Rank::Family, "Pinaceae"),
        );
    }
    let meta = ImportMetadata::with_denormed_ranks([Rank::Kingdom, Rank::Family]);

    let mut normalizer = normalizer(&conn, graph.store, meta);
    let applied = normalizer
        .run_step(Step::ApplyDenormedClassification)
        .unwrap();

    let store = normalizer.store();
    assert_eq!(applied, 3);
    assert_eq!(store.parent_of(abies), Some(family));
    assert_eq!(store.parent_of(picea), Some(family));
    assert_eq!(store.usages_by_name("Plantae", None, None, false).len(), 1);
    assert_eq!(store.usages_by_name("Pinaceae", None, None, false), vec![family]);
}

#[test]
fn unranked_match_is_reused_and_ranked() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let plantae = graph.taxon("Plantae", Rank::Unranked);
    let abies = graph.taxon("Abies", Rank::Genus);
    classify(
        &mut graph,
        abies,
        Classification::new().with(Rank::Kingdom, "Plantae"),
    );
    let meta = ImportMetadata::with_denormed_ranks([Rank::Kingdom]);

    let mut normalizer = normalizer(&conn, graph.store, meta);
    normalizer
        .run_step(Step::ApplyDenormedClassification)
        .unwrap();

    let store = normalizer.store();
    assert_eq!(store.parent_of(abies), Some(plantae));
    assert_eq!(store.usage_rank(plantae), Rank::Kingdom);
}

#[test]
fn uncomparable_root_blocks_classification() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let root = graph.taxon("Incertae sedis", Rank::Unranked);
    let abies = graph.taxon("Abies", Rank::Genus);
    graph.parent(root, abies);
    classify(
        &mut graph,
        abies,
        Classification::new().with(Rank::Kingdom, "Plantae"),
    );
    let meta = ImportMetadata::with_denormed_ranks([Rank::Kingdom]);

    let mut normalizer = normalizer(&conn, graph.store, meta);
    let applied = normalizer
        .run_step(Step::ApplyDenormedClassification)
        .unwrap();

    let store = normalizer.store();
    assert_eq!(applied, 0);
    assert_eq!(store.parent_of(abies), Some(root));
    assert!(store
        .usage(abies)
        .unwrap()
        .issues
        .contains(&Issue::ClassificationNotApplied));
    assert!(store.usages_by_name("Plantae", None, None, false).is_empty());
}

#[test]
fn unmapped_classification_is_ignored() {
    let conn = db();
    let mut graph = GraphBuilder::new();
    let abies = graph.taxon("Abies", Rank::Genus);
    classify(
        &mut graph,
        abies,
        Classification::new().with(Rank::Kingdom, "Plantae"),
    );

    let mut normalizer = normalizer(&conn, graph.store, ImportMetadata::default());
    let applied = normalizer
        .run_step(Step::ApplyDenormedClassification)
        .unwrap();

    assert_eq!(applied, 0);
    assert_eq!(normalizer.store().nodes_with_label(Label::Taxon), vec![abies]);
}
