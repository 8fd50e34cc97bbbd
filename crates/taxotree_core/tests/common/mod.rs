#![allow(dead_code)]

use rusqlite::Connection;
use taxotree_core::graph::{GraphStore, NodeId, RelType};
use taxotree_core::model::import_metadata::ImportMetadata;
use taxotree_core::model::name::{Name, NameType, Origin};
use taxotree_core::model::rank::Rank;
use taxotree_core::model::usage::Usage;
use taxotree_core::model::verbatim::{NewVerbatimRecord, VerbatimKey};
use taxotree_core::{
    open_db_in_memory, Normalizer, NormalizerConfig, SqliteReferenceRepository,
    SqliteVerbatimRepository, VerbatimRepository,
};

pub type SqliteNormalizer<'conn> =
    Normalizer<SqliteVerbatimRepository<'conn>, SqliteReferenceRepository<'conn>>;

pub fn db() -> Connection {
    open_db_in_memory().unwrap()
}

/// Complete name with every mandatory field set.
pub fn name(scientific_name: &str, rank: Rank) -> Name {
    let mut parts = scientific_name.split_whitespace();
    let first = parts.next().unwrap_or_default();
    let mut name = match (parts.next(), parts.next()) {
        (Some(epithet), infraspecific) => Name::species(first, epithet, infraspecific, rank),
        (None, _) => Name::uninomial(first, rank),
    };
    name.origin = Some(Origin::Source);
    name.name_type = Some(NameType::Scientific);
    name
}

pub struct GraphBuilder {
    pub store: GraphStore,
    seq: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            store: GraphStore::new(),
            seq: 0,
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}{}", self.seq)
    }

    pub fn add(&mut self, mut name: Name, mut usage: Usage) -> NodeId {
        if name.id.is_none() {
            name.id = Some(self.next("n"));
        }
        if usage.id.is_none() {
            usage.id = Some(self.next("u"));
        }
        let (_, usage_node) = self.store.create_name_and_usage(name, usage).unwrap();
        usage_node
    }

    pub fn taxon(&mut self, scientific_name: &str, rank: Rank) -> NodeId {
        let id = self.next("t");
        self.add(name(scientific_name, rank), Usage::taxon(id))
    }

    pub fn synonym(&mut self, scientific_name: &str, rank: Rank) -> NodeId {
        let id = self.next("s");
        self.add(name(scientific_name, rank), Usage::synonym(id))
    }

    pub fn parent(&mut self, parent: NodeId, child: NodeId) {
        self.store.relate(parent, child, RelType::ParentOf).unwrap();
    }

    pub fn synonym_of(&mut self, synonym: NodeId, accepted: NodeId) {
        self.store
            .relate(synonym, accepted, RelType::SynonymOf)
            .unwrap();
    }

    pub fn name_node(&self, usage: NodeId) -> NodeId {
        self.store.name_node_of(usage).unwrap()
    }

    /// Backs the usage and its name by a fresh raw record.
    pub fn backed(&mut self, repo: &impl VerbatimRepository, usage: NodeId) -> VerbatimKey {
        let label = self.store.usage_label(usage);
        let record = NewVerbatimRecord::new("NameUsage.tsv", usage.index() as i64)
            .with_term("col:scientificName", label);
        let key = repo.insert(&record).unwrap();
        self.store.usage_mut(usage).unwrap().verbatim_key = Some(key);
        let name_node = self.name_node(usage);
        self.store
            .update_name(name_node, |name| name.verbatim_key = Some(key))
            .unwrap();
        key
    }
}

pub fn config() -> NormalizerConfig {
    NormalizerConfig {
        batch_size: 2,
        ..NormalizerConfig::for_dataset(1000)
    }
}

pub fn normalizer(
    conn: &Connection,
    store: GraphStore,
    meta: ImportMetadata,
) -> SqliteNormalizer<'_> {
    Normalizer::new(
        store,
        SqliteVerbatimRepository::try_new(conn).unwrap(),
        SqliteReferenceRepository::try_new(conn).unwrap(),
        meta,
        config(),
    )
}

pub fn verbatim(conn: &Connection) -> SqliteVerbatimRepository<'_> {
    SqliteVerbatimRepository::try_new(conn).unwrap()
}

pub fn references(conn: &Connection) -> SqliteReferenceRepository<'_> {
    SqliteReferenceRepository::try_new(conn).unwrap()
}
