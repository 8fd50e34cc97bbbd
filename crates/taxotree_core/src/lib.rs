//! Graph sanitization core for taxonomic checklist imports.
//! This crate owns the repair passes and the invariants they guarantee.

pub mod config;
pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, NormalizerConfig, DEFAULT_BATCH_SIZE};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use graph::{GraphStore, Label, NodeId, RelType, StoreError};
pub use logging::{active_logging, init_logging, LogLevel, LogSetup, LoggingError};
pub use repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
pub use repo::verbatim_repo::{SqliteVerbatimRepository, VerbatimRepository};
pub use repo::{RepoError, RepoResult};
pub use service::normalizer::{
    Interrupt, NameIndex, NormalizationReport, Normalizer, NormalizerError, NormalizerResult,
    Step, StepReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
