//! Graph sanitization pipeline for one dataset.
//!
//! # Responsibility
//! - Repair synonym cycles and chains, synonyms used as parents, redundant
//!   name relations and basionym chains.
//! - Rectify taxonomic status, rebuild denormalized classifications, drop
//!   orphan synonyms and move synonym data to accepted taxa.
//! - Verify mandatory fields and flag cross-record diagnostics.
//!
//! # Invariants
//! - Steps run strictly in [`Step::ALL`] order, single threaded.
//! - Cancellation is observed before the run, between steps and at every
//!   batch checkpoint.
//! - Every automatic repair is recorded as an [`Issue`].

mod basionyms;
mod classification;
mod error;
mod issues;
mod matching;
mod status;
mod synonyms;
mod verify;

pub use error::{NormalizerError, NormalizerResult};
pub use matching::NameIndex;

use crate::config::NormalizerConfig;
use crate::graph::GraphStore;
use crate::model::import_metadata::ImportMetadata;
use crate::model::issue::Issue;
use crate::model::name_match::MatchType;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::verbatim_repo::VerbatimRepository;
use issues::IssueRecorder;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Externally settable interruption flag.
///
/// Clones share one flag, so the caller keeps a handle while the run owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> NormalizerResult<()> {
        if self.is_interrupted() {
            return Err(NormalizerError::Cancelled);
        }
        Ok(())
    }
}

/// Top-level pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CutSynonymCycles,
    RelinkSynonymChains,
    PreferSynonymOverParentRel,
    ReduceRedundantNameRels,
    CutBasionymChains,
    RectifyTaxonomicStatus,
    ApplyDenormedClassification,
    RemoveOrphanSynonyms,
    MoveSynonymData,
    SyncRoots,
    Verify,
}

impl Step {
    /// Execution order.
    pub const ALL: [Step; 11] = [
        Self::CutSynonymCycles,
        Self::RelinkSynonymChains,
        Self::PreferSynonymOverParentRel,
        Self::ReduceRedundantNameRels,
        Self::CutBasionymChains,
        Self::RectifyTaxonomicStatus,
        Self::ApplyDenormedClassification,
        Self::RemoveOrphanSynonyms,
        Self::MoveSynonymData,
        Self::SyncRoots,
        Self::Verify,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CutSynonymCycles => "cut_synonym_cycles",
            Self::RelinkSynonymChains => "relink_synonym_chains",
            Self::PreferSynonymOverParentRel => "prefer_synonym_over_parent_rel",
            Self::ReduceRedundantNameRels => "reduce_redundant_name_rels",
            Self::CutBasionymChains => "cut_basionym_chains",
            Self::RectifyTaxonomicStatus => "rectify_taxonomic_status",
            Self::ApplyDenormedClassification => "apply_denormed_classification",
            Self::RemoveOrphanSynonyms => "remove_orphan_synonyms",
            Self::MoveSynonymData => "move_synonym_data",
            Self::SyncRoots => "sync_roots",
            Self::Verify => "verify",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter of one executed step.
///
/// `changes` counts the repairs for sanitizing steps, the roots for
/// `sync_roots` and the flagged records for `verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub changes: usize,
}

/// Summary of one normalization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub run_id: Uuid,
    pub dataset_key: i64,
    pub steps: Vec<StepReport>,
    /// Issues raised during this run, including repeats on one entity.
    pub issues: BTreeMap<Issue, u64>,
    pub matches: Option<BTreeMap<MatchType, usize>>,
}

impl NormalizationReport {
    pub fn changes(&self, step: Step) -> Option<usize> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| report.changes)
    }

    pub fn issue_count(&self, issue: Issue) -> u64 {
        self.issues.get(&issue).copied().unwrap_or(0)
    }
}

/// Sanitizes one dataset graph in place.
pub struct Normalizer<V: VerbatimRepository, F: ReferenceRepository> {
    store: GraphStore,
    verbatim: V,
    references: F,
    meta: ImportMetadata,
    config: NormalizerConfig,
    interrupt: Interrupt,
    recorder: IssueRecorder,
    run_id: Uuid,
}

impl<V: VerbatimRepository, F: ReferenceRepository> Normalizer<V, F> {
    pub fn new(
        store: GraphStore,
        verbatim: V,
        references: F,
        meta: ImportMetadata,
        config: NormalizerConfig,
    ) -> Self {
        Self {
            store,
            verbatim,
            references,
            meta,
            config,
            interrupt: Interrupt::new(),
            recorder: IssueRecorder::default(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Uses a caller-owned interruption flag.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Runs all steps in order.
    ///
    /// # Errors
    /// - `Cancelled` when the interruption flag is observed.
    /// - `Assertion` or `MissingData` when the graph cannot be sanitized.
    pub fn run(&mut self) -> NormalizerResult<NormalizationReport> {
        self.run_logged(None::<&mut matching::NoIndex>)
    }

    /// Runs all steps, then matches every name against `index`.
    pub fn run_with_index<I: NameIndex>(
        &mut self,
        index: &mut I,
    ) -> NormalizerResult<NormalizationReport> {
        self.run_logged(Some(index))
    }

    fn run_logged<I: NameIndex>(
        &mut self,
        index: Option<&mut I>,
    ) -> NormalizerResult<NormalizationReport> {
        let started_at = Instant::now();
        info!(
            "event=normalize module=normalizer status=start run_id={} dataset_key={} nodes={} edges={}",
            self.run_id,
            self.config.dataset_key,
            self.store.node_count(),
            self.store.edge_count()
        );

        match self.run_steps(index) {
            Ok(report) => {
                info!(
                    "event=normalize module=normalizer status=ok run_id={} dataset_key={} duration_ms={} issues={}",
                    self.run_id,
                    self.config.dataset_key,
                    started_at.elapsed().as_millis(),
                    report.issues.values().sum::<u64>()
                );
                Ok(report)
            }
            Err(err) if err.is_cancelled() => {
                warn!(
                    "event=normalize module=normalizer status=cancelled run_id={} dataset_key={} duration_ms={}",
                    self.run_id,
                    self.config.dataset_key,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
            Err(err) => {
                error!(
                    "event=normalize module=normalizer status=error run_id={} dataset_key={} duration_ms={} error_code={} error={}",
                    self.run_id,
                    self.config.dataset_key,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_steps<I: NameIndex>(
        &mut self,
        index: Option<&mut I>,
    ) -> NormalizerResult<NormalizationReport> {
        let mut report = NormalizationReport {
            run_id: self.run_id,
            dataset_key: self.config.dataset_key,
            steps: Vec::with_capacity(Step::ALL.len()),
            issues: BTreeMap::new(),
            matches: None,
        };

        for step in Step::ALL {
            self.interrupt.check()?;
            let changes = self.run_step(step)?;
            report.steps.push(StepReport { step, changes });
        }

        if let Some(index) = index {
            self.interrupt.check()?;
            report.matches = Some(self.match_and_count(index)?);
        }

        report.issues = self.recorder.counts().clone();
        Ok(report)
    }

    /// Runs a single step and flushes its raw record issues.
    ///
    /// Steps assume the invariants of all earlier steps; callers running
    /// steps out of order get no guarantees.
    pub fn run_step(&mut self, step: Step) -> NormalizerResult<usize> {
        let started_at = Instant::now();
        let changes = match step {
            Step::CutSynonymCycles => self.cut_synonym_cycles()?,
            Step::RelinkSynonymChains => self.relink_synonym_chains()?,
            Step::PreferSynonymOverParentRel => self.prefer_synonym_over_parent_rel()?,
            Step::ReduceRedundantNameRels => self.reduce_redundant_name_rels()?,
            Step::CutBasionymChains => self.cut_basionym_chains()?,
            Step::RectifyTaxonomicStatus => self.rectify_taxonomic_status()?,
            Step::ApplyDenormedClassification => self.apply_denormed_classification()?,
            Step::RemoveOrphanSynonyms => self.remove_orphan_synonyms()?,
            Step::MoveSynonymData => self.move_synonym_data()?,
            Step::SyncRoots => self.store.sync_roots(),
            Step::Verify => self.verify()?,
        };
        self.recorder.flush(&self.verbatim)?;
        info!(
            "event=normalize_step module=normalizer status=ok run_id={} step={} changes={} duration_ms={}",
            self.run_id,
            step,
            changes,
            started_at.elapsed().as_millis()
        );
        Ok(changes)
    }
}
