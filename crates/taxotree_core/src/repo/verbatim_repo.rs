//! Raw record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store raw source records with their term maps.
//! - Record issue sets per raw record, written in batches.
//!
//! # Invariants
//! - Issue writes are idempotent: a record holds each issue at most once.
//! - Issues for unknown record keys are dropped with a warning, never stored.

use crate::model::issue::Issue;
use crate::model::verbatim::{NewVerbatimRecord, VerbatimKey, VerbatimRecord};
use crate::repo::schema_guard::ensure_connection_ready;
use crate::repo::{RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};

/// Repository interface for raw source records and their issues.
pub trait VerbatimRepository {
    fn insert(&self, record: &NewVerbatimRecord) -> RepoResult<VerbatimKey>;
    fn get(&self, key: VerbatimKey) -> RepoResult<Option<VerbatimRecord>>;
    /// Adds all issues in one transaction. Returns the number of new rows.
    fn add_issues(&self, issues: &[(VerbatimKey, Issue)]) -> RepoResult<usize>;
    /// Number of flagged records per issue.
    fn issue_counts(&self) -> RepoResult<BTreeMap<Issue, u64>>;
}

/// SQLite-backed raw record repository.
pub struct SqliteVerbatimRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVerbatimRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "verbatim_records",
            &["verbatim_key", "source_file", "line", "terms_json"],
        )?;
        ensure_connection_ready(conn, "verbatim_issues", &["verbatim_key", "issue"])?;
        Ok(Self { conn })
    }
}

impl VerbatimRepository for SqliteVerbatimRepository<'_> {
    fn insert(&self, record: &NewVerbatimRecord) -> RepoResult<VerbatimKey> {
        let terms_json = serde_json::to_string(&record.terms)
            .map_err(|err| RepoError::InvalidData(format!("unserializable terms: {err}")))?;
        self.conn.execute(
            "INSERT INTO verbatim_records (source_file, line, terms_json)
             VALUES (?1, ?2, ?3);",
            params![record.source_file.as_str(), record.line, terms_json],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, key: VerbatimKey) -> RepoResult<Option<VerbatimRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT source_file, line, terms_json
                 FROM verbatim_records
                 WHERE verbatim_key = ?1;",
                [key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((source_file, line, terms_json)) = row else {
            return Ok(None);
        };
        let terms: BTreeMap<String, String> = serde_json::from_str(&terms_json).map_err(|err| {
            RepoError::InvalidData(format!("invalid terms_json for record {key}: {err}"))
        })?;

        Ok(Some(VerbatimRecord {
            key,
            source_file,
            line,
            terms,
            issues: load_issues(self.conn, key)?,
        }))
    }

    fn add_issues(&self, issues: &[(VerbatimKey, Issue)]) -> RepoResult<usize> {
        if issues.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        let mut missing = 0;
        {
            let mut exists = tx.prepare_cached(
                "SELECT EXISTS(SELECT 1 FROM verbatim_records WHERE verbatim_key = ?1);",
            )?;
            let mut insert = tx.prepare_cached(
                "INSERT OR IGNORE INTO verbatim_issues (verbatim_key, issue) VALUES (?1, ?2);",
            )?;
            for (key, issue) in issues {
                let present: i64 = exists.query_row([key], |row| row.get(0))?;
                if present == 0 {
                    missing += 1;
                    continue;
                }
                inserted += insert.execute(params![key, issue.as_str()])?;
            }
        }
        tx.commit()?;

        if missing > 0 {
            warn!("event=verbatim_issues module=repo status=partial missing_records={missing}");
        }
        Ok(inserted)
    }

    fn issue_counts(&self) -> RepoResult<BTreeMap<Issue, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT issue, COUNT(*)
             FROM verbatim_issues
             GROUP BY issue;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let code: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            counts.insert(parse_issue(&code)?, count as u64);
        }
        Ok(counts)
    }
}

fn load_issues(conn: &Connection, key: VerbatimKey) -> RepoResult<BTreeSet<Issue>> {
    let mut stmt = conn.prepare_cached(
        "SELECT issue FROM verbatim_issues WHERE verbatim_key = ?1 ORDER BY issue ASC;",
    )?;
    let mut rows = stmt.query([key])?;
    let mut issues = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let code: String = row.get(0)?;
        issues.insert(parse_issue(&code)?);
    }
    Ok(issues)
}

fn parse_issue(code: &str) -> RepoResult<Issue> {
    Issue::parse(code).ok_or_else(|| RepoError::InvalidData(format!("unknown issue `{code}`")))
}
