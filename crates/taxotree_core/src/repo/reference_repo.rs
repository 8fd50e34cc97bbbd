//! Reference repository contracts and SQLite implementation.

use crate::model::reference::Reference;
use crate::repo::schema_guard::ensure_connection_ready;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

const REFERENCE_SELECT_SQL: &str = "SELECT
    ref_id,
    citation,
    year,
    verbatim_key
FROM dataset_references";

/// Repository interface for dataset references.
pub trait ReferenceRepository {
    fn insert(&self, reference: &Reference) -> RepoResult<()>;
    fn get(&self, id: &str) -> RepoResult<Option<Reference>>;
    /// All references ordered by id.
    fn list(&self) -> RepoResult<Vec<Reference>>;
}

/// SQLite-backed reference repository.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "dataset_references",
            &["ref_id", "citation", "year", "verbatim_key"],
        )?;
        Ok(Self { conn })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn insert(&self, reference: &Reference) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO dataset_references (ref_id, citation, year, verbatim_key)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                reference.id.as_str(),
                reference.citation.as_deref(),
                reference.year,
                reference.verbatim_key,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> RepoResult<Option<Reference>> {
        let reference = self
            .conn
            .query_row(
                &format!("{REFERENCE_SELECT_SQL} WHERE ref_id = ?1;"),
                [id],
                parse_reference_row,
            )
            .optional()?;
        Ok(reference)
    }

    fn list(&self) -> RepoResult<Vec<Reference>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REFERENCE_SELECT_SQL} ORDER BY ref_id ASC;"))?;
        let references = stmt
            .query_map([], parse_reference_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(references)
    }
}

fn parse_reference_row(row: &Row<'_>) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: row.get(0)?,
        citation: row.get(1)?,
        year: row.get(2)?,
        verbatim_key: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{ReferenceRepository, SqliteReferenceRepository};
    use crate::db::open_db_in_memory;
    use crate::model::reference::Reference;

    #[test]
    fn list_returns_references_ordered_by_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteReferenceRepository::try_new(&conn).unwrap();
        let mut late = Reference::new("r2", "Smith, J. (1901). Flora.");
        late.year = Some(1901);
        repo.insert(&late).unwrap();
        repo.insert(&Reference::new("r1", "Linnaeus (1753")).unwrap();

        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r1".to_string(), "r2".to_string()]);
        assert_eq!(repo.get("r2").unwrap().and_then(|r| r.year), Some(1901));
        assert!(repo.get("missing").unwrap().is_none());
    }
}
