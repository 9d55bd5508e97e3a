use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::{FunctionRow, HarvestRunRecord, HarvestRunStatus};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for corpus database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed corpus database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
#[derive(Debug)]
pub struct CorpusDb {
    conn: Connection,
}

impl CorpusDb {
    /// Open (or create) a corpus database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or update a function row, keyed by name, and return its row id.
    ///
    /// Re-registering an existing function refreshes its path and hash but
    /// keeps the original `added_at`.
    pub fn upsert_function(&self, record: &FunctionRow) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO functions (fname, source_path, source_hash, added_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(fname) DO UPDATE SET
                source_path = excluded.source_path,
                source_hash = excluded.source_hash
            "#,
            params![record.fname, record.source_path, record.source_hash, record.added_at],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM functions WHERE fname = ?1",
            params![record.fname],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Load one function row by name, if present.
    pub fn get_function(&self, fname: &str) -> DbResult<Option<FunctionRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fname, source_path, source_hash, added_at
            FROM functions
            WHERE fname = ?1
            "#,
        )?;
        let mut rows = stmt.query(params![fname])?;
        if let Some(row) = rows.next()? {
            Ok(Some(FunctionRow {
                fname: row.get(0)?,
                source_path: row.get(1)?,
                source_hash: row.get(2)?,
                added_at: row.get(3)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// List all functions (ordered by id).
    pub fn list_functions(&self) -> DbResult<Vec<FunctionRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT fname, source_path, source_hash, added_at
            FROM functions
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FunctionRow {
                fname: row.get(0)?,
                source_path: row.get(1)?,
                source_hash: row.get(2)?,
                added_at: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert a harvest run record and return its row id.
    pub fn insert_harvest_run(&self, record: &HarvestRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO harvest_runs (fname, source_hash, n_attempted, n_succeeded, n_failed, n_skipped, status, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.fname,
                record.source_hash,
                record.n_attempted,
                record.n_succeeded,
                record.n_failed,
                record.n_skipped,
                record.status.as_str(),
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List harvest runs, optionally filtered by function name.
    pub fn list_harvest_runs(&self, fname: Option<&str>) -> DbResult<Vec<HarvestRunRecord>> {
        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<HarvestRunRecord> {
            Ok(HarvestRunRecord {
                fname: row.get(0)?,
                source_hash: row.get(1)?,
                n_attempted: row.get(2)?,
                n_succeeded: row.get(3)?,
                n_failed: row.get(4)?,
                n_skipped: row.get(5)?,
                status: {
                    let s: String = row.get(6)?;
                    s.parse::<HarvestRunStatusString>()?.0
                },
                started_at: row.get(7)?,
                finished_at: row.get(8)?,
            })
        }

        let mut stmt = if fname.is_some() {
            self.conn.prepare(
                r#"
                SELECT fname, source_hash, n_attempted, n_succeeded, n_failed, n_skipped, status, started_at, finished_at
                FROM harvest_runs
                WHERE fname = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT fname, source_hash, n_attempted, n_succeeded, n_failed, n_skipped, status, started_at, finished_at
                FROM harvest_runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(name) = fname {
            stmt.query_map(params![name], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: initial schema (functions)
/// - 2: add harvest_runs table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        // Initial schema.
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS functions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                fname       TEXT NOT NULL UNIQUE,
                source_path TEXT,
                source_hash TEXT NOT NULL,
                added_at    TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS harvest_runs (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                fname        TEXT NOT NULL,
                source_hash  TEXT NOT NULL,
                n_attempted  INTEGER NOT NULL,
                n_succeeded  INTEGER NOT NULL,
                n_failed     INTEGER NOT NULL,
                n_skipped    INTEGER NOT NULL,
                status       TEXT NOT NULL,
                started_at   TEXT NOT NULL,
                finished_at  TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

/// Helper for parsing status strings into HarvestRunStatus with better errors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HarvestRunStatusString(pub HarvestRunStatus);

impl std::str::FromStr for HarvestRunStatusString {
    type Err = rusqlite::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.to_lowercase().as_str() {
            "succeeded" => HarvestRunStatus::Succeeded,
            "partial" => HarvestRunStatus::Partial,
            "failed" => HarvestRunStatus::Failed,
            _other => {
                return Err(rusqlite::Error::InvalidQuery);
            }
        };
        Ok(HarvestRunStatusString(status))
    }
}
