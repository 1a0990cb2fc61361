//! Table layout, startup pragmas, and connection pool construction.
//!
//! One FTS virtual table (`main_document`) and five regular tables
//! (`main_index`, `main_index_document`, `main_metadata`, `attachment`,
//! `blobdata`) make up the schema. Creation is idempotent
//! (`CREATE ... IF NOT EXISTS`); a failure partway through (most commonly:
//! the FTS5 extension unavailable) is fatal at startup, matching the
//! "partial failure is fatal" contract.

use crate::error::{Error, Result};
use r2d2_sqlite::SqliteConnectionManager;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;

pub type Pool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Which SQLite tokenizer backs the `main_document` FTS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stem {
    Porter,
    Simple,
}

impl Stem {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "porter" => Ok(Stem::Porter),
            "simple" => Ok(Stem::Simple),
            other => Err(Error::Validation(format!(
                "invalid STEM '{other}': expected 'simple' or 'porter'"
            ))),
        }
    }

    fn tokenize_clause(self) -> &'static str {
        match self {
            Stem::Porter => "porter unicode61",
            Stem::Simple => "unicode61",
        }
    }
}

impl Default for Stem {
    fn default() -> Self {
        Stem::Porter
    }
}

/// Engine-level knobs applied at pool/connection construction time. Mirrors
/// the `SQLITE_PRAGMAS` / `STEM` / `C_EXTENSIONS` config keys.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stem: Stem,
    pub journal_mode: String,
    /// Negative kibibytes, as SQLite's `cache_size` pragma expects.
    pub cache_size_kib: i64,
    pub synchronous: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            stem: Stem::default(),
            journal_mode: "wal".to_string(),
            cache_size_kib: -1024 * 64,
            synchronous: false,
        }
    }
}

/// Opens (or creates) the database at `path` and returns a ready connection
/// pool. `path == ":memory:"` is special-cased to a single-connection pool,
/// since an in-memory SQLite database is only visible to the connection
/// that created it.
pub fn open_pool(path: &Path, config: &EngineConfig) -> Result<Pool> {
    let path_str = path.to_string_lossy().to_string();
    let is_memory = path_str == ":memory:";

    let config_for_init = config.clone();
    let manager = SqliteConnectionManager::file(&path_str).with_init(move |conn| {
        apply_pragmas(conn, &config_for_init)?;
        register_regexp(conn)?;
        Ok(())
    });

    let builder = r2d2::Pool::builder();
    let pool = if is_memory {
        builder.max_size(1).build(manager)?
    } else {
        builder.build(manager)?
    };

    let conn = pool.get()?;
    ensure_schema(&conn, config.stem)?;
    drop(conn);

    Ok(pool)
}

fn apply_pragmas(conn: &Connection, config: &EngineConfig) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", &config.journal_mode)?;
    conn.pragma_update(None, "cache_size", config.cache_size_kib)?;
    conn.pragma_update(None, "synchronous", if config.synchronous { 1 } else { 0 })?;
    Ok(())
}

/// Registers the `regexp(pattern, value)` scalar function used by the
/// search engine's `regex` filter operator.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern: String = ctx.get(0)?;
            let value: String = ctx.get(1)?;
            let re = Regex::new(&pattern).map_err(|e| {
                rusqlite::Error::UserFunctionError(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    e.to_string(),
                )))
            })?;
            Ok(re.is_match(&value))
        },
    )
}

fn ensure_schema(conn: &Connection, stem: Stem) -> Result<()> {
    conn.execute_batch(&format!(
        "BEGIN;

         CREATE VIRTUAL TABLE IF NOT EXISTS main_document USING fts5(
             content, identifier,
             tokenize = '{tokenize}',
             prefix = '2 3'
         );

         CREATE TABLE IF NOT EXISTS main_index (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT NOT NULL UNIQUE
         );

         CREATE TABLE IF NOT EXISTS main_index_document (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             index_id INTEGER NOT NULL REFERENCES main_index(id),
             document_id INTEGER NOT NULL,
             UNIQUE(index_id, document_id)
         );

         CREATE TABLE IF NOT EXISTS main_metadata (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             document_id INTEGER NOT NULL,
             key TEXT NOT NULL,
             value TEXT NOT NULL,
             UNIQUE(document_id, key)
         );

         CREATE TABLE IF NOT EXISTS blobdata (
             hash TEXT PRIMARY KEY,
             data BLOB NOT NULL
         );

         CREATE TABLE IF NOT EXISTS attachment (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             document_id INTEGER NOT NULL,
             filename TEXT NOT NULL,
             hash TEXT NOT NULL REFERENCES blobdata(hash),
             mimetype TEXT NOT NULL,
             timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
             UNIQUE(document_id, filename)
         );

         COMMIT;",
        tokenize = stem.tokenize_clause(),
    ))
    .map_err(|e| Error::Engine(format!("schema initialization failed: {e}")))?;

    Ok(())
}

/// True if `name` exists as a table or virtual table in `sqlite_master`.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table') AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn stem_parse_accepts_simple_and_porter() {
        assert_eq!(Stem::parse("simple").unwrap(), Stem::Simple);
        assert_eq!(Stem::parse("porter").unwrap(), Stem::Porter);
        assert!(Stem::parse("snowball").is_err());
    }

    #[test]
    fn open_pool_creates_all_tables() {
        let config = EngineConfig::default();
        let pool = open_pool(&PathBuf::from(":memory:"), &config).unwrap();
        let conn = pool.get().unwrap();
        assert!(table_exists(&conn, "main_index").unwrap());
        assert!(table_exists(&conn, "main_index_document").unwrap());
        assert!(table_exists(&conn, "main_metadata").unwrap());
        assert!(table_exists(&conn, "attachment").unwrap());
        assert!(table_exists(&conn, "blobdata").unwrap());
    }

    #[test]
    fn open_pool_is_idempotent() {
        let config = EngineConfig::default();
        let pool = open_pool(&PathBuf::from(":memory:"), &config).unwrap();
        let conn = pool.get().unwrap();
        ensure_schema(&conn, config.stem).unwrap();
    }

    #[test]
    fn regexp_function_is_registered() {
        let pool = open_pool(&PathBuf::from(":memory:"), &EngineConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let matched: bool = conn
            .query_row("SELECT regexp('^foo', 'foobar')", [], |row| row.get(0))
            .unwrap();
        assert!(matched);
    }
}
