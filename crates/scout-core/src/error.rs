//! Domain error type for scout-core.

use thiserror::Error;

/// Result type alias using scout-core's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

/// Domain error kinds produced by the storage schema, blob store, document
/// repository, and search engine. `scout-server` maps each variant onto an
/// HTTP status; see `scout_server::ApiError`.
#[derive(Error, Debug)]
pub enum Error {
    /// A request was well-formed JSON but failed field-level validation
    /// (missing required key, unrecognized key, malformed filter operator).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness constraint was violated (duplicate index name, duplicate
    /// metadata key, duplicate attachment filename).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The search phrase or ranking mode could not be compiled into a query.
    #[error("Invalid search: {0}")]
    InvalidSearch(String),

    /// The storage engine failed for a reason unrelated to caller input
    /// (I/O failure, pool exhaustion, FTS5 unavailable at startup).
    #[error("Engine error: {0}")]
    Engine(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == ErrorCode::ConstraintViolation {
                return Error::Conflict(e.to_string());
            }
        }
        Error::Engine(e.to_string())
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Engine(format!("connection pool error: {e}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Engine(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::Validation("missing key: content".into());
        assert_eq!(err.to_string(), "Validation error: missing key: content");
    }

    #[test]
    fn conflict_display() {
        let err = Error::Conflict("\"docs\" already exists.".into());
        assert_eq!(err.to_string(), "Conflict: \"docs\" already exists.");
    }

    #[test]
    fn not_found_display() {
        let err = Error::NotFound("document 4".into());
        assert_eq!(err.to_string(), "Not found: document 4");
    }

    #[test]
    fn invalid_search_display() {
        let err = Error::InvalidSearch("Must provide a search query.".into());
        assert_eq!(
            err.to_string(),
            "Invalid search: Must provide a search query."
        );
    }

    #[test]
    fn engine_display() {
        let err = Error::Engine("disk full".into());
        assert_eq!(err.to_string(), "Engine error: disk full");
    }

    #[test]
    fn sqlite_constraint_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT UNIQUE)")
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')", [])
            .unwrap();
        let result = conn.execute("INSERT INTO t (name) VALUES ('a')", []);
        let err: Error = result.unwrap_err().into();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
