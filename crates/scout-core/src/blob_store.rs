//! Content-addressed storage for attachment payloads.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

/// Computes the base64-of-SHA-256 hash used as the blob's primary key.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    STANDARD.encode(digest)
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Inserts `bytes` keyed by its content hash, tolerating a primary-key
/// collision as "already present" (optimistic dedup — no pre-read check).
/// Returns the hash regardless of whether a new row was inserted.
pub fn put(conn: &Connection, bytes: &[u8]) -> Result<String> {
    let hash = hash_bytes(bytes);
    let compressed = compress(bytes)?;

    match conn.execute(
        "INSERT INTO blobdata (hash, data) VALUES (?1, ?2)",
        params![hash, compressed],
    ) {
        Ok(_) => Ok(hash),
        Err(e) => {
            let conflict: Error = e.into();
            match conflict {
                Error::Conflict(_) => Ok(hash),
                other => Err(other),
            }
        }
    }
}

/// Looks up `hash` and returns the decompressed bytes, or `NotFound`.
pub fn get(conn: &Connection, hash: &str) -> Result<Vec<u8>> {
    let compressed: Option<Vec<u8>> = conn
        .query_row(
            "SELECT data FROM blobdata WHERE hash = ?1",
            params![hash],
            |row| row.get(0),
        )
        .optional()?;

    match compressed {
        Some(data) => decompress(&data),
        None => Err(Error::NotFound(format!("blob {hash}"))),
    }
}

/// Length, in bytes, of the decompressed payload for `hash`.
pub fn len(conn: &Connection, hash: &str) -> Result<i64> {
    Ok(get(conn, hash)?.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE blobdata (hash TEXT PRIMARY KEY, data BLOB NOT NULL)")
            .unwrap();
        conn
    }

    #[test]
    fn put_then_get_round_trips() {
        let conn = memory_conn();
        let hash = put(&conn, b"testfile1").unwrap();
        assert_eq!(hash, hash_bytes(b"testfile1"));
        let bytes = get(&conn, &hash).unwrap();
        assert_eq!(bytes, b"testfile1");
    }

    #[test]
    fn duplicate_put_does_not_error() {
        let conn = memory_conn();
        let hash1 = put(&conn, b"same bytes").unwrap();
        let hash2 = put(&conn, b"same bytes").unwrap();
        assert_eq!(hash1, hash2);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM blobdata", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn get_missing_hash_is_not_found() {
        let conn = memory_conn();
        let err = get(&conn, "nonexistent").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
