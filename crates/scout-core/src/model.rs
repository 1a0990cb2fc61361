//! Domain entity types shared by the repository and search engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named logical grouping of documents — the search-scope unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Index {
    pub id: i64,
    pub name: String,
    pub document_count: i64,
}

/// A document row. `id` is the FTS table's `rowid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    pub content: String,
    pub identifier: Option<String>,
}

/// A document as returned from a ranked search: carries the optional BM25 /
/// simple-rank score alongside the base fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    pub id: i64,
    pub content: String,
    pub identifier: Option<String>,
    pub score: Option<f64>,
}

/// An attachment row: one file bound to a document and a content-addressed
/// blob. `length` is computed from the backing `BlobData` row at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: i64,
    pub document_id: i64,
    pub filename: String,
    pub hash: String,
    pub mimetype: String,
    pub timestamp: chrono::NaiveDateTime,
    pub data_length: i64,
}

/// Per-document key/value metadata; values are always stored and returned
/// as strings (non-string input is coerced to its display form at ingest).
pub type MetadataMap = BTreeMap<String, String>;

/// Content-addressed binary payload. `hash` is the base64 of the SHA-256 of
/// the raw (uncompressed) bytes; `data` on disk is zlib-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobData {
    pub hash: String,
    pub raw_len: usize,
}

/// One of the ranking modes a search request may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    Bm25,
    Simple,
    None,
}

impl Ranking {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bm25" => Some(Ranking::Bm25),
            "simple" => Some(Ranking::Simple),
            "none" => Some(Ranking::None),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ranking::Bm25 => "bm25",
            Ranking::Simple => "simple",
            Ranking::None => "none",
        }
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Ranking::Bm25
    }
}
