//! CRUD over indexes, documents, metadata, index membership, and
//! attachments. Bridges domain entities (`crate::model`) to SQL.

use crate::blob_store;
use crate::error::{Error, Result};
use crate::model::{Attachment, Document, Index, MetadataMap};
use crate::schema::Pool;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

pub struct Repository {
    pool: Pool,
}

impl Repository {
    pub fn new(pool: Pool) -> Self {
        Repository { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    // ---- Index CRUD -----------------------------------------------------

    pub fn create_index(&self, name: &str) -> Result<Index> {
        let conn = self.conn()?;
        match conn.execute("INSERT INTO main_index (name) VALUES (?1)", params![name]) {
            Ok(_) => {}
            Err(e) => {
                let err: Error = e.into();
                return match err {
                    Error::Conflict(_) => {
                        Err(Error::Conflict(format!("\"{name}\" already exists.")))
                    }
                    other => Err(other),
                };
            }
        }
        let id = conn.last_insert_rowid();
        Ok(Index {
            id,
            name: name.to_string(),
            document_count: 0,
        })
    }

    pub fn get_index_by_name(&self, name: &str) -> Result<Index> {
        let conn = self.conn()?;
        get_index_by_name(&conn, name)
    }

    pub fn rename_index(&self, name: &str, new_name: &str) -> Result<Index> {
        let conn = self.conn()?;
        let index = get_index_by_name(&conn, name)?;
        match conn.execute(
            "UPDATE main_index SET name = ?1 WHERE id = ?2",
            params![new_name, index.id],
        ) {
            Ok(_) => {}
            Err(e) => {
                let err: Error = e.into();
                return match err {
                    Error::Conflict(_) => {
                        Err(Error::Conflict(format!("\"{new_name}\" already exists.")))
                    }
                    other => Err(other),
                };
            }
        }
        Ok(Index {
            id: index.id,
            name: new_name.to_string(),
            document_count: document_count_for_index(&conn, index.id)?,
        })
    }

    pub fn delete_index(&self, name: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let index = get_index_by_name(&conn, name)?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM main_index_document WHERE index_id = ?1",
            params![index.id],
        )?;
        tx.execute("DELETE FROM main_index WHERE id = ?1", params![index.id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn list_indexes(&self) -> Result<Vec<Index>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT mi.id, mi.name, COUNT(mid.document_id)
             FROM main_index mi
             LEFT JOIN main_index_document mid ON mid.index_id = mi.id
             GROUP BY mi.id, mi.name
             ORDER BY mi.name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Index {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    document_count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total document count for a search scope, ignoring phrase and
    /// metadata filters — used for the search envelope's `document_count`.
    pub fn count_documents_in_scope(&self, index_ids: Option<&[i64]>) -> Result<i64> {
        let conn = self.conn()?;
        match index_ids {
            None => Ok(conn.query_row("SELECT COUNT(*) FROM main_document", [], |row| row.get(0))?),
            Some(ids) => {
                if ids.is_empty() {
                    return Ok(0);
                }
                let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                let sql = format!(
                    "SELECT COUNT(DISTINCT document_id) FROM main_index_document WHERE index_id IN ({placeholders})"
                );
                let params: Vec<&dyn rusqlite::ToSql> =
                    ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
                Ok(conn.query_row(&sql, params.as_slice(), |row| row.get(0))?)
            }
        }
    }

    // ---- Document CRUD ---------------------------------------------------

    pub fn create_document(&self, content: &str, identifier: Option<&str>) -> Result<Document> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO main_document (content, identifier) VALUES (?1, ?2)",
            params![content, identifier],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Document {
            id,
            content: content.to_string(),
            identifier: identifier.map(str::to_string),
        })
    }

    /// Looks up a document by primary key, falling back to `identifier`
    /// lookup when the token is not all-digits or the primary-key lookup
    /// misses.
    pub fn get_document(&self, token: &str) -> Result<Document> {
        let conn = self.conn()?;
        if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
            if let Ok(id) = token.parse::<i64>() {
                if let Some(doc) = get_document_by_id(&conn, id)? {
                    return Ok(doc);
                }
            }
        }
        get_document_by_identifier(&conn, token)?
            .ok_or_else(|| Error::NotFound(format!("document '{token}'")))
    }

    pub fn update_document(
        &self,
        doc_id: i64,
        content: Option<&str>,
        identifier: Option<Option<&str>>,
    ) -> Result<Document> {
        let conn = self.conn()?;
        if let Some(content) = content {
            conn.execute(
                "UPDATE main_document SET content = ?1 WHERE rowid = ?2",
                params![content, doc_id],
            )?;
        }
        if let Some(identifier) = identifier {
            conn.execute(
                "UPDATE main_document SET identifier = ?1 WHERE rowid = ?2",
                params![identifier, doc_id],
            )?;
        }
        get_document_by_id(&conn, doc_id)?
            .ok_or_else(|| Error::NotFound(format!("document {doc_id}")))
    }

    pub fn delete_document(&self, doc_id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM main_index_document WHERE document_id = ?1",
            params![doc_id],
        )?;
        tx.execute(
            "DELETE FROM attachment WHERE document_id = ?1",
            params![doc_id],
        )?;
        tx.execute(
            "DELETE FROM main_metadata WHERE document_id = ?1",
            params![doc_id],
        )?;
        tx.execute("DELETE FROM main_document WHERE rowid = ?1", params![doc_id])?;
        tx.commit()?;
        Ok(())
    }

    // ---- Metadata ---------------------------------------------------------

    /// Replaces the full metadata key set for `doc_id`: deletes keys no
    /// longer present, then upserts every provided pair. An empty map
    /// clears all metadata.
    pub fn set_metadata(&self, doc_id: i64, map: &MetadataMap) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if map.is_empty() {
            tx.execute(
                "DELETE FROM main_metadata WHERE document_id = ?1",
                params![doc_id],
            )?;
        } else {
            let placeholders = map.keys().map(|_| "?").collect::<Vec<_>>().join(", ");
            let mut delete_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(doc_id)];
            for key in map.keys() {
                delete_params.push(Box::new(key.clone()));
            }
            let sql = format!(
                "DELETE FROM main_metadata WHERE document_id = ?1 AND key NOT IN ({placeholders})"
            );
            let refs: Vec<&dyn rusqlite::ToSql> =
                delete_params.iter().map(|b| b.as_ref()).collect();
            tx.execute(&sql, refs.as_slice())?;

            for (key, value) in map {
                tx.execute(
                    "INSERT INTO main_metadata (document_id, key, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(document_id, key) DO UPDATE SET value = excluded.value",
                    params![doc_id, key, value],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_metadata(&self, doc_id: i64) -> Result<MetadataMap> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM main_metadata WHERE document_id = ?1")?;
        let rows = stmt
            .query_map(params![doc_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<MetadataMap, _>>()?;
        Ok(rows)
    }

    // ---- Index membership ---------------------------------------------------

    /// Idempotent; a duplicate `(index_id, document_id)` pair is a silent
    /// no-op rather than an error (I3).
    pub fn add_to_index(&self, doc_id: i64, index_id: i64) -> Result<()> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO main_index_document (index_id, document_id) VALUES (?1, ?2)",
            params![index_id, doc_id],
        ) {
            Ok(_) => Ok(()),
            Err(e) => {
                let err: Error = e.into();
                match err {
                    Error::Conflict(_) => Ok(()),
                    other => Err(other),
                }
            }
        }
    }

    /// Deletes all `IndexDocument` rows for `doc_id`, then inserts the new
    /// set, atomically. An empty set clears all membership.
    pub fn replace_indexes(&self, doc_id: i64, index_ids: &BTreeSet<i64>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM main_index_document WHERE document_id = ?1",
            params![doc_id],
        )?;
        for index_id in index_ids {
            tx.execute(
                "INSERT INTO main_index_document (index_id, document_id) VALUES (?1, ?2)",
                params![index_id, doc_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_index_names(&self, doc_id: i64) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT mi.name FROM main_index mi
             JOIN main_index_document mid ON mid.index_id = mi.id
             WHERE mid.document_id = ?1
             ORDER BY mi.name ASC",
        )?;
        let names = stmt
            .query_map(params![doc_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Resolves index names to ids; returns the names that were not found.
    pub fn resolve_index_names(&self, names: &[String]) -> Result<(Vec<Index>, Vec<String>)> {
        let conn = self.conn()?;
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match get_index_by_name(&conn, name) {
                Ok(index) => found.push(index),
                Err(Error::NotFound(_)) => missing.push(name.clone()),
                Err(other) => return Err(other),
            }
        }
        Ok((found, missing))
    }

    // ---- Attachments ---------------------------------------------------

    /// Normalizes `filename`, stores `bytes` in the blob store, and
    /// inserts or updates the `Attachment` row (I4: re-attaching the same
    /// filename updates `hash`/`mimetype` rather than erroring).
    pub fn attach(&self, doc_id: i64, filename: &str, bytes: &[u8]) -> Result<Attachment> {
        let safe_name = secure_filename(filename);
        let mimetype = mime_guess::from_path(&safe_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "text/plain".to_string());

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let hash = blob_store::put(&tx, bytes)?;
        tx.execute(
            "INSERT INTO attachment (document_id, filename, hash, mimetype)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(document_id, filename) DO UPDATE SET
                hash = excluded.hash,
                mimetype = excluded.mimetype,
                timestamp = strftime('%Y-%m-%d %H:%M:%f', 'now')",
            params![doc_id, safe_name, hash, mimetype],
        )?;
        tx.commit()?;

        self.get_attachment(doc_id, &safe_name)
    }

    /// Removes the `Attachment` row only; the backing `BlobData` row is
    /// intentionally retained.
    pub fn detach(&self, doc_id: i64, filename: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM attachment WHERE document_id = ?1 AND filename = ?2",
            params![doc_id, filename],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("attachment '{filename}'")));
        }
        Ok(())
    }

    pub fn get_attachment(&self, doc_id: i64, filename: &str) -> Result<Attachment> {
        let conn = self.conn()?;
        get_attachment_row(&conn, doc_id, filename)?
            .ok_or_else(|| Error::NotFound(format!("attachment '{filename}'")))
    }

    pub fn list_attachments(&self, doc_id: i64) -> Result<Vec<Attachment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.document_id, a.filename, a.hash, a.mimetype, a.timestamp
             FROM attachment a
             WHERE a.document_id = ?1
             ORDER BY a.filename ASC",
        )?;
        let rows = stmt
            .query_map(params![doc_id], attachment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|a| fill_attachment_length(&conn, a))
            .collect()
    }

    pub fn get_blob(&self, hash: &str) -> Result<Vec<u8>> {
        let conn = self.conn()?;
        blob_store::get(&conn, hash)
    }
}

fn get_index_by_name(conn: &Connection, name: &str) -> Result<Index> {
    let row = conn
        .query_row(
            "SELECT id, name FROM main_index WHERE name = ?1",
            params![name],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    let (id, name) = row.ok_or_else(|| Error::NotFound(format!("index '{name}'")))?;
    Ok(Index {
        id,
        name,
        document_count: document_count_for_index(conn, id)?,
    })
}

fn document_count_for_index(conn: &Connection, index_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM main_index_document WHERE index_id = ?1",
        params![index_id],
        |row| row.get(0),
    )?)
}

fn get_document_by_id(conn: &Connection, id: i64) -> Result<Option<Document>> {
    Ok(conn
        .query_row(
            "SELECT rowid, content, identifier FROM main_document WHERE rowid = ?1",
            params![id],
            document_from_row,
        )
        .optional()?)
}

fn get_document_by_identifier(conn: &Connection, identifier: &str) -> Result<Option<Document>> {
    Ok(conn
        .query_row(
            "SELECT rowid, content, identifier FROM main_document WHERE identifier = ?1",
            params![identifier],
            document_from_row,
        )
        .optional()?)
}

fn document_from_row(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        content: row.get(1)?,
        identifier: row.get(2)?,
    })
}

fn get_attachment_row(
    conn: &Connection,
    doc_id: i64,
    filename: &str,
) -> Result<Option<Attachment>> {
    let row = conn
        .query_row(
            "SELECT a.id, a.document_id, a.filename, a.hash, a.mimetype, a.timestamp
             FROM attachment a
             WHERE a.document_id = ?1 AND a.filename = ?2",
            params![doc_id, filename],
            attachment_from_row,
        )
        .optional()?;
    match row {
        Some(a) => Ok(Some(fill_attachment_length(conn, a)?)),
        None => Ok(None),
    }
}

fn attachment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Attachment> {
    let timestamp: String = row.get(5)?;
    let parsed = chrono::NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S"))
        .unwrap_or_else(|_| chrono::NaiveDateTime::from_timestamp_opt(0, 0).unwrap());
    Ok(Attachment {
        id: row.get(0)?,
        document_id: row.get(1)?,
        filename: row.get(2)?,
        hash: row.get(3)?,
        mimetype: row.get(4)?,
        timestamp: parsed,
        data_length: 0,
    })
}

/// Resolves the attachment's `data_length` by decompressing its blob.
fn fill_attachment_length(conn: &Connection, mut attachment: Attachment) -> Result<Attachment> {
    attachment.data_length = blob_store::len(conn, &attachment.hash)?;
    Ok(attachment)
}

/// Strips directory components and replaces unsafe characters, mirroring
/// Werkzeug's `secure_filename` closely enough for this service's needs.
pub fn secure_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let mut cleaned = String::with_capacity(base.len());
    let mut last_was_separator = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
            cleaned.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            cleaned.push('_');
            last_was_separator = true;
        }
    }

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
