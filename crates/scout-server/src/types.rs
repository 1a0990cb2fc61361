//! Wire-format DTOs for the REST surface.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub id: i64,
    pub name: String,
    pub document_count: i64,
    pub documents: String,
}

#[derive(Debug, Serialize)]
pub struct IndexListEnvelope {
    pub indexes: Vec<IndexResponse>,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: i64,
    pub identifier: Option<String>,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub indexes: Vec<String>,
    pub attachments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchEnvelope {
    pub document_count: i64,
    pub filtered_count: i64,
    pub documents: Vec<DocumentResponse>,
    pub page: i64,
    pub pages: i64,
    pub filters: BTreeMap<String, Vec<String>>,
    pub ordering: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: i64,
    pub document: i64,
    pub filename: String,
    pub mimetype: String,
    pub data_length: i64,
    pub timestamp: String,
    pub download: String,
}

#[derive(Debug, Serialize)]
pub struct AttachmentListEnvelope {
    pub attachments: Vec<AttachmentResponse>,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
