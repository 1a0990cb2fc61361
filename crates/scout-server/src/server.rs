use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::{to_bytes, Bytes};
use axum::extract::{FromRequest, Multipart, Path, RawQuery, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scout_core::search::SearchRequest;
use scout_core::{Document, Engine, Index, MetadataMap, Paginator, Ranking, Repository};

use crate::api_error::ApiResult;
use crate::auth::{auth_middleware, AuthConfig};
use crate::types::*;
use crate::validator;

/// Search-engine and pagination knobs that come from process configuration
/// rather than from any one request.
#[derive(Clone)]
pub struct ServerConfig {
    pub paginate_by: i64,
    pub star_all: bool,
    pub page_var: String,
    pub url_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            paginate_by: 50,
            star_all: false,
            page_var: "page".to_string(),
            url_prefix: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
    pub engine: Arc<Engine>,
    pub auth_config: Arc<AuthConfig>,
    pub config: Arc<ServerConfig>,
}

pub fn create_router(state: AppState) -> Router {
    let auth_config = state.auth_config.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(list_indexes).post(create_index))
        .route(
            "/{name}/",
            get(index_detail).post(update_index).put(update_index).delete(delete_index),
        )
        .route(
            "/documents/",
            get(search_documents).post(create_or_update_document),
        )
        .route("/documents/attachments/", get(search_attachments))
        .route(
            "/documents/{token}/",
            get(document_detail)
                .post(update_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route(
            "/documents/{token}/attachments/",
            get(list_attachments).post(attach_files),
        )
        .route(
            "/documents/{token}/attachments/{filename}/",
            get(attachment_detail)
                .post(replace_attachment)
                .put(replace_attachment)
                .delete(delete_attachment),
        )
        .route(
            "/documents/{token}/attachments/{filename}/download/",
            get(download_attachment),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth_middleware(auth_config.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{host}:{port}");
    info!(addr = %addr, "starting scout server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("scout server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl_c");
    info!("shutdown signal received");
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---- Index handlers -----------------------------------------------------

async fn list_indexes(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<IndexListEnvelope>> {
    let query = query.unwrap_or_default();
    let page = page_from_query(&query, &state.config.page_var);
    let ordering = ordering_from_query(&query);

    let mut indexes = state.repository.list_indexes()?;
    apply_index_ordering(&mut indexes, &ordering);

    let paginator = Paginator::new(page, state.config.paginate_by);
    let total = indexes.len() as i64;
    let pages = paginator.total_pages(total);
    let page_slice: Vec<Index> = indexes
        .into_iter()
        .skip(paginator.offset().max(0) as usize)
        .take(paginator.limit() as usize)
        .collect();

    let responses = page_slice
        .into_iter()
        .map(|i| index_to_response(&i, &state.config.url_prefix))
        .collect();

    Ok(Json(IndexListEnvelope {
        indexes: responses,
        page: paginator.page,
        pages,
    }))
}

fn apply_index_ordering(indexes: &mut [Index], ordering: &[String]) {
    for raw in ordering.iter().rev() {
        let (desc, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        match key {
            "name" => indexes.sort_by(|a, b| a.name.cmp(&b.name)),
            "document_count" => indexes.sort_by_key(|i| i.document_count),
            "id" => indexes.sort_by_key(|i| i.id),
            _ => continue,
        }
        if desc {
            indexes.reverse();
        }
    }
}

fn index_to_response(index: &Index, prefix: &str) -> IndexResponse {
    IndexResponse {
        id: index.id,
        name: index.name.clone(),
        document_count: index.document_count,
        documents: format!("{prefix}/{}/", index.name),
    }
}

async fn create_index(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<IndexResponse>)> {
    validator::parse_post(&body, &["name"], &[])?;
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let index = state.repository.create_index(name)?;
    Ok((
        StatusCode::CREATED,
        Json(index_to_response(&index, &state.config.url_prefix)),
    ))
}

async fn index_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Value>> {
    let index = state.repository.get_index_by_name(&name)?;
    let mut response = serde_json::to_value(index_to_response(&index, &state.config.url_prefix))
        .unwrap();

    let query = query.unwrap_or_default();
    if let Value::Object(ref mut obj) = response {
        if query_has_q(&query) {
            let envelope = run_search(&state, &query, Some(vec![index.id]))?;
            obj.insert("search".to_string(), serde_json::to_value(envelope).unwrap());
        }
    }
    Ok(Json(response))
}

async fn update_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<IndexResponse>> {
    validator::parse_post(&body, &["name"], &[])?;
    let new_name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let index = state.repository.rename_index(&name, new_name)?;
    Ok(Json(index_to_response(&index, &state.config.url_prefix)))
}

async fn delete_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.repository.delete_index(&name)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Document handlers ---------------------------------------------------

async fn search_documents(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<SearchEnvelope>> {
    let query = query.unwrap_or_default();
    let index_ids = indexes_in_scope(&state, &query)?;
    let envelope = run_search(&state, &query, index_ids)?;
    Ok(Json(envelope))
}

/// Cross-document attachment search: applies the same phrase/filter/index
/// scoping as document search, but the result rows are the matching
/// documents' attachments rather than the documents themselves.
async fn search_attachments(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<AttachmentListEnvelope>> {
    let query = query.unwrap_or_default();
    let index_ids = indexes_in_scope(&state, &query)?;

    let phrase = query_values(&query, "q").into_iter().next().unwrap_or_default();
    let phrase_is_blank = phrase.trim().is_empty();
    let effective_phrase = if phrase_is_blank { "*".to_string() } else { phrase };
    let filters = validator::extract_get_params(&query);

    let request = SearchRequest {
        phrase: effective_phrase,
        index_ids,
        ranking: Ranking::default(),
        ordering: Vec::new(),
        filters,
        star_all: state.config.star_all || phrase_is_blank,
    };

    // -1 means "no limit" in SQLite: every matching document is pulled so
    // its attachments can be flattened, then paginated below.
    let matches = state.engine.search(&request, -1, 0)?;

    let mut attachments = Vec::new();
    for doc in &matches.documents {
        attachments.extend(state.repository.list_attachments(doc.id)?);
    }

    let ordering = ordering_from_query(&query);
    apply_attachment_ordering(&mut attachments, &ordering);

    let page = page_from_query(&query, &state.config.page_var);
    let paginator = Paginator::new(page, state.config.paginate_by);
    let total = attachments.len() as i64;
    let pages = paginator.total_pages(total);
    let page_slice = attachments
        .into_iter()
        .skip(paginator.offset().max(0) as usize)
        .take(paginator.limit() as usize)
        .map(|a| attachment_to_response(&a, &state.config.url_prefix))
        .collect();

    Ok(Json(AttachmentListEnvelope {
        attachments: page_slice,
        page: paginator.page,
        pages,
    }))
}

fn indexes_in_scope(state: &AppState, query: &str) -> ApiResult<Option<Vec<i64>>> {
    let names = query_values(query, "index");
    if names.is_empty() {
        return Ok(None);
    }
    let (found, missing) = state.repository.resolve_index_names(&names)?;
    if !missing.is_empty() {
        return Err(scout_core::Error::Validation(format!(
            "The following indexes were not found: {}.",
            missing.join(", ")
        ))
        .into());
    }
    Ok(Some(found.into_iter().map(|i| i.id).collect()))
}

fn run_search(
    state: &AppState,
    query: &str,
    index_ids: Option<Vec<i64>>,
) -> ApiResult<SearchEnvelope> {
    let phrase = query_values(query, "q").into_iter().next().unwrap_or_default();
    let ranking_str = query_values(query, "ranking").into_iter().next();
    let ranking = match &ranking_str {
        Some(s) => Ranking::parse(s)
            .ok_or_else(|| scout_core::Error::InvalidSearch(format!("Unrecognized ranking: \"{s}\"")))?,
        None => Ranking::default(),
    };
    let ordering = ordering_from_query(query);
    let filters = validator::extract_get_params(query);

    let phrase_is_blank = phrase.trim().is_empty();
    let effective_phrase = if phrase_is_blank { "*".to_string() } else { phrase.clone() };

    let request = SearchRequest {
        phrase: effective_phrase,
        index_ids,
        ranking,
        ordering: ordering.clone(),
        filters: filters.clone(),
        star_all: state.config.star_all || phrase_is_blank,
    };

    let page = page_from_query(query, &state.config.page_var);
    let paginator = Paginator::new(page, state.config.paginate_by);
    let results = state
        .engine
        .search(&request, paginator.limit(), paginator.offset())?;
    let document_count = state
        .repository
        .count_documents_in_scope(request.index_ids.as_deref())?;

    let documents = results
        .documents
        .iter()
        .map(|doc| {
            document_to_response(
                state,
                &Document {
                    id: doc.id,
                    content: doc.content.clone(),
                    identifier: doc.identifier.clone(),
                },
                doc.score,
            )
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(SearchEnvelope {
        document_count,
        filtered_count: results.filtered_count,
        documents,
        page: paginator.page,
        pages: paginator.total_pages(results.filtered_count),
        filters,
        ordering,
        ranking: if phrase_is_blank { None } else { Some(ranking.as_str().to_string()) },
        search_term: if phrase_is_blank { None } else { Some(phrase) },
    })
}

fn document_to_response(
    state: &AppState,
    document: &Document,
    score: Option<f64>,
) -> ApiResult<DocumentResponse> {
    let metadata: MetadataMap = state.repository.get_metadata(document.id)?;
    let indexes = state.repository.list_index_names(document.id)?;
    Ok(DocumentResponse {
        id: document.id,
        identifier: document.identifier.clone(),
        content: document.content.clone(),
        metadata,
        indexes,
        attachments: format!("{}/documents/{}/attachments/", state.config.url_prefix, document.id),
        score,
    })
}

/// Parses either a JSON body or a `multipart/form-data` request carrying a
/// `data` JSON field plus file parts, matching `RequestValidator.parse_post`'s
/// content-type dispatch in the original implementation.
async fn extract_body(state: &AppState, request: Request) -> ApiResult<(Value, Vec<(String, Bytes)>)> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| scout_core::Error::Validation(e.to_string()))?;

        let mut data: Option<Value> = None;
        let mut files = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| scout_core::Error::Validation(e.to_string()))?
        {
            if let Some(filename) = field.file_name().map(str::to_string) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| scout_core::Error::Validation(e.to_string()))?;
                files.push((filename, bytes));
                continue;
            }
            if field.name() == Some("data") {
                let text = field
                    .text()
                    .await
                    .map_err(|e| scout_core::Error::Validation(e.to_string()))?;
                data = Some(if text.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&text).map_err(|_| {
                        scout_core::Error::Validation("Unable to parse JSON data from request.".to_string())
                    })?
                });
            }
        }

        let data = data.ok_or_else(|| {
            scout_core::Error::Validation(
                "Missing correct content-type or missing \"data\" field.".to_string(),
            )
        })?;
        Ok((data, files))
    } else {
        let bytes = to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| scout_core::Error::Validation(e.to_string()))?;
        if bytes.is_empty() {
            return Ok((serde_json::json!({}), Vec::new()));
        }
        let value = serde_json::from_slice(&bytes).map_err(|_| {
            scout_core::Error::Validation("Unable to parse JSON data from request.".to_string())
        })?;
        Ok((value, Vec::new()))
    }
}

fn attach_uploaded_files(state: &AppState, doc_id: i64, files: &[(String, Bytes)]) -> ApiResult<()> {
    for (filename, bytes) in files {
        state.repository.attach(doc_id, filename, bytes)?;
    }
    Ok(())
}

async fn create_or_update_document(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let (body, files) = extract_body(&state, request).await?;
    validator::parse_post(&body, &["content"], &["identifier", "index", "indexes", "metadata"])?;
    let content = body.get("content").and_then(Value::as_str).unwrap_or_default();
    let identifier = body.get("identifier").and_then(Value::as_str);

    // Creating with an existing identifier is treated as an update.
    if let Some(identifier) = identifier {
        if let Ok(existing) = state.repository.get_document(identifier) {
            let response = apply_document_update(&state, existing.id, &body).await?;
            attach_uploaded_files(&state, existing.id, &files)?;
            return Ok((StatusCode::OK, Json(response)));
        }
    }

    let indexes = validator::validate_indexes(&state.repository, &body, true)?
        .expect("validate_indexes(required=true) never returns None");

    let document = state.repository.create_document(content, identifier)?;
    for index in &indexes {
        state.repository.add_to_index(document.id, index.id)?;
    }
    if let Some(metadata) = body.get("metadata").and_then(Value::as_object) {
        let map = validator::coerce_metadata(&metadata.clone().into_iter().collect());
        state.repository.set_metadata(document.id, &map)?;
    }
    attach_uploaded_files(&state, document.id, &files)?;

    let response = document_to_response(&state, &document, None)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn document_detail(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state.repository.get_document(&token)?;
    Ok(Json(document_to_response(&state, &document, None)?))
}

async fn update_document(
    State(state): State<AppState>,
    Path(token): Path<String>,
    request: Request,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state.repository.get_document(&token)?;
    let (body, files) = extract_body(&state, request).await?;
    let response = apply_document_update(&state, document.id, &body).await?;
    attach_uploaded_files(&state, document.id, &files)?;
    Ok(Json(response))
}

async fn apply_document_update(
    state: &AppState,
    doc_id: i64,
    body: &Value,
) -> ApiResult<DocumentResponse> {
    validator::parse_post(body, &[], &["content", "identifier", "index", "indexes", "metadata"])?;

    let content = body.get("content").and_then(Value::as_str);
    let identifier = if body.get("identifier").is_some() {
        Some(body.get("identifier").and_then(Value::as_str))
    } else {
        None
    };
    let document = state.repository.update_document(doc_id, content, identifier)?;

    if body.get("metadata").is_some() {
        let map = match body.get("metadata").and_then(Value::as_object) {
            Some(obj) => validator::coerce_metadata(&obj.clone().into_iter().collect()),
            None => MetadataMap::new(),
        };
        state.repository.set_metadata(doc_id, &map)?;
    }

    if body.get("index").is_some() || body.get("indexes").is_some() {
        let indexes = validator::validate_indexes(&state.repository, body, false)?.unwrap_or_default();
        let ids: BTreeSet<i64> = indexes.iter().map(|i| i.id).collect();
        state.repository.replace_indexes(doc_id, &ids)?;
    }

    document_to_response(state, &document, None)
}

async fn delete_document(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    let document = state.repository.get_document(&token)?;
    state.repository.delete_document(document.id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Attachment handlers ---------------------------------------------------

async fn list_attachments(
    State(state): State<AppState>,
    Path(token): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<AttachmentListEnvelope>> {
    let document = state.repository.get_document(&token)?;
    let query = query.unwrap_or_default();
    let ordering = ordering_from_query(&query);

    let mut attachments = state.repository.list_attachments(document.id)?;
    apply_attachment_ordering(&mut attachments, &ordering);

    let page = page_from_query(&query, &state.config.page_var);
    let paginator = Paginator::new(page, state.config.paginate_by);
    let total = attachments.len() as i64;
    let pages = paginator.total_pages(total);
    let page_slice = attachments
        .into_iter()
        .skip(paginator.offset().max(0) as usize)
        .take(paginator.limit() as usize)
        .map(|a| attachment_to_response(&a, &state.config.url_prefix))
        .collect();

    Ok(Json(AttachmentListEnvelope {
        attachments: page_slice,
        page: paginator.page,
        pages,
    }))
}

fn apply_attachment_ordering(attachments: &mut [scout_core::Attachment], ordering: &[String]) {
    for raw in ordering.iter().rev() {
        let (desc, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        match key {
            "document" => attachments.sort_by_key(|a| a.document_id),
            "hash" => attachments.sort_by(|a, b| a.hash.cmp(&b.hash)),
            "filename" => attachments.sort_by(|a, b| a.filename.cmp(&b.filename)),
            "mimetype" => attachments.sort_by(|a, b| a.mimetype.cmp(&b.mimetype)),
            "timestamp" => attachments.sort_by_key(|a| a.timestamp),
            "id" => attachments.sort_by_key(|a| a.id),
            _ => continue,
        }
        if desc {
            attachments.reverse();
        }
    }
}

fn attachment_to_response(attachment: &scout_core::Attachment, prefix: &str) -> AttachmentResponse {
    AttachmentResponse {
        id: attachment.id,
        document: attachment.document_id,
        filename: attachment.filename.clone(),
        mimetype: attachment.mimetype.clone(),
        data_length: attachment.data_length,
        timestamp: attachment.timestamp.to_string(),
        download: format!(
            "{prefix}/documents/{}/attachments/{}/download/",
            attachment.document_id, attachment.filename
        ),
    }
}

async fn attach_files(
    State(state): State<AppState>,
    Path(token): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<AttachmentResponse>>)> {
    let document = state.repository.get_document(&token)?;
    let mut created = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| scout_core::Error::Validation(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| scout_core::Error::Validation(e.to_string()))?;
        let attachment = state.repository.attach(document.id, &filename, &bytes)?;
        created.push(attachment_to_response(&attachment, &state.config.url_prefix));
    }

    if created.is_empty() {
        return Err(scout_core::Error::Validation("No file attachments found.".to_string()).into());
    }

    Ok((StatusCode::CREATED, Json(created)))
}

async fn attachment_detail(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> ApiResult<Json<AttachmentResponse>> {
    let document = state.repository.get_document(&token)?;
    let attachment = state.repository.get_attachment(document.id, &filename)?;
    Ok(Json(attachment_to_response(&attachment, &state.config.url_prefix)))
}

async fn replace_attachment(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
    mut multipart: Multipart,
) -> ApiResult<Json<AttachmentResponse>> {
    let document = state.repository.get_document(&token)?;

    let mut files: Vec<Bytes> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| scout_core::Error::Validation(e.to_string()))?
    {
        if field.file_name().is_some() {
            files.push(
                field
                    .bytes()
                    .await
                    .map_err(|e| scout_core::Error::Validation(e.to_string()))?,
            );
        }
    }

    match files.len() {
        0 => Err(scout_core::Error::Validation("No file attachments found.".to_string()).into()),
        1 => {
            let attachment = state.repository.attach(document.id, &filename, &files[0])?;
            Ok(Json(attachment_to_response(&attachment, &state.config.url_prefix)))
        }
        _ => Err(scout_core::Error::Validation(
            "Only one attachment permitted when performing update.".to_string(),
        )
        .into()),
    }
}

async fn delete_attachment(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let document = state.repository.get_document(&token)?;
    state.repository.detach(document.id, &filename)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_attachment(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    let document = state.repository.get_document(&token)?;
    let attachment = state.repository.get_attachment(document.id, &filename)?;
    let bytes = state.repository.get_blob(&attachment.hash)?;

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, attachment.mimetype.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename={}", attachment.filename),
            ),
        ],
        bytes,
    )
        .into_response();

    Ok(response)
}

// ---- Query-string helpers ---------------------------------------------------

/// All values bound to `name` in a raw (undecoded) query string, in
/// appearance order. Unlike `validator::extract_get_params`, this does not
/// strip reserved keys — used for the reserved keys themselves (`q`,
/// `index`, `ranking`, ...).
fn query_values(query: &str, name: &str) -> Vec<String> {
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            if key != name {
                return None;
            }
            Some(validator::decode_query_component(parts.next().unwrap_or_default()))
        })
        .collect()
}

fn query_has_q(query: &str) -> bool {
    !query_values(query, "q").is_empty()
}

fn page_from_query(query: &str, page_var: &str) -> i64 {
    query_values(query, page_var)
        .first()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(1)
}

fn ordering_from_query(query: &str) -> Vec<String> {
    query_values(query, "ordering")
        .into_iter()
        .flat_map(|v| v.split(',').map(str::to_string).collect::<Vec<_>>())
        .filter(|s| !s.is_empty())
        .collect()
}
