//! End-to-end scenarios against the full router, grounded in the acceptance
//! scenarios for indexes, documents, search, attachments, and auth.

mod test_helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use scout_server::server::{create_router, AppState};
use test_helpers::{make_auth_test_state, make_test_state};

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let req = if let Some(json) = body {
        builder = builder.header("content-type", "application/json");
        builder.body(Body::from(json.to_string())).unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

struct TestApp {
    state: AppState,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let (state, _dir) = make_test_state();
        Self { state, _dir }
    }

    async fn call(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        send(create_router(self.state.clone()), method, uri, body).await
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::new();
    let (status, json) = app.call("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// S1 — create & list indexes.
#[tokio::test]
async fn s1_create_and_list_indexes() {
    let app = TestApp::new();
    for name in ["i0", "i1", "i2"] {
        let (status, _) = app
            .call("POST", "/", Some(&format!(r#"{{"name":"{name}"}}"#)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = app.call("GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let indexes = json["indexes"].as_array().unwrap();
    assert_eq!(indexes.len(), 3);
    let names: Vec<&str> = indexes.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["i0", "i1", "i2"]);
    for entry in indexes {
        assert_eq!(entry["document_count"], 0);
    }
}

// S2 — index a document with metadata.
#[tokio::test]
async fn s2_index_document_with_metadata() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"idx-a"}"#)).await;

    let (status, json) = app
        .call(
            "POST",
            "/documents/",
            Some(r#"{"content":"doc 1","index":"idx-a","metadata":{"k1":"v1","k2":"v2"}}"#),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["id"], 1);
    assert_eq!(json["content"], "doc 1");
    assert_eq!(json["indexes"], serde_json::json!(["idx-a"]));
    assert_eq!(json["metadata"], serde_json::json!({"k1":"v1","k2":"v2"}));
    assert_eq!(json["attachments"], "/documents/1/attachments/");
}

// S3 — duplicate-index rejection.
#[tokio::test]
async fn s3_unknown_indexes_are_rejected() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"idx"}"#)).await;

    let (status, json) = app
        .call(
            "POST",
            "/documents/",
            Some(r#"{"content":"x","indexes":["missing","idx","blah"]}"#),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "The following indexes were not found: missing, blah.");
}

// S4 — wildcard search with metadata filters.
#[tokio::test]
async fn s4_wildcard_with_metadata_filter() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"people"}"#)).await;

    let rows = [
        ("Topeka", "KS"),
        ("Topeka", "KS"),
        ("Lawrence", "KS"),
        ("Lawrence", "KS"),
        ("Wichita", "KS"),
        ("Wichita", "KS"),
        ("Columbia", "MO"),
        ("St. Louis", "MO"),
        ("Springfield", "MO"),
    ];
    for (i, (city, state)) in rows.iter().enumerate() {
        let body = serde_json::json!({
            "content": format!("resident {i}"),
            "index": "people",
            "metadata": {"city": city, "state": state, "dob": "2000-01-01"},
        });
        let (status, _) = app.call("POST", "/documents/", Some(&body.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = app
        .call(
            "GET",
            "/documents/?q=*&index=people&city__in=Topeka,Lawrence&state=KS",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 4);
}

// S5 — BM25 ranked search.
#[tokio::test]
async fn s5_bm25_ranking_orders_by_score() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"docs"}"#)).await;

    let phrases = [
        "document nug nugs",
        "document blah nuggie foo",
        "foo",
        "bar",
        "baze",
    ];
    for phrase in phrases {
        let body = serde_json::json!({"content": phrase, "index": "docs"});
        app.call("POST", "/documents/", Some(&body.to_string())).await;
    }
    for i in 0..10 {
        let body = serde_json::json!({"content": format!("filler content {i}"), "index": "docs"});
        app.call("POST", "/documents/", Some(&body.to_string())).await;
    }

    let (status, json) = app
        .call("GET", "/documents/?q=doc%2A%20nug%2A&ranking=bm25&index=docs", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["content"], "document nug nugs");
    assert_eq!(documents[1]["content"], "document blah nuggie foo");
}

// S6 — attachment round-trip.
#[tokio::test]
async fn s6_attachment_round_trip() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"idx-a"}"#)).await;
    let (_, doc) = app
        .call("POST", "/documents/", Some(r#"{"content":"doc a","index":"idx-a"}"#))
        .await;
    let doc_id = doc["id"].as_i64().unwrap();

    let boundary = "----scouttestboundary";
    let mut multipart_body = Vec::new();
    for (filename, content_type, bytes) in [
        ("test1.txt", "text/plain", b"testfile1".as_slice()),
        ("test2.jpg", "image/jpeg", b"testfile2".as_slice()),
    ] {
        multipart_body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        multipart_body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
        );
        multipart_body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        multipart_body.extend_from_slice(bytes);
        multipart_body.extend_from_slice(b"\r\n");
    }
    multipart_body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let uri = format!("/documents/{doc_id}/attachments/");
    let req = Request::builder()
        .method("POST")
        .uri(&uri)
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(multipart_body))
        .unwrap();

    let resp = create_router(app.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let attachments: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let list = attachments.as_array().unwrap();
    assert_eq!(list.len(), 2);
    for attachment in list {
        assert_eq!(attachment["data_length"], 9);
    }

    let download_uri = format!("/documents/{doc_id}/attachments/test1.txt/download/");
    let req = Request::builder().method("GET").uri(&download_uri).body(Body::empty()).unwrap();
    let resp = create_router(app.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/plain");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"testfile1");
}

// S7 — auth gate.
#[tokio::test]
async fn s7_auth_gate() {
    let (state, _dir) = make_auth_test_state("test");

    let (status, _) = send(create_router(state.clone()), "GET", "/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(create_router(state.clone()), "GET", "/?key=test", None).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder()
        .method("GET")
        .uri("/")
        .header("key", "test")
        .body(Body::empty())
        .unwrap();
    let resp = create_router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_search_phrase_is_invalid_search() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"docs"}"#)).await;
    let (status, json) = app.call("GET", "/documents/?q=&index=docs", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("search query"));
}

#[tokio::test]
async fn delete_document_removes_its_rows() {
    let app = TestApp::new();
    app.call("POST", "/", Some(r#"{"name":"idx"}"#)).await;
    let (_, doc) = app
        .call("POST", "/documents/", Some(r#"{"content":"hello","index":"idx"}"#))
        .await;
    let doc_id = doc["id"].as_i64().unwrap();

    let (status, _) = app.call("DELETE", &format!("/documents/{doc_id}/"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.call("GET", &format!("/documents/{doc_id}/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
