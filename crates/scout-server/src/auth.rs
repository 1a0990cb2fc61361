//! API key gate. Mirrors the original `authentication(app)` Flask
//! decorator: if a key is configured, every request must present it in
//! the `key` header or the `key` query parameter. Mismatch is a 401 with
//! a plain-text body — not the JSON error envelope other errors use.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::validator::decode_query_component;

#[derive(Clone)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn new(api_key: Option<String>) -> Self {
        AuthConfig { api_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

pub async fn auth_middleware(auth_config: Arc<AuthConfig>, request: Request, next: Next) -> Response {
    if !auth_config.is_enabled() {
        return next.run(request).await;
    }

    let expected = auth_config.api_key.as_deref().unwrap_or_default();

    let header_key = request
        .headers()
        .get("key")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let query_key = request.uri().query().and_then(|q| url_query_value(q, "key"));

    let provided = header_key.or(query_key);

    match provided {
        Some(ref key) if key == expected => next.run(request).await,
        _ => (StatusCode::UNAUTHORIZED, "Invalid API key").into_response(),
    }
}

fn url_query_value(query: &str, name: &str) -> Option<String> {
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        if key == name {
            return Some(decode_query_component(value));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_when_key_is_empty() {
        assert!(!AuthConfig::new(None).is_enabled());
        assert!(!AuthConfig::new(Some(String::new())).is_enabled());
    }

    #[test]
    fn enabled_when_key_is_set() {
        assert!(AuthConfig::new(Some("secret".into())).is_enabled());
    }

    #[test]
    fn query_value_extraction() {
        assert_eq!(
            url_query_value("q=hello&key=test", "key"),
            Some("test".to_string())
        );
        assert_eq!(url_query_value("q=hello", "key"), None);
    }
}
