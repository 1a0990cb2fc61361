//! Shared test helpers: an isolated on-disk database and a ready `AppState`.
#![allow(dead_code)]

use std::sync::Arc;

use scout_core::{open_pool, EngineConfig, Engine, Repository};
use scout_server::auth::AuthConfig;
use scout_server::server::{AppState, ServerConfig};

/// Build a test `AppState` over a tempdir-backed SQLite file (auto-cleaned
/// on drop) with no auth requirement and wildcard search enabled.
pub fn make_test_state() -> (AppState, tempfile::TempDir) {
    make_state(None)
}

/// Build a test `AppState` with auth enabled using the given key.
pub fn make_auth_test_state(key: &str) -> (AppState, tempfile::TempDir) {
    make_state(Some(key.to_string()))
}

fn make_state(api_key: Option<String>) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = open_pool(&db_path, &EngineConfig::default()).unwrap();

    let repository = Arc::new(Repository::new(pool.clone()));
    let engine = Arc::new(Engine::new(pool));
    let auth_config = Arc::new(AuthConfig::new(api_key));
    let config = Arc::new(ServerConfig {
        paginate_by: 50,
        star_all: true,
        page_var: "page".to_string(),
        url_prefix: String::new(),
    });

    (
        AppState {
            repository,
            engine,
            auth_config,
            config,
        },
        dir,
    )
}
