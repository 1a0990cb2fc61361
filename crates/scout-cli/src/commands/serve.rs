use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use scout_core::{open_pool, Engine, Repository};
use scout_server::auth::AuthConfig;
use scout_server::server::{start_server, AppState, ServerConfig};

use crate::config::Config;

pub async fn execute(database: &Path, config: &Config) -> Result<()> {
    info!(host = %config.host, port = config.port, database = %database.display(), "starting scout");

    let engine_config = config.engine_config()?;
    let pool = open_pool(database, &engine_config)
        .with_context(|| format!("failed to open database at {database:?}"))?;

    let repository = Arc::new(Repository::new(pool.clone()));
    let engine = Arc::new(Engine::new(pool));
    let auth_config = Arc::new(AuthConfig::new(config.authentication.clone()));
    let server_config = Arc::new(ServerConfig {
        paginate_by: config.paginate_by,
        star_all: config.star_all,
        page_var: config.page_var.clone(),
        url_prefix: config.url_prefix.clone(),
    });

    let state = AppState {
        repository,
        engine,
        auth_config,
        config: server_config,
    };

    start_server(state, &config.host, config.port).await
}
