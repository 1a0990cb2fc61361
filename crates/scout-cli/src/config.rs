use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use scout_core::{EngineConfig, Stem};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub authentication: Option<String>,
    #[serde(default = "default_paginate_by")]
    pub paginate_by: i64,
    #[serde(default = "default_page_var")]
    pub page_var: String,
    #[serde(default = "default_stem")]
    pub stem: String,
    /// Accepted for interface parity with spec.md §6; `rusqlite`'s bundled
    /// build only ever provides FTS5, so this has no runtime effect.
    #[serde(default = "default_search_extension")]
    pub search_extension: String,
    #[serde(default)]
    pub star_all: bool,
    #[serde(default)]
    pub url_prefix: String,
    #[serde(default)]
    pub sqlite_pragmas: SqlitePragmas,
    #[serde(default = "default_true")]
    pub c_extensions: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SqlitePragmas {
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    #[serde(default = "default_cache_size_mb")]
    pub cache_size_mb: i64,
    #[serde(default)]
    pub fsync: bool,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        SqlitePragmas {
            journal_mode: default_journal_mode(),
            cache_size_mb: default_cache_size_mb(),
            fsync: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_paginate_by() -> i64 {
    50
}

fn default_page_var() -> String {
    "page".to_string()
}

fn default_stem() -> String {
    "porter".to_string()
}

fn default_search_extension() -> String {
    "FTS5".to_string()
}

fn default_journal_mode() -> String {
    "wal".to_string()
}

fn default_cache_size_mb() -> i64 {
    64
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: None,
            host: default_host(),
            port: default_port(),
            debug: false,
            authentication: None,
            paginate_by: default_paginate_by(),
            page_var: default_page_var(),
            stem: default_stem(),
            search_extension: default_search_extension(),
            star_all: false,
            url_prefix: String::new(),
            sqlite_pragmas: SqlitePragmas::default(),
            c_extensions: true,
        }
    }
}

impl Config {
    /// Clamps and checks field values, matching the `1..1000` paginate_by
    /// bound and the tokenizer whitelist enforced elsewhere.
    pub fn validate(&self) -> Result<()> {
        if self.paginate_by < 1 || self.paginate_by > 1000 {
            anyhow::bail!("PAGINATE_BY must be between 1 and 1000, got {}", self.paginate_by);
        }
        if self.port == 0 {
            anyhow::bail!("PORT must be nonzero");
        }
        Stem::parse(&self.stem).map_err(|e| anyhow::anyhow!("invalid STEM: {e}"))?;
        Ok(())
    }

    /// Environment variables take precedence over the config file but are
    /// overridden by CLI flags (applied afterwards in `main`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCOUT_DATABASE") {
            self.database = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            if let Ok(port) = val.parse() {
                self.port = port;
            }
        }
        if let Ok(val) = std::env::var("DEBUG") {
            if let Ok(debug) = val.parse() {
                self.debug = debug;
            }
        }
        if let Ok(val) = std::env::var("AUTHENTICATION") {
            self.authentication = Some(val);
        }
        if let Ok(val) = std::env::var("PAGINATE_BY") {
            if let Ok(n) = val.parse() {
                self.paginate_by = n;
            }
        }
        if let Ok(val) = std::env::var("PAGE_VAR") {
            self.page_var = val;
        }
        if let Ok(val) = std::env::var("STEM") {
            self.stem = val;
        }
        if let Ok(val) = std::env::var("SEARCH_EXTENSION") {
            self.search_extension = val;
        }
        if let Ok(val) = std::env::var("STAR_ALL") {
            if let Ok(b) = val.parse() {
                self.star_all = b;
            }
        }
        if let Ok(val) = std::env::var("URL_PREFIX") {
            self.url_prefix = val;
        }
        if let Ok(val) = std::env::var("C_EXTENSIONS") {
            if let Ok(b) = val.parse() {
                self.c_extensions = b;
            }
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig {
            stem: Stem::parse(&self.stem).map_err(|e| anyhow::anyhow!("invalid STEM: {e}"))?,
            journal_mode: self.sqlite_pragmas.journal_mode.clone(),
            cache_size_kib: -self.sqlite_pragmas.cache_size_mb * 1024,
            synchronous: self.sqlite_pragmas.fsync,
        })
    }
}

/// Loads a config file if given (`SCOUT_CONFIG` or `--config`), falling
/// back to built-in defaults, then layers environment variables on top.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path
        .map(PathBuf::from)
        .or_else(|| std::env::var("SCOUT_CONFIG").ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {path:?}"))?;
            toml::from_str(&content).context("failed to parse TOML config")?
        }
        None => Config::default(),
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.paginate_by, 50);
        assert_eq!(config.page_var, "page");
        assert!(!config.star_all);
    }

    #[test]
    fn validate_rejects_out_of_range_paginate_by() {
        let mut config = Config::default();
        config.paginate_by = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_stem() {
        let mut config = Config::default();
        config.stem = "snowball".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.toml");
        fs::write(&path, "host = \"0.0.0.0\"\nport = 9000\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
    }
}
