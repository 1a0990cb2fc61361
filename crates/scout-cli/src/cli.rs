use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(about = "Multi-tenant full-text search service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database file, or `:memory:`. Falls back to
    /// SCOUT_DATABASE / config `DATABASE` when omitted.
    pub database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    #[arg(short = 'H', long = "host")]
    pub host: Option<String>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    #[arg(short = 'u', long = "url-prefix")]
    pub url_prefix: Option<String>,

    /// FTS tokenizer: `simple` or `porter`
    #[arg(short = 's', long = "stem")]
    pub stem: Option<String>,

    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    #[arg(long = "paginate-by")]
    pub paginate_by: Option<i64>,

    #[arg(short = 'k', long = "api-key")]
    pub api_key: Option<String>,

    /// Pragma cache_size, in megabytes
    #[arg(short = 'C', long = "cache-size")]
    pub cache_size: Option<i64>,

    /// Request crash-durable writes (`synchronous = FULL`)
    #[arg(short = 'f', long = "fsync")]
    pub fsync: bool,

    #[arg(short = 'j', long = "journal-mode")]
    pub journal_mode: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(short = 'l', long = "logfile")]
    pub logfile: Option<PathBuf>,
}
