use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Falls back to `MASSTOCK_DATABASE_URL`, then `DATABASE_URL`.
#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
    #[arg(long, default_value_t = 10)]
    pub max_connections: u32,
}

/// Falls back to `MASSTOCK_API_URL`, `MASSTOCK_CLIENT_ID` and
/// `MASSTOCK_API_TOKEN`.
#[derive(Debug, Args, Clone)]
pub struct ApiArgs {
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,
    #[arg(long)]
    pub client_id: Option<String>,
    #[arg(long)]
    pub token: Option<String>,
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

/// Falls back to `MASSTOCK_CATALOG`.
#[derive(Debug, Args, Clone)]
pub struct CatalogArgs {
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct WorkerArgs {
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,
    /// Visibility lease of a received job; keep above the longest workflow
    /// timeout.
    #[arg(long, default_value_t = 900)]
    pub lease_secs: u64,
    #[arg(long, default_value_t = 1000)]
    pub retry_base_delay_ms: u64,
    #[arg(long, default_value_t = 60_000)]
    pub retry_max_delay_ms: u64,
    #[arg(long, default_value_t = 30)]
    pub reaper_interval_secs: u64,
    #[arg(long, default_value_t = 60)]
    pub reaper_grace_secs: u64,
}

/// Falls back to `MASSTOCK_GENERATOR_URL` and `MASSTOCK_GENERATOR_TOKEN`.
#[derive(Debug, Args, Clone)]
pub struct GeneratorArgs {
    /// Default generation service for workflows without an `endpoint`.
    #[arg(long = "generator-url", value_name = "URL")]
    pub generator_url: Option<String>,
    #[arg(long)]
    pub generator_token: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PollArgs {
    #[arg(long, default_value_t = 2000)]
    pub poll_interval_ms: u64,
    /// Give up after this long. Defaults to the execution's timeout plus a
    /// 10 s margin.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Input data as a JSON object.
    #[arg(long, conflicts_with = "input_file")]
    pub input: Option<String>,
    /// JSON file holding the input data.
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,
    /// Individual input fields; values parse as JSON and fall back to
    /// strings.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set_inputs: Vec<String>,
}
