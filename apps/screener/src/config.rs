use std::fmt;

use anyhow::{bail, Context, Result};

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_INGEST_CONCURRENCY: usize = 3;
const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Where records and original PDFs live.
#[derive(Clone)]
pub enum StoreBackend {
    /// PostgreSQL records plus an S3 bucket for PDFs.
    Postgres(PostgresConfig),
    /// Process-local; everything is lost on exit.
    Memory,
}

#[derive(Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_default_model: String,
    pub ingest_concurrency: usize,
    pub max_upload_mb: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend = match or_default("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres(PostgresConfig {
                database_url: require("DATABASE_URL")?,
                s3_bucket: require("S3_BUCKET")?,
                s3_endpoint: require("S3_ENDPOINT")?,
                aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let ingest_concurrency = or_default(
            "INGEST_CONCURRENCY",
            &DEFAULT_INGEST_CONCURRENCY.to_string(),
        )
        .parse::<usize>()
        .context("INGEST_CONCURRENCY must be a positive integer")?;
        if ingest_concurrency == 0 {
            bail!("INGEST_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            backend,
            llm_api_key: require("LLM_API_KEY")?,
            llm_api_url: or_default("LLM_API_URL", DEFAULT_LLM_API_URL),
            llm_default_model: or_default("LLM_DEFAULT_MODEL", DEFAULT_LLM_MODEL),
            ingest_concurrency,
            max_upload_mb: or_default("MAX_UPLOAD_MB", &DEFAULT_MAX_UPLOAD_MB.to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_MB must be a positive integer")?,
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

// Credentials stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            StoreBackend::Postgres(pg) => format!("postgres (bucket {})", pg.s3_bucket),
            StoreBackend::Memory => "memory".to_string(),
        };
        f.debug_struct("Config")
            .field("backend", &backend)
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_default_model", &self.llm_default_model)
            .field("ingest_concurrency", &self.ingest_concurrency)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish_non_exhaustive()
    }
}
