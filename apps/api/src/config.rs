use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where resume records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Postgres,
    /// In-process records and blobs. Nothing survives a restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StorageBackend::Redis),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown STORAGE_BACKEND '{other}' (expected redis, postgres or memory)"),
        }
    }
}

/// Connection details for the S3 / MinIO bucket holding uploads.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable required by the chosen backend is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    /// `None` only with the memory backend.
    pub s3: Option<S3Config>,
    pub anthropic_api_key: String,
    pub pdftoppm_path: PathBuf,
    pub preview_dpi: u32,
    pub progress_tick: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend: StorageBackend = env_or("STORAGE_BACKEND", "redis").parse()?;

        let redis_url = match storage_backend {
            StorageBackend::Redis => Some(require_env("REDIS_URL")?),
            _ => std::env::var("REDIS_URL").ok(),
        };
        let database_url = match storage_backend {
            StorageBackend::Postgres => Some(require_env("DATABASE_URL")?),
            _ => std::env::var("DATABASE_URL").ok(),
        };
        let s3 = match storage_backend {
            StorageBackend::Memory => None,
            _ => Some(S3Config {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
        };

        Ok(Config {
            storage_backend,
            redis_url,
            database_url,
            s3,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            pdftoppm_path: PathBuf::from(env_or("PDFTOPPM_PATH", "pdftoppm")),
            preview_dpi: env_or("PREVIEW_DPI", "100")
                .parse::<u32>()
                .context("PREVIEW_DPI must be a positive integer")?,
            progress_tick: parse_tick(&env_or("PROGRESS_TICK_MS", "200"))?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Progress tick period. Must be non-zero: `interval_at` panics on a zero period.
fn parse_tick(raw: &str) -> Result<Duration> {
    let millis = raw
        .parse::<u64>()
        .context("PROGRESS_TICK_MS must be a number of milliseconds")?;
    if millis == 0 {
        bail!("PROGRESS_TICK_MS must be greater than zero");
    }
    Ok(Duration::from_millis(millis))
}
