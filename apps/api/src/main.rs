mod analytics;
mod config;
mod db;
mod errors;
mod insights;
mod llm_client;
mod models;
mod pipeline;
mod records;
mod render;
mod routes;
mod scoring;
mod state;
mod stores;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, S3Config, StorageBackend};
use crate::db::{create_pool, ensure_schema};
use crate::insights::catalog::{StaticJobCatalog, StaticSkillCatalog};
use crate::llm_client::{LlmClient, RetryPolicy};
use crate::pipeline::coordinator::Collaborators;
use crate::pipeline::registry::SubmissionRegistry;
use crate::render::pdftoppm::PdftoppmRenderer;
use crate::routes::build_router;
use crate::scoring::llm::LlmScoringEngine;
use crate::state::AppState;
use crate::stores::memory::{MemoryBlobStore, MemoryRecordStore};
use crate::stores::postgres::PgRecordStore;
use crate::stores::redis_store::RedisRecordStore;
use crate::stores::s3::S3BlobStore;
use crate::stores::{BlobStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lumino API v{}", env!("CARGO_PKG_VERSION"));

    let records = build_record_store(&config).await?;

    let blobs: Arc<dyn BlobStore> = match &config.s3 {
        Some(s3_config) => {
            let client = build_s3_client(s3_config).await;
            info!("S3 client initialized (bucket: {})", s3_config.bucket);
            Arc::new(S3BlobStore::new(client, s3_config.bucket.clone()))
        }
        None => {
            info!("Using in-memory blob store");
            Arc::new(MemoryBlobStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), RetryPolicy::default())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let renderer = PdftoppmRenderer::new(config.pdftoppm_path.clone(), config.preview_dpi);
    info!(
        "Preview renderer: {} at {} dpi",
        config.pdftoppm_path.display(),
        config.preview_dpi
    );

    // Build app state
    let state = AppState {
        deps: Collaborators {
            records,
            blobs: blobs.clone(),
            renderer: Arc::new(renderer),
            scoring: Arc::new(LlmScoringEngine::new(llm, blobs)),
        },
        submissions: SubmissionRegistry::new(),
        skill_catalog: Arc::new(StaticSkillCatalog::default()),
        job_catalog: Arc::new(StaticJobCatalog),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_record_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.storage_backend {
        StorageBackend::Redis => {
            let url = config.redis_url.clone().context("REDIS_URL is not set")?;
            let client = redis::Client::open(url)?;
            Ok(Arc::new(RedisRecordStore::connect(&client).await?))
        }
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL is not set")?;
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Ok(Arc::new(PgRecordStore::new(pool)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory record store; records are lost on restart");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "lumino-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
