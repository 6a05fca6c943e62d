mod candidates;
mod config;
mod db;
mod errors;
mod evaluation;
mod extraction;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod searches;
mod settings;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, PostgresConfig, StoreBackend};
use crate::db::create_pool;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::pipeline::{DocumentArchive, MemoryArchive, S3Archive};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryRecordStore, PgRecordStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    let (store, archive): (Arc<dyn RecordStore>, Arc<dyn DocumentArchive>) = match &config.backend {
        StoreBackend::Postgres(pg) => {
            let pool = create_pool(&pg.database_url).await?;
            let s3 = build_s3_client(pg).await;
            info!("S3 client initialized (bucket: {})", pg.s3_bucket);
            (
                Arc::new(PgRecordStore::new(pool)),
                Arc::new(S3Archive::new(s3, pg.s3_bucket.clone())),
            )
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            (Arc::new(MemoryRecordStore::new()), Arc::new(MemoryArchive::new()))
        }
    };

    let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
    ));
    info!(
        "LLM client initialized (default model: {})",
        config.llm_default_model
    );

    let port = config.port;
    let state = AppState::new(config, store, archive, llm);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (local) or AWS (production).
async fn build_s3_client(config: &PostgresConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "screener-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO only serves path-style URLs.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
