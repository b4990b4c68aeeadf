mod config;
mod errors;
mod ingest;
mod llm_client;
mod routes;
mod screening;
mod sessions;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::ingest::DocumentIngestor;
use crate::routes::build_router;
use crate::screening::ScreeningEngine;
use crate::sessions::pipeline::SessionPipeline;
use crate::sessions::store::InMemorySessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    let screener = ScreeningEngine::from_config(&config);
    match screener.mode() {
        "provider" => info!("Screening via provider (model: {})", config.gemini_model),
        _ => warn!("Force-fallback mode: all results are synthesized deterministically"),
    }

    let pipeline = SessionPipeline::new(
        Arc::new(screener),
        Arc::new(DocumentIngestor::new(config.max_upload_size_mb)),
        Arc::new(InMemorySessionStore::new()),
        config.screening_concurrency,
    );
    info!(
        "Pipeline ready (concurrency: {}, upload limit: {} MB)",
        config.screening_concurrency, config.max_upload_size_mb
    );

    let state = AppState {
        config: config.clone(),
        pipeline,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
