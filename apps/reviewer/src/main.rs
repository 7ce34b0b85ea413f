mod bot;
mod config;
mod document;
mod errors;
mod llm_client;
mod review;
mod routes;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bot::ReviewBot;
use crate::config::Config;
use crate::document::{DocumentPreprocessor, PopplerPreprocessor, ReferenceDocument};
use crate::llm_client::LlmClient;
use crate::review::ReviewPipeline;
use crate::routes::build_router;

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

    info!("Starting resume reviewer v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    if !PopplerPreprocessor::is_available() {
        warn!("poppler-utils not found on PATH; PDF conversion will fail until it is installed");
    }
    let preprocessor: Arc<dyn DocumentPreprocessor> = Arc::new(PopplerPreprocessor::new());

    let mut pipeline = ReviewPipeline::new(llm, Arc::clone(&preprocessor));
    match &config.reference_resume_path {
        Some(path) => {
            let reference = load_reference(Arc::clone(&preprocessor), path).await?;
            pipeline = pipeline.with_reference(reference);
            info!("Extended review enabled (reference: {})", path.display());
        }
        None => info!("No REFERENCE_RESUME_PATH set; reviewing bullet points only"),
    }
    info!("Review channels: {:?}", config.review_channels);

    // Health endpoint for process supervisors
    let app = build_router().layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Health endpoint listening on {addr}");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Health server error: {e}");
        }
    });

    let mut bot = ReviewBot::new(pipeline);
    bot.start(config.bot_config()).await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
        }
        _ = bot.wait() => warn!("Discord client exited"),
    }
    bot.stop().await;

    Ok(())
}

/// Reads and preprocesses the reference résumé once, before any review runs.
async fn load_reference(
    preprocessor: Arc<dyn DocumentPreprocessor>,
    path: &Path,
) -> Result<ReferenceDocument> {
    let document = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read reference resume {}", path.display()))?;

    let reference =
        tokio::task::spawn_blocking(move || ReferenceDocument::prepare(preprocessor.as_ref(), &document))
            .await
            .context("Reference preprocessing task panicked")?
            .with_context(|| format!("Failed to preprocess reference resume {}", path.display()))?;
    Ok(reference)
}
