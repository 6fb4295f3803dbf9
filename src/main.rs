use crate::config::settings::AppConfig;
use crate::infrastructure::download::SourceFetcher;
use crate::infrastructure::media::{FfmpegSampler, FfprobeProber};
use crate::modules::thumbnails::callback::CallbackNotifier;
use crate::pipeline::ThumbnailPipeline;
use crate::state::AppState;
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod pipeline;
mod routes;
mod state;
mod workers;

#[cfg(test)]
mod test_support;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("invalid configuration")?;
    let pipeline = ThumbnailPipeline::new(
        Arc::new(FfmpegSampler::new(&config.ffmpeg_bin)),
        Arc::new(FfprobeProber::new(&config.ffprobe_bin)),
        SourceFetcher::new().context("failed to build download client")?,
    );
    let notifier =
        CallbackNotifier::new(&config.callback).context("failed to build callback client")?;

    let port = config.server_port;
    let worker_count = config.workers;
    let state = AppState::new(config, pipeline, notifier);

    let workers = workers::thumbnailer::start_worker_pool(state.clone(), worker_count);
    let app = app::create_app(state.clone()).await;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("HTTP server drained, stopping job queue...");
    state.queue.shutdown();
    workers.join().await;
    info!("👋 Bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
