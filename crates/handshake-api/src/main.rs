//! Handshake crawler HTTP host.

use handshake_api::config::ApiConfig;
use handshake_api::server::{self, AppState};
use handshake_graph::SocialGraph;
use handshake_scheduler::CrawlScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let store = config.open_snapshot_store()?;
    let graph = SocialGraph::restore(store.as_ref());
    let scheduler = match config.seed {
        Some(seed) => CrawlScheduler::seeded(seed),
        None => CrawlScheduler::new(),
    };
    let state = AppState::new(graph, scheduler, Some(store));

    let app = server::router(state.clone());
    tracing::info!(
        snapshot = %config.snapshot_path.display(),
        "handshake API listening on {}",
        config.listen
    );
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    if let Err(e) = state.save_snapshot().await {
        tracing::warn!(error = %e, "final snapshot save failed");
    }
    Ok(())
}
