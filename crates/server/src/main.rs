use std::{net::SocketAddr, sync::Arc, time::Duration};

use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod chatroom;
mod config;
mod session;

use app_state::AppState;
use chatroom::{Chatroom, DEFAULT_CHANNEL_CAPACITY};
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(settings.log_filter()))
        .init();
    info!(?settings, "configuration loaded");

    let room = Chatroom::new(settings.archive_capacity, DEFAULT_CHANNEL_CAPACITY);
    let app = api::build_router(Arc::new(AppState { room }), &settings.asset_dir);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, asset_dir = %settings.asset_dir.display(), "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(settings.graceful_term_millis))
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal(grace_ms: u64) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(grace_ms, "shutdown requested");
    tokio::time::sleep(Duration::from_millis(grace_ms)).await;
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
