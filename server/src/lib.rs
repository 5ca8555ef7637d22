//! Pairs websocket connections into two-player tic-tac-toe rooms and relays
//! moves, resets, and taunts between them.

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod allocator;
pub mod config;
pub mod error;
pub mod relay;
pub mod room;
pub mod taunts;
mod ws;

pub use allocator::{RoomAllocator, Seat};
pub use config::ServerConfig;
pub use error::{IllegalMove, RelayError};
pub use relay::{Outbox, Relay};
pub use room::{Room, RoomPhase};

pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(relay)
}

/// Serves the relay on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, relay: Relay) -> std::io::Result<()> {
    axum::serve(listener, router(relay)).await
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("server listening on ws://{addr}/ws");
    serve(listener, Relay::new()).await.context("server stopped")?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
