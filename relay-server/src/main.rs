//! Waveroom - Relay Server
//!
//! Forwards signaling messages between the clients of a room: room-wide
//! control multicasts, host-directed sync requests and peer-targeted
//! negotiation payloads. Holds no playlist or playback state of its own.
//!
//! Usage:
//!   cargo run --release
//!   WAVEROOM_RELAY_ADDR=0.0.0.0:9000 cargo run --release

mod rooms;
mod server;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rooms::Registry;

const DEFAULT_ADDR: &str = "0.0.0.0:8765";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("WAVEROOM_RELAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("Relay listening on {}", addr);

    let registry: server::SharedRegistry = Arc::new(RwLock::new(Registry::new()));

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(server::handle_connection(
            Arc::clone(&registry),
            stream,
            peer,
        ));
    }
}
