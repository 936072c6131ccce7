//! Parlor client runner - composition root binary.
//!
//! Owns the session for the application lifetime; views and routing live
//! elsewhere and receive the session by handle.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parlor_adapters::WsConnector;
use parlor_session::{Session, SessionEvent};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parlor_session=debug,parlor_adapters=debug,parlor_runner=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting parlor client");

    let session = Session::new(Arc::new(WsConnector::new()));

    let subscription = session.on_message(|event| {
        match event {
            SessionEvent::Message(message) => tracing::info!("Inbound: {:?}", message),
            SessionEvent::SocketClosed { last_message } => {
                tracing::info!("Server closed the session (last message: {:?})", last_message);
            }
        }
        Ok(())
    });

    if let Err(e) = session.connect(None) {
        tracing::error!("Failed to open connection: {}", e);
        return;
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }

    subscription.unsubscribe();
    session.close();
}
