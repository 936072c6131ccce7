//! WebSocket transport using tokio-tungstenite.
//!
//! `connect` returns immediately: a spawned task performs the handshake and
//! bridges the socket to the lifecycle callbacks, while outbound frames and
//! close requests reach the task over an unbounded command channel. Must be
//! called from within a tokio runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use parlor_session::transport::{
    TransportConnector, TransportError, TransportEvents, TransportHandle,
};

enum WriteCommand {
    Text(String),
    Close,
}

/// Opens WebSocket connections against `ws://` / `wss://` endpoints.
#[derive(Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl TransportConnector for WsConnector {
    fn connect(
        &self,
        url: &str,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));
        let task_open = Arc::clone(&open);
        let url = url.to_string();
        tokio::spawn(async move {
            run_connection(url, events, cmd_rx, task_open).await;
        });
        Ok(Box::new(WsHandle { cmd_tx, open }))
    }
}

struct WsHandle {
    cmd_tx: mpsc::UnboundedSender<WriteCommand>,
    open: Arc<AtomicBool>,
}

impl TransportHandle for WsHandle {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.cmd_tx
            .send(WriteCommand::Text(text))
            .map_err(|_| TransportError::NotOpen)
    }

    fn close(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(WriteCommand::Close)
            .map_err(|_| TransportError::NotOpen)
    }
}

async fn run_connection(
    url: String,
    events: TransportEvents,
    mut cmd_rx: mpsc::UnboundedReceiver<WriteCommand>,
    open: Arc<AtomicBool>,
) {
    let (ws_stream, _) = match connect_async(&url).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", url, e);
            (events.on_error)(TransportError::Connect(e.to_string()));
            (events.on_close)();
            return;
        }
    };
    tracing::info!("Connected to {}", url);
    open.store(true, Ordering::SeqCst);
    (events.on_open)();

    let (mut write, mut read) = ws_stream.split();
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(WriteCommand::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        tracing::error!("Failed to send frame: {}", e);
                        (events.on_error)(TransportError::Send(e.to_string()));
                        break;
                    }
                }
                // A dropped handle counts as a close request.
                Some(WriteCommand::Close) | None => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!("Close handshake failed: {}", e);
                    }
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => (events.on_frame)(text),
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("Server closed connection");
                    break;
                }
                // Ping/pong and binary frames carry no application payload.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("Connection error: {}", e);
                    (events.on_error)(TransportError::Stream(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }
    open.store(false, Ordering::SeqCst);
    (events.on_close)();
}
