//! The connection manager: one persistent socket, lifecycle tracking,
//! inbound decode and observer fan-out, outbound send.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use crate::config;
use crate::event::{InboundMessage, SessionEvent};
use crate::registry::{EventHandler, HandlerId, HandlerRegistry};
use crate::transport::{TransportConnector, TransportError, TransportEvents, TransportHandle};

/// Client session over a single transport connection.
///
/// Cheap to clone; clones share the same connection, state and registry.
/// Every operation returns immediately - connection progress and inbound
/// traffic arrive later through the transport's lifecycle callbacks, which
/// run sequentially, so frames reach observers in arrival order.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    connector: Arc<dyn TransportConnector>,
    default_url: String,
}

struct SessionInner {
    transport: Option<Box<dyn TransportHandle>>,
    connected: bool,
    last_message: Option<InboundMessage>,
    registry: HandlerRegistry,
    /// Bumped whenever a transport is released, so lifecycle callbacks
    /// still in flight from that transport are ignored.
    epoch: u64,
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Session against the process-wide default endpoint (see
    /// [`crate::config`]).
    pub fn new(connector: Arc<dyn TransportConnector>) -> Self {
        Self::with_endpoint(connector, config::default_endpoint())
    }

    /// Session with an explicit default endpoint.
    pub fn with_endpoint(connector: Arc<dyn TransportConnector>, url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                transport: None,
                connected: false,
                last_message: None,
                registry: HandlerRegistry::default(),
                epoch: 0,
            })),
            connector,
            default_url: url.into(),
        }
    }

    /// The endpoint used when [`Session::connect`] gets no override.
    pub fn endpoint(&self) -> &str {
        &self.default_url
    }

    /// True between a confirmed open and a close.
    pub fn is_connected(&self) -> bool {
        lock(&self.inner).connected
    }

    /// Most recently decoded inbound payload, if any frame arrived yet.
    pub fn last_message(&self) -> Option<InboundMessage> {
        lock(&self.inner).last_message.clone()
    }

    /// Open a connection to `url`, or to the configured default when `None`.
    ///
    /// A no-op while the current connection is open and healthy, so repeated
    /// UI triggers cannot stack up duplicate connections. Otherwise any stale
    /// handle is closed best-effort and released first, and a new transport
    /// is created with its lifecycle callbacks installed before any traffic
    /// can be observed.
    pub fn connect(&self, url: Option<&str>) -> Result<(), TransportError> {
        let target = url.unwrap_or(&self.default_url).to_string();

        let epoch = {
            let mut inner = lock(&self.inner);
            if let Some(transport) = inner.transport.as_ref() {
                if transport.is_open() {
                    tracing::debug!("Already connected, ignoring connect request");
                    return Ok(());
                }
            }
            // Stale handle: close must not block the new connection.
            if let Some(stale) = inner.transport.take() {
                if let Err(e) = stale.close() {
                    tracing::debug!("Failed to close stale connection: {}", e);
                }
            }
            inner.connected = false;
            inner.epoch += 1;
            inner.epoch
        };

        tracing::info!("Connecting to {}", target);
        let handle = self
            .connector
            .connect(&target, self.lifecycle_events(epoch))?;
        lock(&self.inner).transport = Some(handle);
        Ok(())
    }

    /// Encode `payload` as JSON and transmit it.
    ///
    /// Returns false - with a log entry, never a panic or an error - when no
    /// connection is open or when encoding or transmission fails.
    pub fn send<T: Serialize>(&self, payload: &T) -> bool {
        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode outbound payload: {}", e);
                return false;
            }
        };

        let inner = lock(&self.inner);
        let transport = match inner.transport.as_ref() {
            Some(transport) if transport.is_open() => transport,
            _ => {
                tracing::warn!("Connection not open, cannot send");
                return false;
            }
        };
        match transport.send_text(text) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to send frame: {}", e);
                false
            }
        }
    }

    /// Close the current connection, if any.
    ///
    /// Idempotent. Shutdown errors are swallowed; state is cleaned up
    /// regardless. Observers receive no synthetic notification for a close
    /// they asked for - only a transport-driven close produces one.
    pub fn close(&self) {
        let transport = {
            let mut inner = lock(&self.inner);
            let Some(transport) = inner.transport.take() else {
                return;
            };
            inner.connected = false;
            // The transport's own close event trails this request; the epoch
            // bump keeps it from reaching observers.
            inner.epoch += 1;
            transport
        };
        if let Err(e) = transport.close() {
            tracing::debug!("Failed to close connection: {}", e);
        }
        tracing::info!("Connection closed");
    }

    /// Register an observer for every inbound payload and synthetic close
    /// notification.
    ///
    /// The returned subscription removes exactly this registration; dropping
    /// it without unsubscribing keeps the observer registered for the life
    /// of the session. Registration and removal are safe at any time,
    /// including from inside a handler during dispatch.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(SessionEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = lock(&self.inner).registry.insert(Arc::new(handler));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lifecycle_events(&self, epoch: u64) -> TransportEvents {
        let open_inner = Arc::downgrade(&self.inner);
        let frame_inner = Arc::downgrade(&self.inner);
        let close_inner = Arc::downgrade(&self.inner);
        TransportEvents {
            on_open: Box::new(move || handle_open(&open_inner, epoch)),
            on_frame: Box::new(move |text| handle_frame(&frame_inner, epoch, &text)),
            on_close: Box::new(move || handle_close(&close_inner, epoch)),
            on_error: Box::new(|e| {
                // Logged only; the transport's own close sequence follows.
                tracing::error!("Connection error: {}", e);
            }),
        }
    }
}

/// Unregister capability returned by [`Session::on_message`].
#[derive(Debug)]
pub struct Subscription {
    id: HandlerId,
    inner: Weak<Mutex<SessionInner>>,
}

impl Subscription {
    /// Remove the registration. Safe to call repeatedly; later calls are
    /// no-ops, as is unsubscribing after the session is gone.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).registry.remove(self.id);
        }
    }
}

fn handle_open(inner: &Weak<Mutex<SessionInner>>, epoch: u64) {
    let Some(inner) = inner.upgrade() else { return };
    let mut state = lock(&inner);
    if state.epoch != epoch {
        return;
    }
    state.connected = true;
    tracing::info!("Connection open");
}

fn handle_frame(inner: &Weak<Mutex<SessionInner>>, epoch: u64, text: &str) {
    let Some(inner) = inner.upgrade() else { return };
    let message = InboundMessage::decode(text);
    let handlers = {
        let mut state = lock(&inner);
        if state.epoch != epoch {
            return;
        }
        state.last_message = Some(message.clone());
        state.registry.snapshot()
    };
    fan_out(&handlers, &SessionEvent::Message(message));
}

fn handle_close(inner: &Weak<Mutex<SessionInner>>, epoch: u64) {
    let Some(inner) = inner.upgrade() else { return };
    let (handlers, last_message) = {
        let mut state = lock(&inner);
        if state.epoch != epoch {
            // Caller-initiated close or a superseded connection; observers
            // were already detached from this transport.
            return;
        }
        state.connected = false;
        state.transport = None;
        state.epoch += 1;
        (state.registry.snapshot(), state.last_message.clone())
    };
    tracing::info!("Connection closed by transport");
    fan_out(&handlers, &SessionEvent::SocketClosed { last_message });
}

/// Invoke every handler in the snapshot. One failing observer never blocks
/// the rest of the pass and never touches session state. The registry lock
/// is not held here, so handlers may call back into the session freely.
fn fan_out(handlers: &[EventHandler], event: &SessionEvent) {
    for handler in handlers {
        if let Err(e) = handler(event.clone()) {
            tracing::warn!("Message handler failed: {:#}", e);
        }
    }
}
