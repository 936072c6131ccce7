//! In-memory transport for driving a session in tests.
//!
//! Stands in for the network: tests drive open/frame/close/error from the
//! test body and assert what the session asked the transport to do. Kept
//! public so downstream crates can use it in their own tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::transport::{TransportConnector, TransportError, TransportEvents, TransportHandle};

#[derive(Default)]
struct MockState {
    connects: Vec<String>,
    connections: Vec<Arc<MockConnection>>,
    fail_next_connect: bool,
    fail_sends: bool,
}

struct MockConnection {
    events: TransportEvents,
    open: AtomicBool,
    closed_by_client: AtomicBool,
    sent: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock [`TransportConnector`] for tests.
///
/// Drive methods act on the most recent connection and panic when nothing
/// has been opened yet.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `connect` call fail.
    pub fn fail_next_connect(&self) {
        lock(&self.state).fail_next_connect = true;
    }

    /// Make every subsequent send on live connections fail.
    pub fn fail_sends(&self) {
        lock(&self.state).fail_sends = true;
    }

    /// Urls passed to `connect`, in order.
    pub fn connects(&self) -> Vec<String> {
        lock(&self.state).connects.clone()
    }

    /// Frames sent over the most recent connection.
    pub fn sent_frames(&self) -> Vec<String> {
        lock(&self.current().sent).clone()
    }

    /// How many connections were shut down from the client side.
    pub fn client_closed_count(&self) -> usize {
        lock(&self.state)
            .connections
            .iter()
            .filter(|conn| conn.closed_by_client.load(Ordering::SeqCst))
            .count()
    }

    /// Complete the open handshake of the most recent connection.
    pub fn open(&self) {
        let conn = self.current();
        conn.open.store(true, Ordering::SeqCst);
        (conn.events.on_open)();
    }

    /// Deliver one inbound text frame on the most recent connection.
    pub fn emit_frame(&self, text: &str) {
        let conn = self.current();
        (conn.events.on_frame)(text.to_string());
    }

    /// Close the most recent connection from the far side.
    pub fn close_from_remote(&self) {
        let conn = self.current();
        conn.open.store(false, Ordering::SeqCst);
        (conn.events.on_close)();
    }

    /// Raise a connection-level error on the most recent connection.
    pub fn emit_error(&self, message: &str) {
        let conn = self.current();
        (conn.events.on_error)(TransportError::Stream(message.to_string()));
    }

    fn current(&self) -> Arc<MockConnection> {
        lock(&self.state)
            .connections
            .last()
            .cloned()
            .expect("no connection has been opened")
    }
}

impl TransportConnector for MockConnector {
    fn connect(
        &self,
        url: &str,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let mut state = lock(&self.state);
        state.connects.push(url.to_string());
        if state.fail_next_connect {
            state.fail_next_connect = false;
            return Err(TransportError::Connect("mock refused".to_string()));
        }
        let conn = Arc::new(MockConnection {
            events,
            open: AtomicBool::new(false),
            closed_by_client: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        });
        state.connections.push(Arc::clone(&conn));
        Ok(Box::new(MockHandle {
            conn,
            shared: Arc::clone(&self.state),
        }))
    }
}

struct MockHandle {
    conn: Arc<MockConnection>,
    shared: Arc<Mutex<MockState>>,
}

impl TransportHandle for MockHandle {
    fn is_open(&self) -> bool {
        self.conn.open.load(Ordering::SeqCst)
    }

    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if lock(&self.shared).fail_sends {
            return Err(TransportError::Send("mock send failure".to_string()));
        }
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        lock(&self.conn.sent).push(text);
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        self.conn.open.store(false, Ordering::SeqCst);
        self.conn.closed_by_client.store(true, Ordering::SeqCst);
        Ok(())
    }
}
