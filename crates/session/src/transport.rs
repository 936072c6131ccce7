//! Transport port - the socket capability the session depends on.
//!
//! The session only needs a bidirectional text-frame socket: open it with
//! lifecycle callbacks installed up front, query readiness synchronously,
//! push text frames without blocking, and close. Concrete implementations
//! live in adapter crates; [`crate::testing`] has an in-memory mock.

use thiserror::Error;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("failed to open connection: {0}")]
    Connect(String),
    /// The operation requires an open connection.
    #[error("connection is not open")]
    NotOpen,
    /// A frame could not be transmitted.
    #[error("failed to transmit frame: {0}")]
    Send(String),
    /// The connection failed mid-stream.
    #[error("connection error: {0}")]
    Stream(String),
}

/// Lifecycle notification slots, installed atomically when the transport is
/// created so no inbound traffic can be observed without them.
///
/// Implementations must deliver events sequentially, and only after
/// [`TransportConnector::connect`] has returned.
pub struct TransportEvents {
    /// The connection finished opening and is ready for traffic.
    pub on_open: Box<dyn Fn() + Send + Sync>,
    /// One inbound text frame, in arrival order.
    pub on_frame: Box<dyn Fn(String) + Send + Sync>,
    /// The transport's close sequence completed (remote close, network
    /// failure, or a local close request reaching the wire).
    pub on_close: Box<dyn Fn() + Send + Sync>,
    /// A connection-level error. The transport's own close sequence is
    /// expected to follow; this slot never transitions state by itself.
    pub on_error: Box<dyn Fn(TransportError) + Send + Sync>,
}

/// A live connection handle.
pub trait TransportHandle: Send + Sync {
    /// Synchronous readiness query: true between open and close.
    fn is_open(&self) -> bool;

    /// Queue one outbound text frame. Must not block.
    fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Request shutdown. Best-effort; callers proceed with their own
    /// cleanup regardless of the result.
    fn close(&self) -> Result<(), TransportError>;
}

/// Opens transport connections.
pub trait TransportConnector: Send + Sync {
    /// Open a connection to `url` with `events` wired before any traffic.
    fn connect(
        &self,
        url: &str,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError>;
}
