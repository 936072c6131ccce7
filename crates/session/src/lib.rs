//! Client-side session substrate for real-time parlor-game frontends.
//!
//! One [`Session`] owns one persistent text-frame connection: it tracks the
//! connection lifecycle, decodes inbound JSON frames (falling back to raw
//! text), fans each payload out to registered observers with per-observer
//! failure isolation, and exposes a non-blocking JSON send. The concrete
//! socket lives behind the [`transport`] port; see `parlor-adapters` for the
//! WebSocket implementation and [`testing`] for the in-memory mock.

pub mod config;
pub mod event;
pub mod registry;
pub mod session;
pub mod testing;
pub mod transport;

pub use event::{InboundMessage, SessionEvent};
pub use registry::HandlerId;
pub use session::{Session, Subscription};
pub use transport::{TransportConnector, TransportError, TransportEvents, TransportHandle};
