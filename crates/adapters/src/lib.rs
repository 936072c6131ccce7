//! Concrete transport implementations for the parlor session core.

pub mod websocket;

pub use websocket::WsConnector;
