//! Pulsefind nPoint - WebSocket query protocol for device probes
//!
//! This crate drives one device's probe session: the nonce handshake and
//! the chain of SHA-1 signed attribute queries that follows it.

pub mod session;
pub mod transport;

pub use session::{probe_device, Nonce, ProbeOptions, SessionError, NPOINT_PORT};
pub use transport::WsTransport;
