//! Pulsefind Discovery - subnet census for nPoint devices
//!
//! This crate expands a CIDR network into scan targets and fans one
//! WebSocket probe session out per host, streaming outcomes as they land.

pub mod scanner;
pub mod targets;

pub use scanner::{ProbeOutcome, PulseScanner, ScanConfig, ScanEvent, ScanOutput};
pub use targets::{enumerate_hosts, ScanError};
