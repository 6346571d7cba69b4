//! Session engine for the nPoint signed query protocol
//!
//! A session is one connect-handshake-query sequence against a single
//! host. The device opens with a nonce; every query must carry a SHA-1
//! signature over the query key and the nonce issued in the previous
//! round, and every response carries the nonce for the next round.

use pulsefind_core::{catalog, DeviceReport, FieldValue};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::transport::WsTransport;

/// WebSocket port served by nPoint devices
pub const NPOINT_PORT: u16 = 8000;

/// Why a host was excluded from the scan results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("WebSocket connect failed or timed out")]
    ConnectFailed,
    #[error("handshake carried no nonce")]
    NoNonce,
    #[error("query {0} failed")]
    QueryFailed(&'static str),
    #[error("identity data did not contain the requested suffix")]
    FilterMismatch,
}

/// Single-use signing token issued by the device.
///
/// Signing consumes the nonce, so a value from an earlier round cannot be
/// reused; the replacement comes from the next response.
#[derive(Debug)]
pub struct Nonce(String);

impl Nonce {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// SHA-1 over the raw query key and token bytes, lowercase hex.
    ///
    /// The token is hashed exactly as received; embedded control
    /// characters pass through untouched.
    pub fn sign(self, query_key: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(query_key.as_bytes());
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Per-session settings shared by every probe in a scan pass
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Bound on each connect/send/receive operation
    pub timeout: Duration,
    /// Gates how much of the query catalog runs (0 = minimal, 9 = full)
    pub display_level: u8,
    /// Case-insensitive MAC suffix the identity data must contain
    pub mac_filter: Option<String>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    #[serde(rename = "callType")]
    call_type: &'a str,
    parameter: &'a str,
    signature: String,
}

#[derive(Deserialize)]
struct Handshake {
    nonce: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: String,
    #[serde(default)]
    nonce: String,
}

/// Run the full protocol exchange against one host.
///
/// Every failure is terminal for this host only; the connection is
/// released on all exit paths.
pub async fn probe_device(
    addr: Ipv4Addr,
    port: u16,
    opts: &ProbeOptions,
) -> Result<DeviceReport, SessionError> {
    let mut transport = match WsTransport::connect(addr, port, opts.timeout).await {
        Ok(transport) => transport,
        Err(e) => {
            trace!(ip = %addr, error = %e, "connect failed");
            return Err(SessionError::ConnectFailed);
        }
    };

    let result = run_session(&mut transport, addr, opts).await;
    transport.close().await;
    result
}

async fn run_session(
    transport: &mut WsTransport,
    addr: Ipv4Addr,
    opts: &ProbeOptions,
) -> Result<DeviceReport, SessionError> {
    let greeting = match transport.recv_text().await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(ip = %addr, error = %e, "no handshake message");
            return Err(SessionError::NoNonce);
        }
    };
    trace!(ip = %addr, raw = %greeting, "handshake received");

    let handshake: Handshake =
        serde_json::from_str(&greeting).unwrap_or(Handshake { nonce: None });
    let mut nonce = match handshake.nonce.filter(|n| !n.is_empty()) {
        Some(token) => Nonce::new(token),
        None => {
            debug!(ip = %addr, "handshake carried no nonce");
            return Err(SessionError::NoNonce);
        }
    };

    let mut fields = Vec::new();
    let mut matched_filter = false;

    for (index, spec) in catalog::visible_prefix(opts.display_level).iter().enumerate() {
        let request = QueryRequest {
            call_type: spec.key,
            parameter: "",
            signature: nonce.sign(spec.key),
        };
        let payload =
            serde_json::to_string(&request).map_err(|_| SessionError::QueryFailed(spec.key))?;

        if let Err(e) = transport.send_text(payload).await {
            debug!(ip = %addr, key = spec.key, error = %e, "query send failed");
            return Err(SessionError::QueryFailed(spec.key));
        }

        let raw = match transport.recv_text().await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(ip = %addr, key = spec.key, error = %e, "query receive failed");
                return Err(SessionError::QueryFailed(spec.key));
            }
        };
        trace!(ip = %addr, key = spec.key, raw = %raw, "query response");

        let response: QueryResponse =
            serde_json::from_str(&raw).map_err(|_| SessionError::QueryFailed(spec.key))?;

        // Rotate before anything else: the next round must sign with the
        // token from this response.
        nonce = Nonce::new(response.nonce);

        if index == 0 {
            if let Some(filter) = &opts.mac_filter {
                if matches_filter(&response.data, filter) {
                    matched_filter = true;
                } else {
                    debug!(ip = %addr, "identity does not contain filter suffix");
                    return Err(SessionError::FilterMismatch);
                }
            }
        }

        fields.push(FieldValue::new(spec.key, response.data));
    }

    Ok(DeviceReport::new(addr, fields, matched_filter))
}

/// Case-insensitive suffix match with MAC separators ignored, so a bare
/// hex filter like "330030" finds "AA:BB:00:C0:17:33:00:30".
fn matches_filter(data: &str, filter: &str) -> bool {
    fn canon(s: &str) -> String {
        s.chars()
            .filter(|c| !matches!(c, ':' | '-' | '.' | ' '))
            .collect::<String>()
            .to_lowercase()
    }
    canon(data).contains(&canon(filter))
}
