//! Report types for devices found during a scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One extracted attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Catalog key the value was extracted for
    pub key: String,
    /// Raw `data` payload from the device, possibly multi-line
    pub value: String,
}

impl FieldValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything one device reported during a probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    /// Address the device answered on
    pub addr: Ipv4Addr,
    /// Extracted values, in catalog order
    pub fields: Vec<FieldValue>,
    /// True when a MAC suffix filter was supplied and the identity matched
    pub matched_filter: bool,
    /// When the probe completed
    pub probed_at: DateTime<Utc>,
}

impl DeviceReport {
    pub fn new(addr: Ipv4Addr, fields: Vec<FieldValue>, matched_filter: bool) -> Self {
        Self {
            addr,
            fields,
            matched_filter,
            probed_at: Utc::now(),
        }
    }

    /// Identity data from the first query, when present
    pub fn identity(&self) -> Option<&str> {
        self.fields.first().map(|field| field.value.as_str())
    }
}

/// Aggregate counts for one completed scan pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Devices that spoke the protocol (and matched the filter, if one was set)
    pub total_found: usize,
    /// Hosts the pass attempted
    pub hosts_scanned: usize,
    /// Wall-clock duration of the pass in seconds
    pub elapsed_secs: f64,
}
