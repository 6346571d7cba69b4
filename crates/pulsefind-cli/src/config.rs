//! Configuration loading and validation

use anyhow::Result;
use pulsefind_discovery::ScanConfig;
use pulsefind_npoint::NPOINT_PORT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    /// Network to scan in CIDR notation
    #[serde(default = "default_network")]
    pub network: String,
    /// Device WebSocket port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
    /// Display info level (0 = minimal, 9 = full)
    #[serde(default)]
    pub display_level: u8,
    /// MAC suffix filter; empty disables filtering
    #[serde(default)]
    pub mac_filter: String,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            network: default_network(),
            port: default_port(),
            timeout_secs: default_timeout(),
            display_level: 0,
            mac_filter: String::new(),
        }
    }
}

fn default_network() -> String {
    // Factory-default nPoint deployment block.
    "129.196.196.0/23".to_string()
}

fn default_port() -> u16 {
    NPOINT_PORT
}

fn default_timeout() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Label language, "en" or "es"
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Convert to ScanConfig
    pub fn to_scan_config(&self) -> ScanConfig {
        ScanConfig {
            network: self.scan.network.clone(),
            port: self.scan.port,
            timeout_secs: self.scan.timeout_secs,
            display_level: self.scan.display_level,
            mac_filter: self.scan.mac_filter.clone(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
