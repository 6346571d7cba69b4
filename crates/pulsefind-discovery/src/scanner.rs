//! Concurrent probe scheduling across scan targets
//!
//! One task per host, all launched together; a host's timeout or protocol
//! failure never touches another session. Outcomes stream to subscribers
//! while the pass is still running.

use chrono::Utc;
use pulsefind_core::{DeviceReport, ScanSummary};
use pulsefind_npoint::{probe_device, ProbeOptions, SessionError, NPOINT_PORT};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::targets::{enumerate_hosts, ScanError};

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Network to scan in CIDR notation (e.g., "192.168.1.0/24")
    pub network: String,
    /// Device WebSocket port
    pub port: u16,
    /// Per-operation timeout in seconds
    pub timeout_secs: f64,
    /// Display info level (0 = minimal, 9 = full)
    pub display_level: u8,
    /// MAC suffix filter; empty disables filtering
    pub mac_filter: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            network: "192.168.1.0/24".to_string(),
            port: NPOINT_PORT,
            timeout_secs: 0.1,
            display_level: 0,
            mac_filter: String::new(),
        }
    }
}

impl ScanConfig {
    fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_secs_f64(self.timeout_secs),
            display_level: self.display_level,
            mac_filter: (!self.mac_filter.is_empty()).then(|| self.mac_filter.clone()),
        }
    }
}

/// Scan progress event for real-time reporting
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A pass started over the given address range
    ScanStarted {
        network: String,
        first: Ipv4Addr,
        last: Ipv4Addr,
        host_count: usize,
    },
    /// A device answered its full query chain
    DeviceFound(DeviceReport),
    /// A host failed some step of the protocol (diagnostic stream only)
    HostFailed { addr: Ipv4Addr, reason: SessionError },
    /// All sessions have terminated
    ScanCompleted { found: usize, scanned: usize },
}

/// The terminal result of one probe session
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub addr: Ipv4Addr,
    pub result: Result<DeviceReport, SessionError>,
}

impl ProbeOutcome {
    /// Whether this host counts toward the found total under the given
    /// filter setting.
    pub fn counts_as_found(&self, filter_active: bool) -> bool {
        match &self.result {
            Ok(report) => !filter_active || report.matched_filter,
            Err(_) => false,
        }
    }
}

/// Order-independent found tally over a set of outcomes.
pub fn tally(outcomes: &[ProbeOutcome], filter_active: bool) -> usize {
    outcomes
        .iter()
        .filter(|outcome| outcome.counts_as_found(filter_active))
        .count()
}

/// Everything a completed pass produced
#[derive(Debug)]
pub struct ScanOutput {
    /// Reports for every device that answered, in completion order
    pub reports: Vec<DeviceReport>,
    pub summary: ScanSummary,
}

/// Subnet census scanner for nPoint devices
pub struct PulseScanner {
    config: ScanConfig,
    event_tx: broadcast::Sender<ScanEvent>,
}

impl PulseScanner {
    pub fn new(config: ScanConfig) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self { config, event_tx }
    }

    /// Subscribe to scan progress events
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one full scan pass: enumerate targets, probe them all, and
    /// return the surviving reports with the aggregate summary.
    pub async fn scan_once(&self) -> Result<ScanOutput, ScanError> {
        let targets = enumerate_hosts(&self.config.network)?;
        let first = targets[0];
        let last = targets[targets.len() - 1];

        info!(
            network = %self.config.network,
            hosts = targets.len(),
            "starting scan pass"
        );
        let _ = self.event_tx.send(ScanEvent::ScanStarted {
            network: self.config.network.clone(),
            first,
            last,
            host_count: targets.len(),
        });

        let started = Utc::now();
        let outcomes = self.probe_targets(&targets).await;
        let elapsed_secs = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;

        let filter_active = !self.config.mac_filter.is_empty();
        let summary = ScanSummary {
            total_found: tally(&outcomes, filter_active),
            hosts_scanned: targets.len(),
            elapsed_secs,
        };

        let _ = self.event_tx.send(ScanEvent::ScanCompleted {
            found: summary.total_found,
            scanned: summary.hosts_scanned,
        });
        info!(
            found = summary.total_found,
            scanned = summary.hosts_scanned,
            elapsed_secs = summary.elapsed_secs,
            "scan pass complete"
        );

        let reports = outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .collect();
        Ok(ScanOutput { reports, summary })
    }

    /// Probe every target concurrently and collect the outcomes.
    ///
    /// With an active MAC filter, the first matching device stops further
    /// launches; sessions already in flight finish naturally and their
    /// late results are dropped.
    pub async fn probe_targets(&self, targets: &[Ipv4Addr]) -> Vec<ProbeOutcome> {
        let opts = Arc::new(self.config.probe_options());
        let filter_active = opts.mac_filter.is_some();
        let matched = Arc::new(AtomicBool::new(false));
        let port = self.config.port;

        let mut tasks = JoinSet::new();
        for &addr in targets {
            if filter_active && matched.load(Ordering::Acquire) {
                debug!(ip = %addr, "filter already matched, not launching");
                break;
            }
            let opts = Arc::clone(&opts);
            let matched = Arc::clone(&matched);
            tasks.spawn(async move {
                let result = probe_device(addr, port, &opts).await;
                if matches!(&result, Ok(report) if report.matched_filter) {
                    matched.store(true, Ordering::Release);
                }
                ProbeOutcome { addr, result }
            });
        }

        let mut outcomes = Vec::new();
        let mut match_reported = false;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "probe task aborted");
                    continue;
                }
            };

            match &outcome.result {
                Ok(report) => {
                    if filter_active && match_reported {
                        debug!(ip = %outcome.addr, "match already reported, dropping result");
                        continue;
                    }
                    if report.matched_filter {
                        match_reported = true;
                    }
                    info!(ip = %outcome.addr, "found nPoint device");
                    let _ = self.event_tx.send(ScanEvent::DeviceFound(report.clone()));
                }
                Err(reason) => {
                    debug!(ip = %outcome.addr, reason = %reason, "host excluded");
                    let _ = self.event_tx.send(ScanEvent::HostFailed {
                        addr: outcome.addr,
                        reason: reason.clone(),
                    });
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
