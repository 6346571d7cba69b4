//! Pulsefind - nPoint device census over WebSocket
//!
//! Scans an IPv4 network for nGeniusPULSE nPoint devices and reports the
//! attributes each one answers with.

mod config;
mod render;

use anyhow::Result;
use clap::Parser;
use pulsefind_core::Language;
use pulsefind_discovery::{PulseScanner, ScanEvent};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pulsefind")]
#[command(about = "Discover nGeniusPULSE nPoint devices on an IPv4 network")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = "pulsefind.toml")]
    config: PathBuf,

    /// IPv4 network to scan in CIDR notation
    #[arg(short = 'i', long)]
    network: Option<String>,

    /// MAC address suffix filter (e.g., 330030 or 00c017330030)
    #[arg(short, long)]
    mac_filter: Option<String>,

    /// Per-operation timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Display info level: 0 = minimal, 9 = full
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    display_level: Option<u8>,

    /// Label language (en or es)
    #[arg(short, long)]
    language: Option<String>,

    /// Device WebSocket port
    #[arg(long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Append the scan log to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print discovered devices as JSON after the scan
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.log_file.as_deref())?;
    info!("Pulsefind v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;

    let mut scan = config.to_scan_config();
    if let Some(network) = args.network {
        scan.network = network;
    }
    if let Some(filter) = args.mac_filter {
        scan.mac_filter = filter;
    }
    if let Some(timeout) = args.timeout {
        scan.timeout_secs = timeout;
    }
    if let Some(level) = args.display_level {
        scan.display_level = level;
    }
    if let Some(port) = args.port {
        scan.port = port;
    }

    if scan.timeout_secs <= 0.0 {
        anyhow::bail!("timeout must be positive");
    }

    let code = args.language.unwrap_or(config.output.language);
    let language = Language::from_code(&code)
        .ok_or_else(|| anyhow::anyhow!("unsupported language: {code}"))?;

    info!(
        network = %scan.network,
        display_level = scan.display_level,
        "Configuration loaded"
    );

    let filter_active = !scan.mac_filter.is_empty();
    let scanner = PulseScanner::new(scan);
    let mut events = scanner.subscribe();

    // Stream results to the console while sessions are still in flight.
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ScanEvent::ScanStarted {
                    network,
                    first,
                    last,
                    ..
                }) => render::banner(&network, first, last),
                Ok(ScanEvent::DeviceFound(report)) => {
                    print!("{}", render::device_block(&report, language));
                }
                Ok(ScanEvent::HostFailed { .. }) => {}
                Ok(ScanEvent::ScanCompleted { .. }) => break,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped = skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let output = scanner.scan_once().await?;
    printer.await?;

    render::summary(output.summary.total_found, filter_active);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.reports)?);
    }

    Ok(())
}

fn init_logging(level_str: &str, log_file: Option<&Path>) -> Result<()> {
    let level = match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(true)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
