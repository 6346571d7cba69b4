//! Scan target enumeration from CIDR networks

use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid network {input:?}: {reason}")]
    InvalidNetwork { input: String, reason: String },
}

fn invalid(input: &str, reason: &str) -> ScanError {
    ScanError::InvalidNetwork {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a CIDR network into its usable host addresses.
///
/// Returns the addresses strictly between the network and broadcast
/// addresses, ascending. Host bits set below the mask are tolerated and
/// masked off. Networks without usable hosts (/31, /32) are rejected.
pub fn enumerate_hosts(cidr: &str) -> Result<Vec<Ipv4Addr>, ScanError> {
    let cidr = cidr.trim();
    let (addr_part, prefix_part) = cidr
        .split_once('/')
        .ok_or_else(|| invalid(cidr, "expected CIDR notation like 192.168.1.0/24"))?;

    let addr: Ipv4Addr = addr_part
        .parse()
        .map_err(|_| invalid(cidr, "malformed IPv4 address"))?;
    let prefix: u8 = prefix_part
        .parse()
        .map_err(|_| invalid(cidr, "malformed prefix length"))?;
    if prefix > 32 {
        return Err(invalid(cidr, "prefix length must be at most 32"));
    }
    // A /31 or /32 leaves nothing between network and broadcast.
    if prefix > 30 {
        return Err(invalid(cidr, "no usable host addresses"));
    }

    let mask: u32 = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    let network = u32::from(addr) & mask;
    let broadcast = network | !mask;

    let hosts: Vec<Ipv4Addr> = ((network + 1)..broadcast).map(Ipv4Addr::from).collect();

    debug!(network = %Ipv4Addr::from(network), prefix = prefix, hosts = hosts.len(), "enumerated scan targets");
    Ok(hosts)
}
