//! Console rendering for live results and the final summary

use pulsefind_core::{catalog, DeviceReport, Language, QUERY_CATALOG};
use std::net::Ipv4Addr;

/// Startup banner echoing the address range about to be scanned
pub fn banner(network: &str, first: Ipv4Addr, last: Ipv4Addr) {
    println!("Scan IP Network: {network}");
    println!("Scan Begin Addr: {first}");
    println!("Scan End Addr:   {last}");
    println!();
}

/// One device's block of labeled attribute lines.
///
/// The block opens with the device address under the identity label, then
/// lists every extracted field. Multi-line payloads are flattened except
/// for the memory blob, which is reshaped into per-entry lines.
pub fn device_block(report: &DeviceReport, language: Language) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}= {}\n",
        QUERY_CATALOG[0].label(language),
        report.addr
    ));

    for field in &report.fields {
        let Some(spec) = catalog::find(&field.key) else {
            continue;
        };
        let label = spec.label(language);
        let flat = field.value.replace('\n', " ");

        match field.key.as_str() {
            "free" => {
                out.push_str(label);
                out.push('\n');
                let reshaped = flat.replace(':', "=").replace("kB ", "kB\n").replace("kB", "k");
                out.push_str(&reshaped);
                out.push('\n');
            }
            // Voltage payloads open with a 5-character unit prefix.
            "batt" | "poev" => {
                let value = flat
                    .char_indices()
                    .nth(5)
                    .map(|(idx, _)| &flat[idx..])
                    .unwrap_or(flat.as_str());
                out.push_str(&format!("{label}= {value}\n"));
            }
            _ => out.push_str(&format!("{label}= {flat}\n")),
        }
    }
    out
}

/// Closing lines once every session has terminated
pub fn summary(total_found: usize, filter_active: bool) {
    println!("\nDONE");
    if !filter_active {
        println!("Total nPoint devices found= {total_found}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsefind_core::FieldValue;

    fn report(fields: Vec<FieldValue>) -> DeviceReport {
        DeviceReport::new(Ipv4Addr::new(10, 0, 0, 7), fields, false)
    }

    #[test]
    fn test_block_opens_with_address_line() {
        let block = device_block(
            &report(vec![FieldValue::new("gtme_web", "00c017330030")]),
            Language::English,
        );
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "MAC Address= 10.0.0.7");
        assert_eq!(lines[1], "MAC Address= 00c017330030");
    }

    #[test]
    fn test_spanish_labels() {
        let block = device_block(
            &report(vec![FieldValue::new("gtme_web", "00c017330030")]),
            Language::Spanish,
        );
        assert!(block.starts_with("Dirección MAC= 10.0.0.7\n"));
    }

    #[test]
    fn test_multiline_values_are_flattened() {
        let block = device_block(
            &report(vec![FieldValue::new("link", "eth0 up\n1000 Mbps")]),
            Language::English,
        );
        assert!(block.contains("Link Info= eth0 up 1000 Mbps\n"));
    }

    #[test]
    fn test_voltage_prefix_is_dropped() {
        let block = device_block(
            &report(vec![FieldValue::new("batt", "volt=12.4V")]),
            Language::English,
        );
        assert!(block.contains("Voltage - Battery= 12.4V\n"));
    }

    #[test]
    fn test_short_voltage_value_kept_verbatim() {
        let block = device_block(
            &report(vec![FieldValue::new("poev", "48V")]),
            Language::English,
        );
        assert!(block.contains("Voltage - PoE= 48V\n"));
    }

    #[test]
    fn test_memory_blob_is_reshaped() {
        let block = device_block(
            &report(vec![FieldValue::new("free", "MemTotal: 512000 kB MemFree: 128000 kB")]),
            Language::English,
        );
        assert!(block.contains("Memory Information...\n"));
        assert!(block.contains("MemTotal= 512000 k\n"));
        assert!(block.contains("MemFree= 128000 k\n"));
    }
}
