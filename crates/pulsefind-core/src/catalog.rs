//! The fixed catalog of attributes an nPoint device can be asked for
//!
//! Catalog order is load-bearing: queries are sent in this order and each
//! round's signature depends on the nonce returned by the previous round,
//! so entries must never be reordered.

use serde::{Deserialize, Serialize};

/// Output language for attribute labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    /// Parse a language code such as "en" or "ES"
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

/// One attribute the protocol can request from a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySpec {
    /// Wire key, sent as the request's `callType`
    pub key: &'static str,
    /// Minimum display level at which this query runs
    pub min_display_level: u8,
    label_en: &'static str,
    label_es: &'static str,
}

impl QuerySpec {
    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::English => self.label_en,
            Language::Spanish => self.label_es,
        }
    }
}

const fn spec(
    key: &'static str,
    min_display_level: u8,
    label_en: &'static str,
    label_es: &'static str,
) -> QuerySpec {
    QuerySpec {
        key,
        min_display_level,
        label_en,
        label_es,
    }
}

/// Every attribute an nPoint can report, in wire order.
///
/// The first entry is the identity query; the MAC suffix filter is matched
/// against its data.
pub const QUERY_CATALOG: [QuerySpec; 13] = [
    spec("gtme_web", 0, "MAC Address", "Dirección MAC"),
    spec("bver", 0, "Build Version", "Información de la versión"),
    spec("temp", 1, "CPU Temp (degC)", "CPU temperatura (degC)"),
    spec("link", 0, "Link Info", "Enlace información"),
    spec("up_dhm", 0, "System UpTime", "El tiempo de actividad"),
    spec("batt", 2, "Voltage - Battery", "Voltaje - Batería"),
    spec("poev", 2, "Voltage - PoE", "Voltaje - PoE"),
    spec("gurl", 0, "Gemini Cloud URL", "Gemini Cloud URL"),
    spec("mach", 0, "Machine Hardware Name", "Máquina nombre de hardware"),
    spec(
        "sw_port",
        3,
        "Nearest Switch - Port",
        "Conmutador de red - Identificador de puerto",
    ),
    spec(
        "sw_addr",
        0,
        "Nearest Switch - IP/MAC",
        "Conmutador de red - Dirección (IP/MAC)",
    ),
    spec("sw_name", 0, "Nearest Switch - Name", "Conmutador de red - Nombre"),
    spec("free", 4, "Memory Information...", "Información de la memoria..."),
];

/// The catalog prefix that runs at the given display level.
///
/// A session stops at the first entry whose level exceeds `display_level`;
/// entries after that point stay unsent even when their own level would
/// allow them, because their nonce chain depends on the gated rounds.
pub fn visible_prefix(display_level: u8) -> &'static [QuerySpec] {
    let end = QUERY_CATALOG
        .iter()
        .position(|spec| spec.min_display_level > display_level)
        .unwrap_or(QUERY_CATALOG.len());
    &QUERY_CATALOG[..end]
}

/// Look up a catalog entry by wire key
pub fn find(key: &str) -> Option<&'static QuerySpec> {
    QUERY_CATALOG.iter().find(|spec| spec.key == key)
}
