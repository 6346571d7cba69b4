//! Pulsefind Core - query catalog and report types
//!
//! This crate provides the foundational types for the Pulsefind system:
//! - The fixed nPoint query catalog with display-level gating metadata
//! - Localized attribute labels (English/Spanish)
//! - Report types for devices found during a scan

pub mod catalog;
pub mod report;

pub use catalog::{visible_prefix, Language, QuerySpec, QUERY_CATALOG};
pub use report::{DeviceReport, FieldValue, ScanSummary};
