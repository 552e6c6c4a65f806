//! Offline snapshots.
//!
//! A snapshot is a JSON document holding a registry configuration and the backend's
//! `reportKey -> record` mapping, in the same shapes the backend serves them:
//!
//! ```json
//! {
//!   "config": { "diseases": ["Flu"], "locations": ["EPSP: Bab El Oued"] },
//!   "reports": { "report_Flu_2025-01": { "monthId": "2025-01", "disease": "Flu", "data": {} } }
//! }
//! ```
//!
//! Registry configurations can also be kept on their own as YAML.

use crate::context::ReportingContext;
use crate::registry::{Registry, RegistryConfig};
use crate::store::RecordStore;
use crate::{ReportError, ReportResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotWire {
    #[serde(default)]
    config: RegistryConfig,
    #[serde(default)]
    reports: BTreeMap<String, serde_json::Value>,
}

fn display_path(path: String) -> String {
    if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    }
}

/// Parses snapshot JSON into a reporting context.
///
/// The document structure is strict; individual records are decoded leniently, as they are
/// when fetched from the backend.
///
/// # Errors
///
/// Returns `ReportError::Deserialization` (with the failing path) if the document does not
/// match the snapshot structure, or `ReportError::Validation` if the registry configuration is
/// invalid.
pub fn parse_snapshot(json_text: &str) -> ReportResult<ReportingContext> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    let wire: SnapshotWire = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = display_path(err.path().to_string());
        ReportError::Deserialization {
            path,
            source: err.into_inner(),
        }
    })?;

    let registry = Registry::from_config(&wire.config)?;
    let store = RecordStore::from_backend(wire.reports);
    tracing::debug!(
        diseases = registry.diseases().len(),
        locations = registry.locations().len(),
        records = store.len(),
        "snapshot parsed"
    );

    Ok(ReportingContext::new(Arc::new(registry), Arc::new(store)))
}

/// Reads and parses a snapshot file.
pub fn load_snapshot(path: &Path) -> ReportResult<ReportingContext> {
    let text = fs::read_to_string(path).map_err(ReportError::FileRead)?;
    parse_snapshot(&text)
}

/// Parses a YAML registry configuration.
///
/// # Errors
///
/// Returns `ReportError::YamlDeserialization` (with the failing path) for schema mismatches and
/// `ReportError::Validation` for invalid entries.
pub fn parse_registry_yaml(yaml_text: &str) -> ReportResult<Registry> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    let config: RegistryConfig =
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = display_path(err.path().to_string());
            ReportError::YamlDeserialization {
                path,
                source: err.into_inner(),
            }
        })?;
    Registry::from_config(&config)
}

pub fn load_registry_yaml(path: &Path) -> ReportResult<Registry> {
    let text = fs::read_to_string(path).map_err(ReportError::FileRead)?;
    parse_registry_yaml(&text)
}
