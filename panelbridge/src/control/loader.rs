//! Loading control catalogs from JSON definition files.
//!
//! The simulation host publishes one JSON document per aircraft module:
//!
//! ```text
//! {
//!   "Engine Panel": {
//!     "AAP_EGIPWR": {
//!       "category": "Engine Panel",
//!       "description": "EGI Power",
//!       "identifier": "AAP_EGIPWR",
//!       "outputs": [
//!         { "address": 4334, "mask": 1, "shift_by": 0, "max_value": 1, "type": "integer" }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Only the first output of each control is used. Controls without outputs
//! (pure inputs) are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::descriptor::{ControlDescriptor, ValueKind};
use super::registry::{ControlRegistry, RegistryError};

#[derive(Debug, Deserialize)]
struct RawControl {
    identifier: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    address: u32,
    #[serde(default = "default_mask")]
    mask: u32,
    #[serde(default)]
    shift_by: u8,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    max_value: Option<u32>,
    #[serde(default)]
    max_length: Option<u32>,
}

fn default_mask() -> u32 {
    0xFFFF
}

/// Widest shift that still leaves a bit of a 32-bit word.
const MAX_SHIFT: u8 = 31;

type Catalog = BTreeMap<String, BTreeMap<String, RawControl>>;

fn parse_catalog(json: &str) -> Result<Vec<ControlDescriptor>, RegistryError> {
    let catalog: Catalog = serde_json::from_str(json)
        .map_err(|e| RegistryError::InvalidDefinitions(e.to_string()))?;

    let mut descriptors = Vec::new();
    for controls in catalog.into_values() {
        for control in controls.into_values() {
            if let Some(descriptor) = to_descriptor(control)? {
                descriptors.push(descriptor);
            }
        }
    }
    Ok(descriptors)
}

fn to_descriptor(control: RawControl) -> Result<Option<ControlDescriptor>, RegistryError> {
    let Some(output) = control.outputs.into_iter().next() else {
        debug!(identifier = %control.identifier, "Skipping control without outputs");
        return Ok(None);
    };

    let value_kind = match output.kind.as_str() {
        "integer" => ValueKind::Integer,
        "string" => ValueKind::String,
        other => {
            return Err(RegistryError::InvalidDefinitions(format!(
                "{}: unknown output type '{}'",
                control.identifier, other
            )))
        }
    };

    if output.shift_by > MAX_SHIFT {
        return Err(RegistryError::InvalidDefinitions(format!(
            "{}: shift_by {} exceeds {}",
            control.identifier, output.shift_by, MAX_SHIFT
        )));
    }

    let descriptor = match value_kind {
        ValueKind::Integer => {
            let mut d = ControlDescriptor::integer(
                control.identifier,
                output.address,
                output.mask,
                output.shift_by,
            );
            d.max_value = output.max_value;
            d
        }
        ValueKind::String => {
            let max_length = output.max_length.ok_or_else(|| {
                RegistryError::InvalidDefinitions(format!(
                    "{}: string output without max_length",
                    control.identifier
                ))
            })?;
            ControlDescriptor::string(control.identifier, output.address, max_length)
        }
    };

    Ok(Some(
        descriptor
            .with_category(control.category)
            .with_description(control.description),
    ))
}

/// Build a registry from a single JSON catalog document.
pub fn load_from_str(json: &str) -> Result<ControlRegistry, RegistryError> {
    ControlRegistry::from_descriptors(parse_catalog(json)?)
}

/// Build a registry from one or more JSON catalog files.
///
/// Files are merged in order; an identifier defined in two files is an
/// error.
pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<ControlRegistry, RegistryError> {
    let mut descriptors = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::InvalidDefinitions(format!("{}: {}", path.display(), e))
        })?;
        let parsed = parse_catalog(&json)?;
        debug!(path = %path.display(), controls = parsed.len(), "Loaded control catalog");
        descriptors.extend(parsed);
    }

    let registry = ControlRegistry::from_descriptors(descriptors)?;
    info!(controls = registry.len(), files = paths.len(), "Control registry loaded");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "Engine Panel": {
            "AAP_EGIPWR": {
                "category": "Engine Panel",
                "description": "EGI Power",
                "identifier": "AAP_EGIPWR",
                "outputs": [
                    { "address": 4334, "mask": 1, "shift_by": 0, "max_value": 1, "type": "integer" }
                ]
            },
            "AAP_STEER": {
                "identifier": "AAP_STEER",
                "outputs": []
            }
        },
        "UFC": {
            "UFC_COMM1_DISPLAY": {
                "category": "UFC",
                "description": "Comm 1 channel",
                "identifier": "UFC_COMM1_DISPLAY",
                "outputs": [
                    { "address": 29778, "max_length": 2, "type": "string" }
                ]
            }
        }
    }"#;

    #[test]
    fn test_load_from_str() {
        let registry = load_from_str(CATALOG).unwrap();
        assert_eq!(registry.len(), 2);

        let egi = registry.lookup("AAP_EGIPWR").unwrap();
        assert_eq!(egi.address, 4334);
        assert_eq!(egi.mask, 1);
        assert_eq!(egi.max_value, Some(1));
        assert_eq!(egi.description, "EGI Power");

        let comm = registry.lookup("UFC_COMM1_DISPLAY").unwrap();
        assert_eq!(comm.value_kind, ValueKind::String);
        assert_eq!(comm.max_length, Some(2));
    }

    #[test]
    fn test_controls_without_outputs_are_skipped() {
        let registry = load_from_str(CATALOG).unwrap();
        assert!(!registry.contains("AAP_STEER"));
    }

    #[test]
    fn test_unknown_output_type_rejected() {
        let json = r#"{"X": {"A": {"identifier": "A", "outputs": [{"address": 1, "type": "float"}]}}}"#;
        assert!(matches!(
            load_from_str(json),
            Err(RegistryError::InvalidDefinitions(_))
        ));
    }

    #[test]
    fn test_string_without_length_rejected() {
        let json = r#"{"X": {"A": {"identifier": "A", "outputs": [{"address": 1, "type": "string"}]}}}"#;
        assert!(load_from_str(json).is_err());
    }

    #[test]
    fn test_oversized_shift_rejected() {
        let json = r#"{"X": {"A": {"identifier": "A", "outputs": [{"address": 1, "mask": 65535, "shift_by": 40, "type": "integer"}]}}}"#;
        match load_from_str(json) {
            Err(RegistryError::InvalidDefinitions(message)) => {
                assert!(message.contains("shift_by 40"), "{}", message)
            }
            other => panic!("expected InvalidDefinitions, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            load_from_str("{ not json"),
            Err(RegistryError::InvalidDefinitions(_))
        ));
    }

    #[test]
    fn test_load_from_paths_detects_duplicates() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        first.write_all(CATALOG.as_bytes()).unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        second.write_all(CATALOG.as_bytes()).unwrap();

        let single = load_from_paths(&[first.path()]).unwrap();
        assert_eq!(single.len(), 2);

        let merged = load_from_paths(&[first.path(), second.path()]);
        assert!(matches!(
            merged,
            Err(RegistryError::DuplicateIdentifier(_))
        ));
    }
}
