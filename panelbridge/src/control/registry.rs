//! Read-only catalog of every known control.

use std::collections::HashMap;

use thiserror::Error;

use super::descriptor::ControlDescriptor;

/// Errors raised when building or querying the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No control with this identifier exists.
    #[error("Unknown control: {0}")]
    NotFound(String),

    /// Two descriptors carry the same identifier.
    #[error("Duplicate control identifier: {0}")]
    DuplicateIdentifier(String),

    /// The control definition source could not be read or parsed.
    #[error("Invalid control definitions: {0}")]
    InvalidDefinitions(String),
}

/// Catalog of named controls, built once and shared read-only.
///
/// The registry is immutable after construction, so an `Arc<ControlRegistry>`
/// can be read from any thread without further synchronization.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    controls: Vec<ControlDescriptor>,
    by_identifier: HashMap<String, usize>,
    by_address: HashMap<u32, Vec<usize>>,
}

impl ControlRegistry {
    /// Build a registry from a list of descriptors.
    ///
    /// Fails if two descriptors share an identifier.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ControlDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for descriptor in descriptors {
            if registry.by_identifier.contains_key(&descriptor.identifier) {
                return Err(RegistryError::DuplicateIdentifier(descriptor.identifier));
            }

            let index = registry.controls.len();
            registry
                .by_identifier
                .insert(descriptor.identifier.clone(), index);
            registry
                .by_address
                .entry(descriptor.address)
                .or_default()
                .push(index);
            registry.controls.push(descriptor);
        }

        Ok(registry)
    }

    /// Look up a control by identifier.
    pub fn lookup(&self, identifier: &str) -> Result<&ControlDescriptor, RegistryError> {
        self.by_identifier
            .get(identifier)
            .map(|&index| &self.controls[index])
            .ok_or_else(|| RegistryError::NotFound(identifier.to_string()))
    }

    /// Whether a control with this identifier exists.
    pub fn contains(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    /// Iterate over every control. Can be called any number of times.
    pub fn all_controls(&self) -> impl Iterator<Item = &ControlDescriptor> {
        self.controls.iter()
    }

    /// Every control whose base address is `address`.
    pub fn controls_at(&self, address: u32) -> impl Iterator<Item = &ControlDescriptor> {
        self.by_address
            .get(&address)
            .into_iter()
            .flatten()
            .map(|&index| &self.controls[index])
    }

    /// Number of controls.
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Whether the registry has no controls.
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ControlRegistry {
        ControlRegistry::from_descriptors(vec![
            ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
            ControlDescriptor::integer("AAP_CDUPWR", 0x10EE, 0x0002, 1),
            ControlDescriptor::string("UFC_COMM1", 0x2000, 4),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_found() {
        let registry = sample();
        let control = registry.lookup("AAP_CDUPWR").unwrap();
        assert_eq!(control.address, 0x10EE);
        assert_eq!(control.shift, 1);
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = sample();
        assert_eq!(
            registry.lookup("NOPE").unwrap_err(),
            RegistryError::NotFound("NOPE".to_string())
        );
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let result = ControlRegistry::from_descriptors(vec![
            ControlDescriptor::integer("A", 1, 1, 0),
            ControlDescriptor::integer("A", 2, 1, 0),
        ]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateIdentifier("A".to_string())
        );
    }

    #[test]
    fn test_shared_address() {
        let registry = sample();
        let ids: Vec<_> = registry
            .controls_at(0x10EE)
            .map(|c| c.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["AAP_EGIPWR", "AAP_CDUPWR"]);
        assert_eq!(registry.controls_at(0x9999).count(), 0);
    }

    #[test]
    fn test_all_controls_is_restartable() {
        let registry = sample();
        assert_eq!(registry.all_controls().count(), 3);
        assert_eq!(registry.all_controls().count(), 3);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }
}
