//! Collections of bindings keyed by render target.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::definition::Binding;
use super::error::BindingError;
use super::position::TargetKey;
use crate::control::ControlRegistry;

/// Bindings for one panel, at most one per target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSet {
    bindings: BTreeMap<TargetKey, Binding>,
}

/// Outcome of importing a multi-line binding file.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<BindingError>,
}

impl ImportReport {
    /// Whether every line imported.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import one definition line.
    ///
    /// The binding must pass [`Binding::check`]. On error the set is left
    /// unchanged.
    pub fn import_line(&mut self, line: &str, registry: &ControlRegistry) -> Result<TargetKey, BindingError> {
        let binding = Binding::import(line.trim(), registry)?;
        binding.check(registry)?;
        let target = binding
            .target_key()
            .ok_or(BindingError::MissingDimension("dial position"))?;

        if self.bindings.contains_key(&target) {
            return Err(BindingError::DuplicateTarget(target));
        }
        self.bindings.insert(target, binding);
        Ok(target)
    }

    /// Import every line of `text`. Blank lines and lines starting with `#`
    /// are skipped. Failed lines are reported and do not stop the import.
    pub fn import_str(&mut self, text: &str, registry: &ControlRegistry) -> ImportReport {
        let mut report = ImportReport::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.import_line(line, registry) {
                Ok(target) => {
                    debug!(binding = %target, "Imported binding");
                    report.imported += 1;
                }
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping binding");
                    report.errors.push(BindingError::Line {
                        line: index + 1,
                        source: Box::new(e),
                    });
                }
            }
        }

        report
    }

    /// Import a binding file.
    pub fn import_file(&mut self, path: &Path, registry: &ControlRegistry) -> std::io::Result<ImportReport> {
        let text = fs::read_to_string(path)?;
        let report = self.import_str(&text, registry);
        info!(
            path = %path.display(),
            imported = report.imported,
            errors = report.errors.len(),
            "Loaded bindings"
        );
        Ok(report)
    }

    /// Add or replace a programmatically built binding.
    pub fn insert(&mut self, binding: Binding) -> Result<Option<Binding>, BindingError> {
        let target = binding
            .target_key()
            .ok_or(BindingError::MissingDimension(if binding.dial().is_none() {
                "dial position"
            } else {
                "surface position"
            }))?;
        Ok(self.bindings.insert(target, binding))
    }

    /// Export every bound binding, one line each, in target order.
    pub fn export_lines(&self) -> Result<Vec<String>, BindingError> {
        let mut lines = Vec::with_capacity(self.bindings.len());
        for binding in self.bindings.values() {
            if let Some(line) = binding.export()? {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Binding drawn at `target`.
    pub fn get(&self, target: &TargetKey) -> Option<&Binding> {
        self.bindings.get(target)
    }

    /// Remove and return the binding at `target`.
    pub fn remove(&mut self, target: &TargetKey) -> Option<Binding> {
        self.bindings.remove(target)
    }

    /// Bindings in target order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{DialPosition, SurfacePosition};
    use crate::control::ControlDescriptor;

    fn registry() -> ControlRegistry {
        ControlRegistry::from_descriptors(vec![
            ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
            ControlDescriptor::integer("ANT_EGIHQTOD", 0x10F0, 0x0002, 1),
        ])
        .unwrap()
    }

    const FILE: &str = r"
# COM1 page
Binding{UpperCOM1}\o/{UpperActive}\o/Output{ANT_EGIHQTOD|Equals|0}
Binding{UpperCOM1}\o/{UpperStandby}\o/Formula{(AAP_EGIPWR+1)/2}

Binding{UpperCOM1}\o/{UpperActive}\o/Output{AAP_EGIPWR|Changed|0}
Binding{UpperCOM9}\o/{UpperActive}\o/Output{AAP_EGIPWR|Changed|0}
";

    #[test]
    fn test_import_str_collects_errors() {
        let mut set = BindingSet::new();
        let report = set.import_str(FILE, &registry());

        assert_eq!(report.imported, 2);
        assert_eq!(report.errors.len(), 2);
        assert!(matches!(
            &report.errors[0],
            BindingError::Line { line: 6, source } if matches!(**source, BindingError::DuplicateTarget(_))
        ));
        assert!(matches!(
            &report.errors[1],
            BindingError::Line { line: 7, source } if matches!(**source, BindingError::UnknownDial(_))
        ));

        // The duplicate did not replace the first binding.
        let active = TargetKey::new(DialPosition::UpperCOM1, SurfacePosition::UpperActive);
        assert_eq!(
            set.get(&active).unwrap().output().unwrap().control_id,
            "ANT_EGIHQTOD"
        );
    }

    #[test]
    fn test_failed_line_leaves_set_unchanged() {
        let mut set = BindingSet::new();
        set.import_str(FILE, &registry());
        let before = set.clone();

        let err = set
            .import_line(
                r"Binding{LowerCOM1}\o/{LowerActive}\o/Output{MISSING|Equals|0}",
                &registry(),
            )
            .unwrap_err();
        assert_eq!(err, BindingError::UnknownControl("MISSING".into()));
        assert_eq!(set, before);
    }

    #[test]
    fn test_export_lines_round_trip() {
        let registry = registry();
        let mut set = BindingSet::new();
        set.import_str(FILE, &registry);

        let text = set.export_lines().unwrap().join("\n");
        let mut reimported = BindingSet::new();
        let report = reimported.import_str(&text, &registry);

        assert!(report.is_clean());
        assert_eq!(reimported, set);
    }

    #[test]
    fn test_converter_lines() {
        let registry = registry();
        let mut set = BindingSet::new();
        let report = set.import_str(
            r"
Binding{LowerADF}\o/{LowerActive}\o/Output{AAP_EGIPWR|Changed|0}\o/Converters{Equals|0|OFF;Changed|0|ON}
Binding{LowerADF}\o/{LowerStandby}\o/Output{AAP_EGIPWR|Changed|0}\o/Converters{Changed|0|ON;Equals|0|OFF}
",
            &registry,
        );

        assert_eq!(report.imported, 1);
        assert!(matches!(
            &report.errors[0],
            BindingError::Line { line: 3, source }
                if **source == BindingError::UnreachableConverter { index: 1 }
        ));
        let active = TargetKey::new(DialPosition::LowerADF, SurfacePosition::LowerActive);
        assert_eq!(set.get(&active).unwrap().converters().len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut set = BindingSet::new();
        set.import_str(FILE, &registry());
        let standby = TargetKey::new(DialPosition::UpperCOM1, SurfacePosition::UpperStandby);

        assert!(set.remove(&standby).unwrap().use_formula());
        assert!(set.get(&standby).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.txt");
        std::fs::write(&path, FILE).unwrap();

        let mut set = BindingSet::new();
        let report = set.import_file(&path, &registry()).unwrap();
        assert_eq!(report.imported, 2);
    }
}
