//! Binding error types.

use thiserror::Error;

use super::position::TargetKey;
use crate::formula::FormulaError;

/// Errors raised when importing, exporting or collecting bindings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    /// A binding with a source is missing a dial or surface position.
    #[error("Cannot export binding: {0} is not set")]
    MissingDimension(&'static str),

    /// The text does not match the binding envelope.
    #[error("Malformed binding definition: {0}")]
    Malformed(String),

    #[error("Unknown dial position: {0}")]
    UnknownDial(String),

    #[error("Unknown surface position: {0}")]
    UnknownSurfacePosition(String),

    #[error("Unknown comparison kind: {0}")]
    UnknownComparison(String),

    /// The output names a control the registry does not know.
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    /// The comparison operand is not an unsigned 32-bit integer.
    #[error("Invalid comparison operand: {0}")]
    InvalidOperand(String),

    /// A converter segment or label is malformed.
    #[error("Invalid converter: {0}")]
    InvalidConverter(String),

    /// A converter follows a catch-all converter and can never be chosen.
    #[error("Converter {index} is unreachable after a Changed converter")]
    UnreachableConverter { index: usize },

    /// A placed binding has no source to show.
    #[error("Binding has no source")]
    NoSource,

    /// The formula source failed to import.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The set already holds a binding for this target.
    #[error("Duplicate binding for {0}")]
    DuplicateTarget(TargetKey),

    /// A line of a binding file failed to import.
    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<BindingError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dimension_names_it() {
        let err = BindingError::MissingDimension("dial position");
        assert_eq!(err.to_string(), "Cannot export binding: dial position is not set");
    }

    #[test]
    fn test_formula_error_is_transparent() {
        let err = BindingError::from(FormulaError::NoVariables("1+1".into()));
        assert_eq!(
            err.to_string(),
            "Could not find any controls in formula expression: 1+1"
        );
    }

    #[test]
    fn test_line_error_display() {
        let err = BindingError::Line {
            line: 3,
            source: Box::new(BindingError::UnknownDial("COM9".into())),
        };
        assert_eq!(err.to_string(), "Line 3: Unknown dial position: COM9");
    }
}
