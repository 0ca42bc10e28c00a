//! Value converters: map a numeric value to a display label.
//!
//! A binding may carry an ordered list of converters. When it does, the
//! display shows the label of the first converter whose comparison the value
//! satisfies, or nothing if none does. Formula bindings compare the formula
//! result; output bindings compare the control value, with string controls
//! read as numbers.
//!
//! Textual form, appended to the binding line:
//!
//! ```text
//! Converters{Equals|0|OFF;GreaterThan|0|ON}
//! ```

use std::fmt;

use super::error::BindingError;
use super::state::BindingValue;
use crate::output::{Comparison, ComparisonKind};

/// Prefix of the converter segment.
pub const CONVERTERS_PREFIX: &str = "Converters{";
const CONVERTERS_SUFFIX: &str = "}";

/// Characters that would break the textual form.
const RESERVED: [char; 5] = ['{', '}', '|', ';', '\\'];

/// One comparison and the label shown when it is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    comparison: Comparison,
    label: String,
}

impl Converter {
    /// Create a converter. Labels must be non-blank single-line text without
    /// `{ } | ; \`.
    pub fn new(comparison: Comparison, label: impl Into<String>) -> Result<Self, BindingError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(BindingError::InvalidConverter("empty label".to_string()));
        }
        if label.chars().any(|c| c.is_control() || RESERVED.contains(&c)) {
            return Err(BindingError::InvalidConverter(format!(
                "label '{}' contains a reserved character",
                label.escape_debug()
            )));
        }
        Ok(Self { comparison, label })
    }

    /// Comparison that selects this converter.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Text shown when selected.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `value` selects this converter.
    pub fn criteria_fulfilled(&self, value: f64) -> bool {
        self.comparison.is_satisfied_by(value)
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.comparison.kind, self.comparison.operand, self.label
        )
    }
}

/// Ordered converters of one binding. Empty means the raw value is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterList {
    converters: Vec<Converter>,
}

impl ConverterList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a converter. Earlier converters take precedence.
    pub fn add(&mut self, converter: Converter) {
        self.converters.push(converter);
    }

    /// Remove the converter at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Converter> {
        (index < self.converters.len()).then(|| self.converters.remove(index))
    }

    /// Swap the converter at `index` for `converter`, returning the old one.
    pub fn replace(&mut self, index: usize, converter: Converter) -> Option<Converter> {
        self.converters
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, converter))
    }

    pub fn clear(&mut self) {
        self.converters.clear();
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Converter> {
        self.converters.iter()
    }

    /// First converter whose criteria `value` fulfils.
    pub fn select(&self, value: f64) -> Option<&Converter> {
        self.converters.iter().find(|c| c.criteria_fulfilled(value))
    }

    /// Map a published value to what the display shows.
    ///
    /// With no converters the value passes through. Otherwise the selected
    /// label is shown, or blank text when no converter matches or the value
    /// is not numeric. A formula that never evaluated keeps its error value.
    pub fn convert(&self, value: &BindingValue) -> BindingValue {
        if self.is_empty() {
            return value.clone();
        }
        let numeric = match value {
            BindingValue::Integer(n) => Some(*n as f64),
            BindingValue::Text(text) => text.trim().parse::<f64>().ok(),
            BindingValue::EvaluationFailed => return BindingValue::EvaluationFailed,
        };
        let label = numeric
            .and_then(|n| self.select(n))
            .map(|c| c.label.clone())
            .unwrap_or_default();
        BindingValue::Text(label)
    }

    /// Configuration check: every converter must be reachable.
    ///
    /// A `Changed` converter matches every value, so anything after it is
    /// dead configuration.
    pub fn check(&self) -> Result<(), BindingError> {
        if let Some(index) = self
            .converters
            .iter()
            .position(|c| c.comparison.kind == ComparisonKind::Changed)
        {
            if index + 1 < self.converters.len() {
                return Err(BindingError::UnreachableConverter { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Parse the `Converters{...}` segment.
    pub fn import(text: &str) -> Result<Self, BindingError> {
        let body = text
            .strip_prefix(CONVERTERS_PREFIX)
            .and_then(|rest| rest.strip_suffix(CONVERTERS_SUFFIX))
            .ok_or_else(|| BindingError::InvalidConverter(text.to_string()))?;

        let mut list = Self::new();
        for entry in body.split(';') {
            let mut parts = entry.splitn(3, '|');
            let (Some(kind), Some(operand), Some(label)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(BindingError::InvalidConverter(entry.to_string()));
            };
            let kind: ComparisonKind = kind
                .parse()
                .map_err(|_| BindingError::UnknownComparison(kind.to_string()))?;
            let operand: u32 = operand
                .parse()
                .map_err(|_| BindingError::InvalidOperand(operand.to_string()))?;
            list.add(Converter::new(Comparison::new(kind, operand), label)?);
        }
        Ok(list)
    }
}

impl fmt::Display for ConverterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(CONVERTERS_PREFIX)?;
        for (i, converter) in self.converters.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            converter.fmt(f)?;
        }
        f.write_str(CONVERTERS_SUFFIX)
    }
}
