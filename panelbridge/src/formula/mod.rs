//! Arithmetic formulas over control values.
//!
//! A [`Formula`] is a user-authored expression such as
//! `360 - floor((HSI_HDG / 65535) * 360)` whose free variables are control
//! identifiers. Variables are found once, at construction, by scanning the
//! registry for every identifier that occurs in the text; the expression is
//! parsed at the same time and never re-parsed.
//!
//! [`FormulaState`] holds the live side: current variable values, the last
//! successful result and the last error. A failed evaluation keeps the
//! previous result visible.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use panelbridge::control::{ControlDescriptor, ControlRegistry};
//! use panelbridge::formula::{truncate_result, Formula};
//!
//! let registry = ControlRegistry::from_descriptors(vec![
//!     ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
//! ])
//! .unwrap();
//!
//! let formula = Formula::new("(AAP_EGIPWR+1)/2", &registry).unwrap();
//! assert_eq!(formula.variables(), ["AAP_EGIPWR"]);
//!
//! let values = HashMap::from([("AAP_EGIPWR".to_string(), 4.0)]);
//! let result = formula.evaluate(&values).unwrap();
//! assert_eq!(result, 2.5);
//! assert_eq!(truncate_result(result), 2);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::control::ControlRegistry;

use ast::Expr;

pub use error::FormulaError;

/// Prefix of a formula's textual form.
pub const FORMULA_PREFIX: &str = "Formula{";

/// Suffix of a formula's textual form.
pub const FORMULA_SUFFIX: &str = "}";

/// Value shown at the presentation boundary when a formula has never
/// evaluated successfully.
pub const FORMULA_ERROR_SENTINEL: i64 = 99;

/// Convert a formula result to the integer shown on a display.
///
/// Truncates toward zero: `2.5 → 2`, `-2.5 → -2`. Values outside the `i64`
/// range saturate.
pub fn truncate_result(result: f64) -> i64 {
    result.trunc() as i64
}

/// A parsed formula. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Formula {
    expression: String,
    variables: Vec<String>,
    ast: Arc<Expr>,
}

impl Formula {
    /// Parse `expression` and resolve its variables against `registry`.
    ///
    /// Fails with [`FormulaError::NoVariables`] if no registry identifier
    /// occurs in the text, and with a syntax or identifier error if the
    /// expression cannot be parsed.
    pub fn new(expression: impl Into<String>, registry: &ControlRegistry) -> Result<Self, FormulaError> {
        let expression = expression.into();

        let variables: Vec<String> = registry
            .all_controls()
            .filter(|control| expression.contains(control.identifier.as_str()))
            .map(|control| control.identifier.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if variables.is_empty() {
            return Err(FormulaError::NoVariables(expression));
        }

        let names: HashSet<&str> = variables.iter().map(String::as_str).collect();
        let ast = parser::parse(&expression, &names)?;

        Ok(Self {
            expression,
            variables,
            ast: Arc::new(ast),
        })
    }

    /// Import the textual form `Formula{<expression>}`.
    ///
    /// The envelope must match exactly; the body must be non-empty and must
    /// not contain braces.
    pub fn import(text: &str, registry: &ControlRegistry) -> Result<Self, FormulaError> {
        let body = text
            .strip_prefix(FORMULA_PREFIX)
            .and_then(|rest| rest.strip_suffix(FORMULA_SUFFIX))
            .ok_or_else(|| FormulaError::Import(text.to_string()))?;

        if body.trim().is_empty() || body.contains(['{', '}']) {
            return Err(FormulaError::Import(text.to_string()));
        }

        Self::new(body, registry)
    }

    /// The expression text.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Control identifiers referenced by the expression, sorted.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluate with the given variable values.
    ///
    /// Variables missing from `values` evaluate as 0.
    pub fn evaluate(&self, values: &HashMap<String, f64>) -> Result<f64, FormulaError> {
        let result = self
            .ast
            .eval(&|name: &str| values.get(name).copied().unwrap_or(0.0))?;

        if !result.is_finite() {
            return Err(FormulaError::Domain(format!(
                "result is not a finite number: {}",
                result
            )));
        }
        Ok(result)
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression && self.variables == other.variables
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", FORMULA_PREFIX, self.expression, FORMULA_SUFFIX)
    }
}

/// Live evaluation state for one formula.
#[derive(Debug, Clone)]
pub struct FormulaState {
    formula: Formula,
    values: HashMap<String, f64>,
    last_result: Option<f64>,
    last_error: Option<FormulaError>,
}

impl FormulaState {
    /// Create state with every variable at 0.
    pub fn new(formula: Formula) -> Self {
        let values = formula
            .variables()
            .iter()
            .map(|name| (name.clone(), 0.0))
            .collect();
        Self {
            formula,
            values,
            last_result: None,
            last_error: None,
        }
    }

    /// Update one variable's value. Unknown names are ignored.
    pub fn set_variable(&mut self, name: &str, value: f64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
    }

    /// Evaluate with the current variable values.
    ///
    /// On success the result becomes the last result and the last error is
    /// cleared. On failure the error is retained and the last result is left
    /// untouched.
    pub fn evaluate(&mut self) -> Result<f64, FormulaError> {
        match self.formula.evaluate(&self.values) {
            Ok(result) => {
                self.last_result = Some(result);
                self.last_error = None;
                Ok(result)
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// The formula.
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Current value of a variable.
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Last successful result.
    pub fn last_result(&self) -> Option<f64> {
        self.last_result
    }

    /// Error from the most recent evaluation, if it failed.
    pub fn last_error(&self) -> Option<&FormulaError> {
        self.last_error.as_ref()
    }

    /// Whether the most recent evaluation failed.
    pub fn has_errors(&self) -> bool {
        self.last_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlDescriptor;

    fn registry() -> ControlRegistry {
        ControlRegistry::from_descriptors(vec![
            ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0),
            ControlDescriptor::integer("HSI_HDG", 0x1040, 0xFFFF, 0),
            ControlDescriptor::integer("ALT", 0x1050, 0xFFFF, 0),
            ControlDescriptor::integer("ALT_MSL_FT", 0x1052, 0xFFFF, 0),
        ])
        .unwrap()
    }

    #[test]
    fn test_variable_extraction() {
        let formula = Formula::new("(AAP_EGIPWR+1)/2", &registry()).unwrap();
        assert_eq!(formula.variables(), ["AAP_EGIPWR"]);
    }

    #[test]
    fn test_no_known_identifier_fails() {
        assert_eq!(
            Formula::new("(FOO+1)/2", &registry()).unwrap_err(),
            FormulaError::NoVariables("(FOO+1)/2".to_string())
        );
    }

    #[test]
    fn test_constant_expression_fails() {
        assert!(matches!(
            Formula::new("1 + 2", &registry()),
            Err(FormulaError::NoVariables(_))
        ));
    }

    #[test]
    fn test_substring_match_records_prefix_identifiers() {
        let formula = Formula::new("ALT_MSL_FT / 100", &registry()).unwrap();
        assert_eq!(formula.variables(), ["ALT", "ALT_MSL_FT"]);
    }

    #[test]
    fn test_unknown_identifier_alongside_known_fails() {
        assert_eq!(
            Formula::new("AAP_EGIPWR + BOGUS", &registry()).unwrap_err(),
            FormulaError::UnknownIdentifier("BOGUS".to_string())
        );
    }

    #[test]
    fn test_syntax_error_fails_construction() {
        assert!(matches!(
            Formula::new("(AAP_EGIPWR+1", &registry()),
            Err(FormulaError::Syntax { .. })
        ));
    }

    #[test]
    fn test_multiline_expression_fails_construction() {
        assert!(matches!(
            Formula::new("HSI_HDG\n+ 1", &registry()),
            Err(FormulaError::Syntax { position: 7, .. })
        ));
        let formula = Formula::new("HSI_HDG\t+ 1", &registry()).unwrap();
        assert_eq!(
            Formula::import(&formula.to_string(), &registry()).unwrap(),
            formula
        );
    }

    #[test]
    fn test_evaluate_and_truncate() {
        let formula = Formula::new("(AAP_EGIPWR+1)/2", &registry()).unwrap();
        let values = HashMap::from([("AAP_EGIPWR".to_string(), 4.0)]);
        let result = formula.evaluate(&values).unwrap();
        assert_eq!(result, 2.5);
        assert_eq!(truncate_result(result), 2);
    }

    #[test]
    fn test_truncation_is_toward_zero() {
        assert_eq!(truncate_result(2.5), 2);
        assert_eq!(truncate_result(2.99), 2);
        assert_eq!(truncate_result(-2.5), -2);
        assert_ne!(truncate_result(2.5), 2.5_f64.round() as i64);
    }

    #[test]
    fn test_missing_variables_default_to_zero() {
        let formula = Formula::new("(AAP_EGIPWR+1)/2", &registry()).unwrap();
        assert_eq!(formula.evaluate(&HashMap::new()).unwrap(), 0.5);
    }

    #[test]
    fn test_canonical_form() {
        let formula = Formula::new("(AAP_EGIPWR+1)/2", &registry()).unwrap();
        assert_eq!(formula.to_string(), "Formula{(AAP_EGIPWR+1)/2}");
    }

    #[test]
    fn test_import_round_trip() {
        let formula = Formula::new("360 - floor((HSI_HDG / 65535) * 360)", &registry()).unwrap();
        let imported = Formula::import(&formula.to_string(), &registry()).unwrap();
        assert_eq!(imported, formula);
    }

    #[test]
    fn test_import_rejects_bad_envelopes() {
        let registry = registry();
        for text in [
            "",
            "(AAP_EGIPWR+1)/2",
            "Formula(AAP_EGIPWR+1)/2",
            "Formula{(AAP_EGIPWR+1)/2",
            "formula{(AAP_EGIPWR+1)/2}",
            " Formula{(AAP_EGIPWR+1)/2}",
            "Formula{}",
            "Formula{AAP_EGIPWR}}",
        ] {
            assert!(
                matches!(Formula::import(text, &registry), Err(FormulaError::Import(_))),
                "should reject {:?}",
                text
            );
        }
    }

    #[test]
    fn test_state_preserves_last_result_on_error() {
        let formula = Formula::new("100 / AAP_EGIPWR", &registry()).unwrap();
        let mut state = FormulaState::new(formula);

        state.set_variable("AAP_EGIPWR", 4.0);
        assert_eq!(state.evaluate().unwrap(), 25.0);
        assert!(!state.has_errors());

        state.set_variable("AAP_EGIPWR", 0.0);
        assert_eq!(state.evaluate().unwrap_err(), FormulaError::DivisionByZero);
        assert_eq!(state.last_result(), Some(25.0));
        assert_eq!(state.last_error(), Some(&FormulaError::DivisionByZero));

        state.set_variable("AAP_EGIPWR", 5.0);
        assert_eq!(state.evaluate().unwrap(), 20.0);
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_state_ignores_unknown_variables() {
        let formula = Formula::new("AAP_EGIPWR * 2", &registry()).unwrap();
        let mut state = FormulaState::new(formula);
        state.set_variable("HSI_HDG", 9.0);
        assert_eq!(state.variable("HSI_HDG"), None);
        assert_eq!(state.variable("AAP_EGIPWR"), Some(0.0));
    }

    mod truncation {
        use super::super::truncate_result;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_truncates_toward_zero(value in -1.0e9f64..1.0e9) {
                let truncated = truncate_result(value);
                prop_assert!((truncated as f64).abs() <= value.abs());
                prop_assert!((value - truncated as f64).abs() < 1.0);
                prop_assert_eq!(truncate_result(-value), -truncated);
            }
        }
    }
}
