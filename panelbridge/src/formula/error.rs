//! Formula error types.

use thiserror::Error;

/// Errors raised while constructing, importing or evaluating a formula.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// The expression references no known control.
    #[error("Could not find any controls in formula expression: {0}")]
    NoVariables(String),

    /// The expression text is not well formed.
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// An identifier is neither a control, a constant nor a function.
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// A call names a function the engine does not provide.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("Function {function} expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },

    /// Division or modulo by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// The result is not a finite number (e.g. square root of a negative).
    #[error("Domain error: {0}")]
    Domain(String),

    /// The textual form is not a `Formula{...}` envelope.
    #[error("Cannot import formula: {0}")]
    Import(String),
}

impl FormulaError {
    /// Whether this error can only arise when evaluating, as opposed to
    /// constructing, a formula.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, FormulaError::DivisionByZero | FormulaError::Domain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FormulaError::Syntax {
            position: 4,
            message: "expected ')'".to_string(),
        };
        assert_eq!(err.to_string(), "Syntax error at position 4: expected ')'");

        let err = FormulaError::Arity {
            function: "min",
            expected: "2",
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Function min expects 2 argument(s), got 1"
        );
    }

    #[test]
    fn test_is_evaluation_error() {
        assert!(FormulaError::DivisionByZero.is_evaluation_error());
        assert!(!FormulaError::UnknownIdentifier("X".into()).is_evaluation_error());
    }
}
