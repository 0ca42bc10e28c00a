//! Comparison predicates applied to decoded values.

use std::fmt;
use std::str::FromStr;

/// How a decoded value is compared against an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonKind {
    /// Value equals the operand.
    Equals,
    /// Value is strictly below the operand.
    LessThan,
    /// Value is strictly above the operand.
    GreaterThan,
    /// Any accepted change satisfies the comparison.
    #[default]
    Changed,
}

impl ComparisonKind {
    /// All kinds in textual-format order.
    pub const ALL: [ComparisonKind; 4] = [
        ComparisonKind::Equals,
        ComparisonKind::LessThan,
        ComparisonKind::GreaterThan,
        ComparisonKind::Changed,
    ];

    /// Token used in binding definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonKind::Equals => "Equals",
            ComparisonKind::LessThan => "LessThan",
            ComparisonKind::GreaterThan => "GreaterThan",
            ComparisonKind::Changed => "Changed",
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognised comparison token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComparison(pub String);

impl fmt::Display for UnknownComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown comparison kind: {}", self.0)
    }
}

impl std::error::Error for UnknownComparison {}

impl FromStr for ComparisonKind {
    type Err = UnknownComparison;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownComparison(s.to_string()))
    }
}

/// A comparison kind together with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Comparison {
    pub kind: ComparisonKind,
    pub operand: u32,
}

impl Comparison {
    /// Create a comparison.
    pub fn new(kind: ComparisonKind, operand: u32) -> Self {
        Self { kind, operand }
    }

    /// Comparison that fires on every change.
    pub fn changed() -> Self {
        Self::new(ComparisonKind::Changed, 0)
    }

    /// Whether `value` satisfies the comparison.
    pub fn is_satisfied(&self, value: u32) -> bool {
        match self.kind {
            ComparisonKind::Equals => value == self.operand,
            ComparisonKind::LessThan => value < self.operand,
            ComparisonKind::GreaterThan => value > self.operand,
            ComparisonKind::Changed => true,
        }
    }

    /// Whether a numeric result satisfies the comparison. Used for formula
    /// results, which need not be integers.
    pub fn is_satisfied_by(&self, value: f64) -> bool {
        let operand = f64::from(self.operand);
        match self.kind {
            ComparisonKind::Equals => value == operand,
            ComparisonKind::LessThan => value < operand,
            ComparisonKind::GreaterThan => value > operand,
            ComparisonKind::Changed => true,
        }
    }
}
