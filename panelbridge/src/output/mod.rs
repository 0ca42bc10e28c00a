//! Decoded control values.
//!
//! An [`OutputValue`] tracks one subscription to a control: the last raw
//! data accepted, the decoded value, and an optional [`Comparison`] that
//! consumers use to react only to particular values or transitions.

mod comparison;
mod value;

pub use comparison::{Comparison, ComparisonKind, UnknownComparison};
pub use value::{decode_string, DecodedValue, OutputValue, RawData};
