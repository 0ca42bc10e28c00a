//! Per-control decoded state with change detection.

use std::fmt;

use crate::control::{ControlDescriptor, ValueKind};
use crate::protocol::StringBuffer;

use super::comparison::Comparison;

/// A decoded control value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// Integer extracted with mask and shift, or a numeric string.
    Integer(u32),
    /// Text from a string control.
    String(String),
}

impl DecodedValue {
    /// Numeric view used by formulas and comparisons.
    ///
    /// Strings that do not parse as numbers have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Integer(n) => Some(f64::from(*n)),
            DecodedValue::String(s) => s.trim().parse().ok(),
        }
    }

    /// Integer view used by comparisons.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            DecodedValue::Integer(n) => Some(*n),
            DecodedValue::String(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Integer(n) => write!(f, "{}", n),
            DecodedValue::String(s) => f.write_str(s),
        }
    }
}

/// The raw input last accepted for a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawData {
    /// A 16-bit data word (integer controls).
    Word(u32),
    /// Assembled or delivered text (string controls).
    Text(String),
}

/// Decode string data according to the string policy.
///
/// - Empty or whitespace-only input decodes to `Integer(0)` when
///   `treat_as_number` is set, otherwise to an empty string.
/// - Input longer than `max_length` characters is truncated, never rejected.
/// - With `treat_as_number`, text that parses as an unsigned integer decodes
///   to `Integer`; anything else stays a string.
pub fn decode_string(raw: &str, max_length: usize, treat_as_number: bool) -> DecodedValue {
    if raw.trim().is_empty() {
        return if treat_as_number {
            DecodedValue::Integer(0)
        } else {
            DecodedValue::String(String::new())
        };
    }

    let truncated: String = raw.chars().take(max_length).collect();

    if treat_as_number {
        if let Ok(n) = truncated.trim().parse::<u32>() {
            return DecodedValue::Integer(n);
        }
    }
    DecodedValue::String(truncated)
}

/// Decoded state for one subscription to a control.
///
/// Raw equality is checked first: an update carrying the same raw data as
/// the previous accepted update changes nothing. The [`Comparison`] is a
/// second filter for consumers that only care about particular values.
#[derive(Debug, Clone)]
pub struct OutputValue {
    descriptor: ControlDescriptor,
    max_length: usize,
    comparison: Comparison,
    treat_string_as_number: bool,
    buffer: Option<StringBuffer>,
    last_raw: Option<RawData>,
    last_value: Option<DecodedValue>,
    criteria_met: bool,
    criteria_entered: bool,
}

impl OutputValue {
    /// Create state for `descriptor` with no data received yet.
    pub fn new(
        descriptor: &ControlDescriptor,
        comparison: Comparison,
        treat_string_as_number: bool,
    ) -> Self {
        let max_length = descriptor.max_length.unwrap_or(0);
        let buffer = descriptor
            .is_string()
            .then(|| StringBuffer::new(descriptor.address, max_length));

        Self {
            descriptor: descriptor.clone(),
            max_length: max_length as usize,
            comparison,
            treat_string_as_number,
            buffer,
            last_raw: None,
            last_value: None,
            criteria_met: false,
            criteria_entered: false,
        }
    }

    /// Apply a data word. Returns `true` if the value changed.
    ///
    /// For string controls the word is staged in the string buffer. The
    /// assembled text goes through [`apply_string`](Self::apply_string) once
    /// every word of the string has been staged, or when
    /// [`commit_staged`](Self::commit_staged) is called at the end of the
    /// frame.
    pub fn apply_word(&mut self, address: u32, data: u32) -> bool {
        match self.descriptor.value_kind {
            ValueKind::Integer => {
                if address != self.descriptor.address
                    || self.last_raw == Some(RawData::Word(data))
                {
                    return false;
                }
                self.last_raw = Some(RawData::Word(data));
                let value = self.descriptor.extract(data);
                self.accept(DecodedValue::Integer(value));
                true
            }
            ValueKind::String => {
                let Some(buffer) = self.buffer.as_mut() else {
                    return false;
                };
                if !buffer.covers(address) {
                    return false;
                }
                buffer.apply(address, data);
                if !buffer.is_complete() {
                    return false;
                }
                self.commit_staged()
            }
        }
    }

    /// Publish staged string words. Returns `true` if the value changed.
    pub fn commit_staged(&mut self) -> bool {
        let text = match self.buffer.as_mut() {
            Some(buffer) if buffer.has_staged() => buffer.commit(),
            _ => return false,
        };
        self.apply_string(&text)
    }

    /// Whether string words are waiting for the end of the frame.
    pub fn has_staged(&self) -> bool {
        self.buffer.as_ref().is_some_and(StringBuffer::has_staged)
    }

    /// Apply pre-assembled string data. Returns `true` if the value changed.
    ///
    /// Integer controls ignore string data.
    pub fn apply_string(&mut self, text: &str) -> bool {
        if self.descriptor.value_kind != ValueKind::String {
            return false;
        }
        if matches!(&self.last_raw, Some(RawData::Text(last)) if last == text) {
            return false;
        }
        self.last_raw = Some(RawData::Text(text.to_string()));
        let value = decode_string(text, self.max_length, self.treat_string_as_number);
        self.accept(value);
        true
    }

    fn accept(&mut self, value: DecodedValue) {
        let was_met = self.criteria_met;
        self.criteria_met = value
            .as_u32()
            .is_some_and(|n| self.comparison.is_satisfied(n));
        self.criteria_entered = self.criteria_met && !was_met;
        self.last_value = Some(value);
    }

    /// Control identifier.
    pub fn control_id(&self) -> &str {
        &self.descriptor.identifier
    }

    /// Base address.
    pub fn address(&self) -> u32 {
        self.descriptor.address
    }

    /// Integer or string.
    pub fn kind(&self) -> ValueKind {
        self.descriptor.value_kind
    }

    /// Comparison attached to this subscription.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Last accepted raw data, `None` before the first update.
    pub fn last_raw(&self) -> Option<&RawData> {
        self.last_raw.as_ref()
    }

    /// Last decoded value, `None` before the first update.
    pub fn last_value(&self) -> Option<&DecodedValue> {
        self.last_value.as_ref()
    }

    /// Whether the last value satisfies the comparison.
    pub fn criteria_met(&self) -> bool {
        self.criteria_met
    }

    /// Whether the last update moved the comparison from unsatisfied to
    /// satisfied, e.g. crossing a threshold.
    pub fn criteria_entered(&self) -> bool {
        self.criteria_entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ComparisonKind;

    fn integer_output() -> OutputValue {
        let descriptor = ControlDescriptor::integer("GEAR_LEVER", 0x1000, 0x0300, 8);
        OutputValue::new(&descriptor, Comparison::changed(), false)
    }

    fn string_output(max_length: u32, treat: bool) -> OutputValue {
        let descriptor = ControlDescriptor::string("UFC_SCRATCH", 0x2000, max_length);
        OutputValue::new(&descriptor, Comparison::changed(), treat)
    }

    #[test]
    fn test_first_word_is_always_a_change() {
        let mut output = integer_output();
        assert!(output.last_value().is_none());
        assert!(output.apply_word(0x1000, 0));
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(0)));
    }

    #[test]
    fn test_identical_word_is_noop() {
        let mut output = integer_output();
        assert!(output.apply_word(0x1000, 0x0200));
        assert!(!output.apply_word(0x1000, 0x0200));
        assert_eq!(output.last_raw(), Some(&RawData::Word(0x0200)));
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(2)));
    }

    #[test]
    fn test_raw_change_outside_mask_is_still_a_change() {
        let mut output = integer_output();
        assert!(output.apply_word(0x1000, 0x0200));
        assert!(output.apply_word(0x1000, 0x0201));
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(2)));
    }

    #[test]
    fn test_word_for_other_address_ignored() {
        let mut output = integer_output();
        assert!(!output.apply_word(0x1002, 0x0200));
        assert!(output.last_value().is_none());
    }

    #[test]
    fn test_string_truncated_to_max_length() {
        let mut output = string_output(4, false);
        assert!(output.apply_string("HELLO"));
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("HELL".to_string()))
        );
    }

    #[test]
    fn test_whitespace_string_treated_as_number_is_zero() {
        let mut output = string_output(4, true);
        assert!(output.apply_string("    "));
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(0)));
    }

    #[test]
    fn test_whitespace_string_without_number_policy_is_empty() {
        let mut output = string_output(4, false);
        assert!(output.apply_string("  "));
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String(String::new()))
        );
    }

    #[test]
    fn test_numeric_string_treated_as_number() {
        let mut output = string_output(3, true);
        output.apply_string("251");
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(251)));

        output.apply_string("AB");
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("AB".to_string()))
        );
    }

    #[test]
    fn test_identical_string_is_noop() {
        let mut output = string_output(4, false);
        assert!(output.apply_string("COMM"));
        assert!(!output.apply_string("COMM"));
    }

    fn word(pair: &[u8; 2]) -> u32 {
        u32::from(u16::from_le_bytes(*pair))
    }

    #[test]
    fn test_string_assembled_from_words() {
        let mut output = string_output(4, false);
        assert!(!output.apply_word(0x2000, word(b"25")));
        assert!(output.has_staged());
        assert!(output.last_value().is_none());

        assert!(output.apply_word(0x2002, word(b"10")));
        assert!(!output.has_staged());
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("2510".to_string()))
        );
    }

    #[test]
    fn test_partial_string_waits_for_commit() {
        let mut output = string_output(4, false);
        output.apply_word(0x2000, word(b"12"));
        output.apply_word(0x2002, word(b"34"));

        assert!(!output.apply_word(0x2000, word(b"56")));
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("1234".to_string()))
        );

        assert!(output.apply_word(0x2002, word(b"78")));
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("5678".to_string()))
        );
    }

    #[test]
    fn test_commit_publishes_partial_update() {
        let mut output = string_output(4, false);
        output.apply_word(0x2000, word(b"25"));
        output.apply_word(0x2002, word(b"15"));

        output.apply_word(0x2002, word(b"00"));
        assert!(output.commit_staged());
        assert_eq!(
            output.last_value(),
            Some(&DecodedValue::String("2500".to_string()))
        );
        assert!(!output.commit_staged());
    }

    #[test]
    fn test_resent_string_is_noop() {
        let mut output = string_output(4, false);
        output.apply_word(0x2000, word(b"25"));
        assert!(output.apply_word(0x2002, word(b"10")));
        output.apply_word(0x2000, word(b"25"));
        assert!(!output.apply_word(0x2002, word(b"10")));
    }

    #[test]
    fn test_oversized_shift_decodes_zero() {
        let descriptor = ControlDescriptor::integer("BROKEN", 0x1000, 0xFFFF, 40);
        let mut output = OutputValue::new(&descriptor, Comparison::changed(), false);
        assert!(output.apply_word(0x1000, 0xFFFF));
        assert_eq!(output.last_value(), Some(&DecodedValue::Integer(0)));
    }

    #[test]
    fn test_criteria_entered_on_threshold_crossing() {
        let descriptor = ControlDescriptor::integer("RPM", 0x3000, 0xFFFF, 0);
        let mut output = OutputValue::new(
            &descriptor,
            Comparison::new(ComparisonKind::GreaterThan, 100),
            false,
        );

        output.apply_word(0x3000, 50);
        assert!(!output.criteria_met());
        assert!(!output.criteria_entered());

        output.apply_word(0x3000, 150);
        assert!(output.criteria_met());
        assert!(output.criteria_entered());

        output.apply_word(0x3000, 160);
        assert!(output.criteria_met());
        assert!(!output.criteria_entered());
    }

    #[test]
    fn test_decoded_value_numeric_views() {
        assert_eq!(DecodedValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(DecodedValue::String(" 12 ".to_string()).as_u32(), Some(12));
        assert_eq!(DecodedValue::String("AB".to_string()).as_f64(), None);
    }
}
