//! Immutable metadata describing a single simulation control.

use std::fmt;

/// How a control's raw data is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A bit field inside a 16-bit word, extracted with mask and shift.
    Integer,
    /// A fixed-width character field spread across consecutive words.
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

/// A named simulation control and its decoding rule.
///
/// Descriptors are owned by the [`ControlRegistry`](super::ControlRegistry)
/// and never change after the registry has been built. Several descriptors
/// may share an address when they occupy different bit ranges of the same
/// word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    /// Unique identifier, e.g. `AAP_EGIPWR`.
    pub identifier: String,
    /// Word address in the exported memory map.
    pub address: u32,
    /// Bit mask applied to the raw word (integers only).
    pub mask: u32,
    /// Right shift applied after masking (integers only).
    pub shift: u8,
    /// Integer or string control.
    pub value_kind: ValueKind,
    /// Maximum string length in characters (strings only).
    pub max_length: Option<u32>,
    /// Largest value the control can take (integers only).
    pub max_value: Option<u32>,
    /// Catalog category, e.g. `Radio` or `Engine Panel`.
    pub category: String,
    /// Human readable description.
    pub description: String,
}

impl ControlDescriptor {
    /// Create an integer control.
    pub fn integer(identifier: impl Into<String>, address: u32, mask: u32, shift: u8) -> Self {
        Self {
            identifier: identifier.into(),
            address,
            mask,
            shift,
            value_kind: ValueKind::Integer,
            max_length: None,
            max_value: None,
            category: String::new(),
            description: String::new(),
        }
    }

    /// Create a string control of `max_length` characters.
    pub fn string(identifier: impl Into<String>, address: u32, max_length: u32) -> Self {
        Self {
            identifier: identifier.into(),
            address,
            mask: 0xFFFF,
            shift: 0,
            value_kind: ValueKind::String,
            max_length: Some(max_length),
            max_value: None,
            category: String::new(),
            description: String::new(),
        }
    }

    /// Set the catalog category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the maximum integer value.
    pub fn with_max_value(mut self, max_value: u32) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Extract this control's value from a raw data word.
    ///
    /// A shift wider than the word yields 0.
    pub fn extract(&self, data: u32) -> u32 {
        (data & self.mask)
            .checked_shr(u32::from(self.shift))
            .unwrap_or(0)
    }

    /// Whether this is a string control.
    pub fn is_string(&self) -> bool {
        self.value_kind == ValueKind::String
    }

    /// Every word address a string control occupies.
    ///
    /// Two characters are packed per 16-bit word, so a string of `n`
    /// characters spans `ceil(n / 2)` consecutive word addresses. Integer
    /// controls occupy only their own address.
    pub fn word_addresses(&self) -> Vec<u32> {
        match (self.value_kind, self.max_length) {
            (ValueKind::String, Some(len)) if len > 0 => {
                let words = len.div_ceil(2);
                (0..words).map(|i| self.address + i * 2).collect()
            }
            _ => vec![self.address],
        }
    }
}

impl fmt::Display for ControlDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ 0x{:04X} ({})",
            self.identifier, self.address, self.value_kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_applies_mask_then_shift() {
        let control = ControlDescriptor::integer("MASTER_ARM", 0x7408, 0x0300, 8);
        assert_eq!(control.extract(0x0200), 2);
        assert_eq!(control.extract(0xFCFF), 0);
        assert_eq!(control.extract(0xFFFF), 3);
    }

    #[test]
    fn test_extract_with_oversized_shift_is_zero() {
        let control = ControlDescriptor::integer("BROKEN", 0x7408, 0xFFFF, 40);
        assert_eq!(control.extract(0xFFFF), 0);
    }

    #[test]
    fn test_integer_spans_single_address() {
        let control = ControlDescriptor::integer("AAP_EGIPWR", 0x10EE, 0x0001, 0);
        assert_eq!(control.word_addresses(), vec![0x10EE]);
    }

    #[test]
    fn test_string_spans_packed_words() {
        let odd = ControlDescriptor::string("UFC_SCRATCH", 0x1000, 5);
        assert_eq!(odd.word_addresses(), vec![0x1000, 0x1002, 0x1004]);

        let even = ControlDescriptor::string("UFC_COMM1", 0x2000, 4);
        assert_eq!(even.word_addresses(), vec![0x2000, 0x2002]);
    }

    #[test]
    fn test_display() {
        let control = ControlDescriptor::string("UFC_COMM1", 0x2000, 4);
        assert_eq!(control.to_string(), "UFC_COMM1 @ 0x2000 (string)");
    }
}
