//! Reassembly of string controls from packed data words.
//!
//! A string control of `n` characters occupies `ceil(n / 2)` consecutive
//! word addresses. Each word carries two characters, low byte first. Words
//! arrive independently, so the buffer keeps the latest bytes for every
//! position and rebuilds the text on demand.
//!
//! Words received since the last [`commit`](StringBuffer::commit) are
//! staged. A reader only sees text once the whole string has arrived or the
//! host closes the frame, never a mix of old and new words mid-update.

/// Byte buffer backing one string control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBuffer {
    base: u32,
    bytes: Vec<u8>,
    staged: Vec<bool>,
}

impl StringBuffer {
    /// Create an empty buffer for a string at `base` of `max_length` characters.
    pub fn new(base: u32, max_length: u32) -> Self {
        let length = max_length as usize;
        Self {
            base,
            bytes: vec![0; length],
            staged: vec![false; length.div_ceil(2)],
        }
    }

    /// Whether `address` falls inside this string.
    pub fn covers(&self, address: u32) -> bool {
        address >= self.base
            && (address - self.base) % 2 == 0
            && ((address - self.base) as usize) < self.bytes.len()
    }

    /// Store one data word and stage it. Returns `true` if any byte changed.
    pub fn apply(&mut self, address: u32, data: u32) -> bool {
        if !self.covers(address) {
            return false;
        }

        let offset = (address - self.base) as usize;
        self.staged[offset / 2] = true;
        let pair = [(data & 0xFF) as u8, ((data >> 8) & 0xFF) as u8];

        let mut changed = false;
        for (i, byte) in pair.into_iter().enumerate() {
            if let Some(slot) = self.bytes.get_mut(offset + i) {
                if *slot != byte {
                    *slot = byte;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Current text, ending at the first NUL byte.
    ///
    /// Bytes are interpreted as Latin-1, which is what the host's export
    /// tables use for cockpit displays.
    pub fn text(&self) -> String {
        self.bytes
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    /// Whether any word arrived since the last commit.
    pub fn has_staged(&self) -> bool {
        self.staged.iter().any(|&s| s)
    }

    /// Whether every word of the string arrived since the last commit.
    pub fn is_complete(&self) -> bool {
        !self.staged.is_empty() && self.staged.iter().all(|&s| s)
    }

    /// Clear the staged words and return the current text.
    pub fn commit(&mut self) -> String {
        self.staged.fill(false);
        self.text()
    }

    /// Capacity in characters.
    pub fn max_length(&self) -> usize {
        self.bytes.len()
    }
}
