//! Byte-level parser for the host's export stream.
//!
//! # Wire Format
//!
//! ```text
//! 55 55 55 55                 frame sync
//! [addr:u16le][count:u16le]   block header
//! [count bytes]               little-endian words at addr, addr+2, ...
//! ... more blocks ...
//! ```
//!
//! Four consecutive `0x55` bytes reset the parser to a block header at any
//! point, so a corrupted or truncated datagram resynchronises at the next
//! frame. A block at address `0xFFFE` carries the frame counter and marks the
//! end of an update.

use super::event::StreamEvent;

/// Address of the end-of-update marker.
pub const FRAME_END_ADDRESS: u32 = 0xFFFE;

const SYNC_BYTE: u8 = 0x55;
const SYNC_LENGTH: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitForSync,
    AddressLow,
    AddressHigh,
    CountLow,
    CountHigh,
    DataLow,
    DataHigh,
}

/// Incremental parser turning export bytes into [`StreamEvent`]s.
///
/// The parser keeps its state between calls to [`feed`](Self::feed), so
/// blocks may be split across datagrams.
#[derive(Debug)]
pub struct ProtocolParser {
    state: State,
    sync_count: u8,
    address: u32,
    count: u16,
    data: u32,
}

impl Default for ProtocolParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolParser {
    /// Create a parser waiting for the first frame sync.
    pub fn new() -> Self {
        Self {
            state: State::WaitForSync,
            sync_count: 0,
            address: 0,
            count: 0,
            data: 0,
        }
    }

    /// Parse `bytes`, calling `emit` for every complete event.
    pub fn feed(&mut self, bytes: &[u8], mut emit: impl FnMut(StreamEvent)) {
        for &byte in bytes {
            self.step(byte, &mut emit);
        }
    }

    /// Parse `bytes` and collect the events.
    pub fn parse(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.feed(bytes, |event| events.push(event));
        events
    }

    fn step(&mut self, byte: u8, emit: &mut impl FnMut(StreamEvent)) {
        match self.state {
            State::WaitForSync => {}
            State::AddressLow => {
                self.address = u32::from(byte);
                self.state = State::AddressHigh;
            }
            State::AddressHigh => {
                self.address |= u32::from(byte) << 8;
                self.state = if self.address == 0x5555 {
                    State::WaitForSync
                } else {
                    State::CountLow
                };
            }
            State::CountLow => {
                self.count = u16::from(byte);
                self.state = State::CountHigh;
            }
            State::CountHigh => {
                self.count |= u16::from(byte) << 8;
                self.state = if self.count == 0 {
                    State::AddressLow
                } else {
                    State::DataLow
                };
            }
            State::DataLow => {
                self.data = u32::from(byte);
                self.count = self.count.saturating_sub(1);
                self.state = State::DataHigh;
            }
            State::DataHigh => {
                self.data |= u32::from(byte) << 8;
                self.count = self.count.saturating_sub(1);

                if self.address == FRAME_END_ADDRESS {
                    emit(StreamEvent::FrameEnd);
                } else {
                    emit(StreamEvent::Word {
                        address: self.address,
                        data: self.data,
                    });
                }

                self.address += 2;
                self.state = if self.count == 0 {
                    State::AddressLow
                } else {
                    State::DataLow
                };
            }
        }

        if byte == SYNC_BYTE {
            self.sync_count += 1;
        } else {
            self.sync_count = 0;
        }

        if self.sync_count == SYNC_LENGTH {
            self.state = State::AddressLow;
            self.sync_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNC: [u8; 4] = [0x55; 4];

    fn block(address: u16, words: &[u16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&address.to_le_bytes());
        bytes.extend_from_slice(&((words.len() * 2) as u16).to_le_bytes());
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_bytes_before_sync_are_ignored() {
        let mut parser = ProtocolParser::new();
        assert!(parser.parse(&block(0x1000, &[1])).is_empty());
    }

    #[test]
    fn test_single_block() {
        let mut parser = ProtocolParser::new();
        let mut bytes = SYNC.to_vec();
        bytes.extend(block(0x10EE, &[0x0001]));

        assert_eq!(
            parser.parse(&bytes),
            vec![StreamEvent::Word {
                address: 0x10EE,
                data: 0x0001
            }]
        );
    }

    #[test]
    fn test_multi_word_block_advances_address() {
        let mut parser = ProtocolParser::new();
        let mut bytes = SYNC.to_vec();
        bytes.extend(block(0x2000, &[0x3231, 0x3433]));

        assert_eq!(
            parser.parse(&bytes),
            vec![
                StreamEvent::Word {
                    address: 0x2000,
                    data: 0x3231
                },
                StreamEvent::Word {
                    address: 0x2002,
                    data: 0x3433
                },
            ]
        );
    }

    #[test]
    fn test_frame_end_marker() {
        let mut parser = ProtocolParser::new();
        let mut bytes = SYNC.to_vec();
        bytes.extend(block(0x1000, &[7]));
        bytes.extend(block(0xFFFE, &[42]));

        let events = parser.parse(&bytes);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], StreamEvent::FrameEnd);
    }

    #[test]
    fn test_block_split_across_feeds() {
        let mut parser = ProtocolParser::new();
        let mut bytes = SYNC.to_vec();
        bytes.extend(block(0x1000, &[0xABCD]));
        let (first, second) = bytes.split_at(7);

        assert!(parser.parse(first).is_empty());
        assert_eq!(
            parser.parse(second),
            vec![StreamEvent::Word {
                address: 0x1000,
                data: 0xABCD
            }]
        );
    }

    #[test]
    fn test_sync_resets_mid_block() {
        let mut parser = ProtocolParser::new();
        let mut bytes = SYNC.to_vec();
        // Header promises four bytes, only one arrives before the next sync.
        bytes.extend_from_slice(&[0x00, 0x10, 0x04, 0x00, 0x01]);
        bytes.extend_from_slice(&SYNC);
        bytes.extend(block(0x3000, &[5]));

        let events = parser.parse(&bytes);
        assert_eq!(
            events.last(),
            Some(&StreamEvent::Word {
                address: 0x3000,
                data: 5
            })
        );
    }
}
