//! Export stream protocol.
//!
//! The simulation host streams its cockpit memory map as framed blocks of
//! 16-bit words. [`ProtocolParser`] turns those bytes into [`StreamEvent`]s;
//! [`StringBuffer`] reassembles string controls that span several words.
//!
//! # Example
//!
//! ```
//! use panelbridge::protocol::{ProtocolParser, StreamEvent};
//!
//! let mut parser = ProtocolParser::new();
//! let bytes = [0x55, 0x55, 0x55, 0x55, 0xEE, 0x10, 0x02, 0x00, 0x01, 0x00];
//! assert_eq!(parser.parse(&bytes), vec![StreamEvent::word(0x10EE, 1)]);
//! ```

mod event;
mod parser;
mod string_buffer;

pub use event::StreamEvent;
pub use parser::{ProtocolParser, FRAME_END_ADDRESS};
pub use string_buffer::StringBuffer;
