//! Events flowing from the stream collaborator into the dispatcher.

/// One update from the simulation host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A data word written at an address.
    Word { address: u32, data: u32 },
    /// A complete string delivered for a string control's base address.
    Text { address: u32, text: String },
    /// The host finished one update frame.
    FrameEnd,
}

impl StreamEvent {
    /// Convenience constructor for a word update.
    pub fn word(address: u32, data: u32) -> Self {
        StreamEvent::Word { address, data }
    }

    /// Convenience constructor for a string update.
    pub fn text(address: u32, text: impl Into<String>) -> Self {
        StreamEvent::Text {
            address,
            text: text.into(),
        }
    }
}
