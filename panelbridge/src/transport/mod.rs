//! Network transport for the export stream.

mod udp;

pub use udp::{
    StreamReceiverConfig, TransportError, UdpStreamReceiver, DEFAULT_MULTICAST_GROUP,
    DEFAULT_STREAM_PORT,
};
