//! UDP receiver for the host's export stream.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::protocol::{ProtocolParser, StreamEvent};

/// Default export port used by the simulation host.
pub const DEFAULT_STREAM_PORT: u16 = 5010;

/// Default multicast group the host publishes to.
pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 50, 10);

/// Largest datagram the receiver accepts.
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Errors from the stream transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to join multicast group {group}: {source}")]
    Multicast {
        group: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("Receive failed: {0}")]
    Receive(#[from] io::Error),
}

/// Receiver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReceiverConfig {
    pub bind_address: Ipv4Addr,
    pub port: u16,
    /// Multicast group to join. `None` receives unicast only.
    pub multicast_group: Option<Ipv4Addr>,
}

impl Default for StreamReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_STREAM_PORT,
            multicast_group: Some(DEFAULT_MULTICAST_GROUP),
        }
    }
}

impl StreamReceiverConfig {
    pub fn with_bind_address(mut self, address: Ipv4Addr) -> Self {
        self.bind_address = address;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_multicast_group(mut self, group: Option<Ipv4Addr>) -> Self {
        self.multicast_group = group;
        self
    }

    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.bind_address, self.port))
    }
}

/// Reads export datagrams and forwards parsed events to the dispatcher.
///
/// The parser state survives across datagrams, so frames split by the
/// network are reassembled.
pub struct UdpStreamReceiver {
    socket: UdpSocket,
    parser: ProtocolParser,
    events: mpsc::Sender<StreamEvent>,
}

impl UdpStreamReceiver {
    /// Bind the socket and join the multicast group if configured.
    pub async fn bind(
        config: &StreamReceiverConfig,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Self, TransportError> {
        let address = config.socket_address();
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|source| TransportError::Bind { address, source })?;

        if let Some(group) = config.multicast_group {
            socket
                .join_multicast_v4(group, config.bind_address)
                .map_err(|source| TransportError::Multicast { group, source })?;
            debug!(group = %group, "Joined multicast group");
        }

        Ok(Self {
            socket,
            parser: ProtocolParser::new(),
            events,
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive until shutdown or until the dispatcher drops its receiver.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), TransportError> {
        info!(address = %self.local_addr()?, "Stream receiver started");

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut datagrams: u64 = 0;

        loop {
            let length = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buffer) => match received {
                    Ok((length, peer)) => {
                        trace!(bytes = length, peer = %peer, "Datagram received");
                        length
                    }
                    Err(e) => {
                        warn!(error = %e, "Datagram receive failed");
                        continue;
                    }
                },
            };
            datagrams += 1;

            let mut events = Vec::new();
            self.parser.feed(&buffer[..length], |event| events.push(event));

            for event in events {
                if self.events.send(event).await.is_err() {
                    info!(datagrams, "Dispatcher closed, stream receiver stopping");
                    return Ok(());
                }
            }
        }

        info!(datagrams, "Stream receiver stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback_config() -> StreamReceiverConfig {
        StreamReceiverConfig::default()
            .with_bind_address(Ipv4Addr::LOCALHOST)
            .with_port(0)
            .with_multicast_group(None)
    }

    #[test]
    fn test_default_config() {
        let config = StreamReceiverConfig::default();
        assert_eq!(config.port, 5010);
        assert_eq!(config.multicast_group, Some(Ipv4Addr::new(239, 255, 50, 10)));
        assert_eq!(config.socket_address().to_string(), "0.0.0.0:5010");
    }

    #[tokio::test]
    async fn test_receives_and_parses_datagrams() {
        let (tx, mut rx) = mpsc::channel(16);
        let receiver = UdpStreamReceiver::bind(&loopback_config(), tx).await.unwrap();
        let target = receiver.local_addr().unwrap();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(receiver.run(shutdown.clone()));

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        // Block split across two datagrams.
        sender
            .send_to(&[0x55, 0x55, 0x55, 0x55, 0xEE, 0x10, 0x02], target)
            .await
            .unwrap();
        sender.send_to(&[0x00, 0x34, 0x12], target).await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event should arrive")
            .unwrap();
        assert_eq!(event, StreamEvent::word(0x10EE, 0x1234));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("receiver should stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stops_when_dispatcher_closes() {
        let (tx, rx) = mpsc::channel(1);
        let receiver = UdpStreamReceiver::bind(&loopback_config(), tx).await.unwrap();
        let target = receiver.local_addr().unwrap();
        drop(rx);

        let handle = tokio::spawn(receiver.run(CancellationToken::new()));

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        sender
            .send_to(&[0x55, 0x55, 0x55, 0x55, 0x00, 0x10, 0x02, 0x00, 0x01, 0x00], target)
            .await
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("receiver should stop once the channel is closed")
            .unwrap();
        assert!(result.is_ok());
    }
}
