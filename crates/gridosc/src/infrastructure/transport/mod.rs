//! UDP transport: OSC datagrams to and from serialosc and each device.
//!
//! Every connection is a tokio [`UdpSocket`] bound to an ephemeral local
//! port and `connect`ed to one remote port, so it only ever receives from
//! that peer.  serialosc gets one socket; each device gets its own socket
//! and task.
//!
//! # Message flow (for beginners)
//!
//! ```text
//!   socket.recv ──► decode_datagram ──► InboundMessage ──► application
//!                                                              │
//!   socket.send ◄── encode_datagram ◄── SinkCommand ◄── ChannelSink
//! ```
//!
//! The application layer is synchronous.  It hands outbound messages to a
//! [`ChannelSink`], which queues them on an unbounded `mpsc` channel.  The
//! connection's task drains that channel and writes the datagrams, so no
//! handler ever waits on the network.
//!
//! # Sub-modules
//!
//! - **`device`** – One task per device: handshake, LED writes, key events.
//! - **`discovery`** – The serialosc loop driving the device registry.
//! - **`mock`** – A recording [`MessageSink`] for tests.

pub mod device;
pub mod discovery;
pub mod mock;

use gridosc_core::protocol::codec::{decode_message, decode_packet, encode_message, encode_packet};
use gridosc_core::{InboundMessage, OutboundMessage, ProtocolError};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::grid_client::MessageSink;

/// Largest datagram we expect.  A full `/led/map` is well under this.
pub const MAX_DATAGRAM: usize = 4096;

/// Errors that can occur in the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The local UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// The socket could not be connected to the remote port.
    #[error("failed to connect UDP socket to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on an established socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A message could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

// ── ChannelSink ───────────────────────────────────────────────────────────────

/// Work queued for a connection's task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand {
    Send(OutboundMessage),
    Close,
}

/// [`MessageSink`] that queues messages for a connection task.
///
/// Sends after the task has stopped are dropped silently, the same as a
/// datagram to a closed port.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkCommand>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its task reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&mut self, msg: OutboundMessage) {
        let _ = self.tx.send(SinkCommand::Send(msg));
    }

    fn close(&mut self) {
        let _ = self.tx.send(SinkCommand::Close);
    }
}

// ── Datagram helpers ──────────────────────────────────────────────────────────

/// Binds `bind_host:0` and connects the socket to `remote_host:remote_port`.
///
/// # Errors
///
/// Returns [`TransportError::Bind`] or [`TransportError::Connect`].
pub async fn open_socket(
    bind_host: &str,
    remote_host: &str,
    remote_port: u16,
) -> Result<UdpSocket, TransportError> {
    let socket = UdpSocket::bind((bind_host, 0))
        .await
        .map_err(|source| TransportError::Bind {
            addr: format!("{bind_host}:0"),
            source,
        })?;
    socket
        .connect((remote_host, remote_port))
        .await
        .map_err(|source| TransportError::Connect {
            addr: format!("{remote_host}:{remote_port}"),
            source,
        })?;
    Ok(socket)
}

/// Encodes one outbound message into datagram bytes.
///
/// # Errors
///
/// Returns [`TransportError::Protocol`] if `rosc` cannot encode it.
pub fn encode_datagram(prefix: &str, msg: &OutboundMessage) -> Result<Vec<u8>, TransportError> {
    Ok(encode_packet(encode_message(prefix, msg))?)
}

/// Decodes every message in a datagram.
///
/// Undecodable datagrams and messages with unknown addresses or malformed
/// arguments are logged and skipped; the rest of the datagram still counts.
pub fn decode_datagram(prefix: &str, bytes: &[u8]) -> Vec<InboundMessage> {
    let messages = match decode_packet(bytes) {
        Ok(messages) => messages,
        Err(e) => {
            warn!("dropping undecodable datagram ({} bytes): {e}", bytes.len());
            return Vec::new();
        }
    };
    messages
        .iter()
        .filter_map(|msg| match decode_message(prefix, msg) {
            Ok(decoded) => Some(decoded),
            Err(ProtocolError::UnknownAddress(addr)) => {
                debug!("ignoring message for {addr}");
                None
            }
            Err(e) => {
                warn!("dropping malformed message: {e}");
                None
            }
        })
        .collect()
}

/// Encodes and writes one message.  Failures are logged; UDP sends are
/// fire-and-forget.
pub(crate) async fn send_datagram(socket: &UdpSocket, prefix: &str, msg: &OutboundMessage) {
    match encode_datagram(prefix, msg) {
        Ok(bytes) => {
            if let Err(e) = socket.send(&bytes).await {
                warn!("failed to send {msg:?}: {e}");
            }
        }
        Err(e) => warn!("failed to encode {msg:?}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscMessage, OscPacket, OscType};

    fn datagram(addr: &str, args: Vec<OscType>) -> Vec<u8> {
        rosc::encoder::encode(&OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        }))
        .unwrap()
    }

    #[test]
    fn test_channel_sink_queues_in_order() {
        // Arrange
        let (mut sink, mut rx) = ChannelSink::new();

        // Act
        sink.send(OutboundMessage::LedAll(1));
        sink.close();

        // Assert
        assert_eq!(rx.try_recv().unwrap(), SinkCommand::Send(OutboundMessage::LedAll(1)));
        assert_eq!(rx.try_recv().unwrap(), SinkCommand::Close);
    }

    #[test]
    fn test_channel_sink_after_receiver_dropped_does_not_panic() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.send(OutboundMessage::LedAll(0));
        sink.close();
    }

    #[test]
    fn test_decode_datagram_skips_unknown_and_malformed() {
        // Arrange
        let unknown = datagram("/other/thing", vec![]);
        let malformed = datagram("/app/grid/key", vec![OscType::Int(1)]);
        let key = datagram(
            "/app/grid/key",
            vec![OscType::Int(1), OscType::Int(2), OscType::Int(1)],
        );

        // Act / Assert
        assert!(decode_datagram("app", &unknown).is_empty());
        assert!(decode_datagram("app", &malformed).is_empty());
        assert!(decode_datagram("app", &[0xff, 0x00]).is_empty());
        assert_eq!(decode_datagram("app", &key).len(), 1);
    }

    #[test]
    fn test_encode_datagram_uses_prefix() {
        let bytes = encode_datagram("app", &OutboundMessage::LedAll(1)).unwrap();
        let messages = decode_packet(&bytes).unwrap();
        assert_eq!(messages[0].addr, "/app/grid/led/all");
        assert_eq!(messages[0].args, vec![OscType::Int(1)]);
    }
}
