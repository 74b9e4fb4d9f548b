//! The serialosc discovery loop.
//!
//! [`run_discovery`] opens a socket to serialosc, builds a
//! [`DeviceRegistry`] bound to that socket's local address, and feeds it
//! every `/serialosc/*` message that arrives.  The registry in turn spawns a
//! device task (through its [`DeviceConnector`]) for each device it has an
//! application for.
//!
//! The loop runs until the task is cancelled.  Registry errors (a removal
//! for a device we never saw) are logged and do not stop discovery.

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{
    decode_datagram, open_socket, send_datagram, ChannelSink, SinkCommand, TransportError,
    MAX_DATAGRAM,
};
use crate::application::registry::{AppFactory, DeviceConnector, DeviceRegistry};

/// Where serialosc listens, and where our sockets bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEndpoint {
    pub bind_host: String,
    pub serialosc_host: String,
    pub serialosc_port: u16,
}

/// Runs discovery forever.
///
/// `factories` pairs a device id (or [`gridosc_core::WILDCARD_ID`]) with the
/// factory for its applications.
///
/// # Errors
///
/// Returns a [`TransportError`] if the socket to serialosc cannot be opened.
pub async fn run_discovery<C: DeviceConnector>(
    endpoint: &DiscoveryEndpoint,
    factories: Vec<(String, AppFactory)>,
    connector: C,
) -> Result<(), TransportError> {
    let socket = open_socket(
        &endpoint.bind_host,
        &endpoint.serialosc_host,
        endpoint.serialosc_port,
    )
    .await?;
    let local_addr = socket.local_addr()?;
    info!(
        "listening for serialosc at {}:{} on {local_addr}",
        endpoint.serialosc_host, endpoint.serialosc_port
    );

    let (sink, commands) = ChannelSink::new();
    let mut registry = DeviceRegistry::new(
        local_addr.ip().to_string(),
        local_addr.port(),
        connector,
        Box::new(sink),
    );
    for (id, factory) in factories {
        registry.register(id, factory);
    }
    registry.start();

    drive(&socket, &mut registry, commands).await;
    Ok(())
}

async fn drive<C: DeviceConnector>(
    socket: &UdpSocket,
    registry: &mut DeviceRegistry<C>,
    mut commands: mpsc::UnboundedReceiver<SinkCommand>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(SinkCommand::Send(msg)) => send_datagram(socket, "", &msg).await,
                Some(SinkCommand::Close) | None => break,
            },

            received = socket.recv(&mut buf) => match received {
                Ok(len) => {
                    for msg in decode_datagram("", &buf[..len]) {
                        if let Err(e) = registry.handle(msg) {
                            warn!("serialosc: {e}");
                        }
                    }
                }
                Err(e) => warn!("serialosc recv error: {e}"),
            },
        }
    }

    info!("serialosc discovery stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
