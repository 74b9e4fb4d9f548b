//! One task per device.
//!
//! [`run_device`] opens a socket to the device's port, builds a
//! [`GridConnection`] around the application and runs until the device sends
//! `/sys/disconnect` or the task is aborted.  [`TokioConnector`] is the
//! [`DeviceConnector`] the registry uses to spawn those tasks.

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{
    decode_datagram, open_socket, send_datagram, ChannelSink, SinkCommand, TransportError,
    MAX_DATAGRAM,
};
use crate::application::grid_client::{GridApp, GridClient, GridConnection};
use crate::application::registry::{AppFactory, DeviceConnector, DeviceHandle};

/// Connects to the device listening on `device_host:device_port` and drives
/// `app` until the connection closes.
///
/// # Errors
///
/// Returns a [`TransportError`] if the socket cannot be opened.
pub async fn run_device<A: GridApp>(
    bind_host: &str,
    device_host: &str,
    device_port: u16,
    prefix: &str,
    app: A,
) -> Result<(), TransportError> {
    let socket = open_socket(bind_host, device_host, device_port).await?;
    let local_addr = socket.local_addr()?;
    info!("connected to device at {device_host}:{device_port} from {local_addr}");

    let (sink, commands) = ChannelSink::new();
    let client = GridClient::new(prefix, local_addr, Box::new(sink));
    let mut connection = GridConnection::new(client, app);
    connection.start();

    drive(&socket, &mut connection, commands).await;
    Ok(())
}

/// The receive/send loop.  Queued outbound messages are written before the
/// next datagram is read.
async fn drive<A: GridApp>(
    socket: &UdpSocket,
    connection: &mut GridConnection<A>,
    mut commands: mpsc::UnboundedReceiver<SinkCommand>,
) {
    let prefix = connection.client().prefix().to_string();
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(SinkCommand::Send(msg)) => send_datagram(socket, &prefix, &msg).await,
                Some(SinkCommand::Close) | None => break,
            },

            received = socket.recv(&mut buf) => match received {
                Ok(len) => {
                    for msg in decode_datagram(&prefix, &buf[..len]) {
                        connection.handle(msg);
                    }
                }
                Err(e) => warn!("/{prefix}: recv error: {e}"),
            },
        }
    }

    info!("/{prefix}: connection closed");
}

// ── TokioConnector ────────────────────────────────────────────────────────────

/// Spawns a [`run_device`] task per device.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioConnector {
    bind_host: String,
    device_host: String,
}

impl TokioConnector {
    pub fn new(bind_host: impl Into<String>, device_host: impl Into<String>) -> Self {
        Self {
            bind_host: bind_host.into(),
            device_host: device_host.into(),
        }
    }
}

impl DeviceConnector for TokioConnector {
    fn connect(&mut self, id: &str, port: u16, factory: &AppFactory) -> Box<dyn DeviceHandle> {
        let app = factory.build();
        let prefix = factory.prefix().to_string();
        let bind_host = self.bind_host.clone();
        let device_host = self.device_host.clone();
        let id = id.to_string();

        let task = tokio::spawn(async move {
            if let Err(e) = run_device(&bind_host, &device_host, port, &prefix, app).await {
                warn!("device {id}: {e}");
            }
        });
        Box::new(TaskHandle(task))
    }
}

/// Aborting the task drops the socket, which closes the connection.
struct TaskHandle(JoinHandle<()>);

impl DeviceHandle for TaskHandle {
    fn disconnect(&mut self) {
        self.0.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
