//! DeviceRegistry: which devices are attached, and who drives each one.
//!
//! The registry talks to the serialosc discovery service.  serialosc
//! answers a `/serialosc/list` with one `/serialosc/device` per attached
//! device, and after a `/serialosc/notify` it sends a single
//! `/serialosc/add` or `/serialosc/remove` for the next change.  The
//! subscription is one-shot, so the registry re-sends `/serialosc/notify`
//! after every add or remove it handles.
//!
//! # Routing (for beginners)
//!
//! Applications are registered per device id through an [`AppFactory`]:
//!
//! ```text
//!   "m1000123" ──► factory A      exact id wins
//!   "*"        ──► factory B      used for every other device
//! ```
//!
//! When a device appears, the matching factory builds a fresh application
//! and the [`DeviceConnector`] opens a connection to the device's port.
//! The registry keeps the returned [`DeviceHandle`] so the connection can be
//! torn down when the device is removed.
//!
//! Factories outlive their devices: unplugging a device and plugging it
//! back in starts a new application from the same factory.

use std::collections::HashMap;
use std::fmt;

use gridosc_core::{DeviceAnnouncement, InboundMessage, OutboundMessage, WILDCARD_ID};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::grid_client::{GridApp, MessageSink};

/// Error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A removal named a device id that was never announced.
    #[error("device '{0}' is not known")]
    UnknownDevice(String),
    /// A removal named a known device with no running application.
    #[error("device '{0}' has no running application")]
    NoInstance(String),
}

// ── Factories and connections ─────────────────────────────────────────────────

type BuildFn = dyn Fn() -> Box<dyn GridApp + Send> + Send + Sync;

/// Builds a fresh application for each device connection.
pub struct AppFactory {
    prefix: String,
    build: Box<BuildFn>,
}

impl AppFactory {
    /// `prefix` is the OSC prefix the device is told to use.
    pub fn new<F>(prefix: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> Box<dyn GridApp + Send> + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.into(),
            build: Box::new(build),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn build(&self) -> Box<dyn GridApp + Send> {
        (self.build)()
    }
}

impl fmt::Debug for AppFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppFactory")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// A running device connection.
pub trait DeviceHandle: Send {
    /// Closes the connection immediately.
    fn disconnect(&mut self);
}

/// Opens device connections.
///
/// The production connector binds a UDP socket and spawns a task per device;
/// tests substitute a recorder.  Connecting never blocks the caller: any
/// setup failure is reported by the connection itself.
pub trait DeviceConnector {
    fn connect(&mut self, id: &str, port: u16, factory: &AppFactory) -> Box<dyn DeviceHandle>;
}

// ── DeviceRegistry ────────────────────────────────────────────────────────────

/// Tracks attached devices and starts an application for each.
pub struct DeviceRegistry<C> {
    devices: HashMap<String, u16>,
    factories: HashMap<String, AppFactory>,
    instances: HashMap<String, Box<dyn DeviceHandle>>,
    connector: C,
    sink: Box<dyn MessageSink + Send>,
    host: String,
    port: u16,
}

impl<C: DeviceConnector> DeviceRegistry<C> {
    /// Creates an empty registry.
    ///
    /// `host` and `port` are our own address, which serialosc replies to.
    /// `sink` carries messages to serialosc.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        connector: C,
        sink: Box<dyn MessageSink + Send>,
    ) -> Self {
        Self {
            devices: HashMap::new(),
            factories: HashMap::new(),
            instances: HashMap::new(),
            connector,
            sink,
            host: host.into(),
            port,
        }
    }

    /// Routes devices with `id` to `factory`.  Use [`WILDCARD_ID`] to match
    /// any device without its own factory.  Replaces an earlier factory for
    /// the same id.
    pub fn register(&mut self, id: impl Into<String>, factory: AppFactory) {
        let id = id.into();
        debug!("factory for '{id}' uses prefix /{}", factory.prefix());
        self.factories.insert(id, factory);
    }

    /// Asks serialosc for the attached devices and subscribes to changes.
    pub fn start(&mut self) {
        self.sink.send(OutboundMessage::SerialoscList {
            host: self.host.clone(),
            port: self.port,
        });
        self.notify();
    }

    /// Handles one message from serialosc.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when a removal cannot be matched.  The
    /// notify subscription is renewed regardless.
    pub fn handle(&mut self, msg: InboundMessage) -> Result<(), RegistryError> {
        match msg {
            InboundMessage::DiscoDevice(device) => {
                self.device_added(device);
                Ok(())
            }
            InboundMessage::DiscoAdd(device) => {
                self.device_added(device);
                self.notify();
                Ok(())
            }
            InboundMessage::DiscoRemove(device) => {
                let result = self.device_removed(&device.id);
                self.notify();
                result
            }
            other => {
                warn!("unexpected message from serialosc: {other:?}");
                Ok(())
            }
        }
    }

    /// The port of device `id`, if attached.
    pub fn device_port(&self, id: &str) -> Option<u16> {
        self.devices.get(id).copied()
    }

    /// Ids of attached devices, sorted.
    pub fn device_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn has_instance(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn device_added(&mut self, device: DeviceAnnouncement) {
        if self.devices.contains_key(&device.id) {
            debug!("device {} already known", device.id);
            return;
        }
        info!(
            "device {} ({}) attached on port {}",
            device.id, device.kind, device.port
        );
        self.devices.insert(device.id.clone(), device.port);

        let Some(factory) = factory_for(&self.factories, &device.id) else {
            debug!("no application registered for device {}", device.id);
            return;
        };
        let handle = self.connector.connect(&device.id, device.port, factory);
        self.instances.insert(device.id, handle);
    }

    fn device_removed(&mut self, id: &str) -> Result<(), RegistryError> {
        self.devices
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownDevice(id.to_string()))?;
        let mut handle = self
            .instances
            .remove(id)
            .ok_or_else(|| RegistryError::NoInstance(id.to_string()))?;
        handle.disconnect();
        info!("device {id} removed");
        Ok(())
    }

    fn notify(&mut self) {
        self.sink.send(OutboundMessage::SerialoscNotify {
            host: self.host.clone(),
            port: self.port,
        });
    }
}

/// The factory responsible for `id`: exact match first, then wildcard.
fn factory_for<'a>(factories: &'a HashMap<String, AppFactory>, id: &str) -> Option<&'a AppFactory> {
    factories.get(id).or_else(|| factories.get(WILDCARD_ID))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
