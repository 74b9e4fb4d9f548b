//! GridClient: the per-device protocol client.
//!
//! A `GridClient` owns one device connection's handshake state and turns LED
//! calls into [`OutboundMessage`]s.  A [`GridConnection`] pairs a client with
//! the application ([`GridApp`]) that consumes its events.
//!
//! # Handshake (for beginners)
//!
//! A freshly connected device does not know where to send its events, and
//! we do not yet know what the device is.  The handshake fixes both:
//!
//! ```text
//! Connecting ──connect()──►  Negotiating ──id+size+rotation──►  Ready
//!    │                           │                                │
//!    sends /sys/host,            collects /sys/id, /sys/size,     fires ready()
//!    /sys/port, /sys/prefix,     /sys/rotation in any order       exactly once
//!    /sys/info
//! ```
//!
//! `Ready` is terminal for the life of the connection.  A device that
//! re-reports its size or rotation afterwards (for example after the user
//! rotates it in serialosc) is ignored; reconnecting is the only way to pick
//! up new metadata.
//!
//! Key and LED traffic is never held back while negotiating.  Upstream
//! layers simply should not rely on the device size until `ready()` fired.

use std::net::SocketAddr;

use gridosc_core::domain::bit_buffer::LedMap;
use gridosc_core::protocol::codec::normalize_prefix;
use gridosc_core::{InboundMessage, KeyEvent, OutboundMessage, TiltEvent};
use tracing::{debug, info, warn};

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Where a client's outbound messages go.
///
/// The production implementation queues messages for the connection's UDP
/// socket; tests record them.  Sends are fire-and-forget: nothing is
/// acknowledged and nothing can fail from the caller's point of view.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink {
    /// Queues one message for the device.
    fn send(&mut self, msg: OutboundMessage);
    /// Closes the underlying transport immediately.
    fn close(&mut self);
}

/// The LED surface an application draws on.
///
/// Implemented by [`GridClient`] (writes go straight to the device) and by
/// [`crate::application::pages::PageView`] (writes go to a page mirror and
/// reach the device only while that page is showing).
pub trait Grid {
    /// Device width in buttons, `0` until the size is known.
    fn width(&self) -> u32;
    /// Device height in buttons, `0` until the size is known.
    fn height(&self) -> u32;

    fn led_set(&mut self, x: u32, y: u32, s: u8);
    fn led_all(&mut self, s: u8);
    /// Sets the 8×8 block at `(x_offset, y_offset)`.
    fn led_map(&mut self, x_offset: u32, y_offset: u32, rows: &LedMap);
    /// Sets a row of any length starting at `x_offset`.
    fn led_row(&mut self, x_offset: u32, y: u32, data: &[u8]);
    /// Sets a column of any length starting at `y_offset`.
    fn led_col(&mut self, x: u32, y_offset: u32, data: &[u8]);
    /// Sets the brightness used for "on" binary LEDs.
    fn led_intensity(&mut self, i: u8);

    fn led_level_set(&mut self, x: u32, y: u32, level: u8);
    fn led_level_all(&mut self, level: u8);
    /// Sets the 8×8 block at `(x_offset, y_offset)` from 64 row-major levels.
    fn led_level_map(&mut self, x_offset: u32, y_offset: u32, levels: &[u8]);
    fn led_level_row(&mut self, x_offset: u32, y: u32, levels: &[u8]);
    fn led_level_col(&mut self, x: u32, y_offset: u32, levels: &[u8]);

    /// Enables or disables tilt sensor `sensor`.
    fn tilt_set(&mut self, sensor: u32, enabled: bool);
}

/// Device-specific behaviour.  Every handler defaults to a no-op, so an
/// application only overrides what it needs.
pub trait GridApp {
    /// Called once, when the device has reported id, size and rotation.
    fn ready(&mut self, _grid: &mut dyn Grid) {}

    /// A button was pressed or released.
    fn grid_key(&mut self, _grid: &mut dyn Grid, _key: KeyEvent) {}

    /// A tilt sensor reported a new reading.
    fn tilt(&mut self, _grid: &mut dyn Grid, _tilt: TiltEvent) {}

    /// The device went away; the transport is already closed.
    fn disconnect(&mut self) {}
}

impl<T: GridApp + ?Sized> GridApp for Box<T> {
    fn ready(&mut self, grid: &mut dyn Grid) {
        (**self).ready(grid);
    }

    fn grid_key(&mut self, grid: &mut dyn Grid, key: KeyEvent) {
        (**self).grid_key(grid, key);
    }

    fn tilt(&mut self, grid: &mut dyn Grid, tilt: TiltEvent) {
        (**self).tilt(grid, tilt);
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

// ── Device identity ───────────────────────────────────────────────────────────

/// Handshake progress of one device connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Transport open; nothing sent yet.
    Connecting,
    /// Announcements sent; waiting for id, size and rotation.
    Negotiating,
    /// All metadata known.  Terminal.
    Ready,
}

/// Everything known about a device once it is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    /// Local address the device sends events to.
    pub host: String,
    pub port: u16,
    pub width: u32,
    pub height: u32,
    pub rotation: i32,
}

// ── GridClient ────────────────────────────────────────────────────────────────

/// Protocol client for one grid device.
pub struct GridClient {
    prefix: String,
    local_addr: SocketAddr,
    state: HandshakeState,
    id: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    rotation: Option<i32>,
    sink: Box<dyn MessageSink + Send>,
}

impl GridClient {
    /// Creates a client in the `Connecting` state.
    ///
    /// `local_addr` is the resolved address of our end of the transport; it
    /// is what the device is told to send events to.  Leading and trailing
    /// slashes are stripped from `prefix`.
    pub fn new(
        prefix: &str,
        local_addr: SocketAddr,
        sink: Box<dyn MessageSink + Send>,
    ) -> Self {
        Self {
            prefix: normalize_prefix(prefix).to_string(),
            local_addr,
            state: HandshakeState::Connecting,
            id: None,
            width: None,
            height: None,
            rotation: None,
            sink,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// The device identity, available once the client is ready.
    pub fn device_info(&self) -> Option<DeviceInfo> {
        if !self.is_ready() {
            return None;
        }
        Some(DeviceInfo {
            id: self.id.clone()?,
            host: self.local_addr.ip().to_string(),
            port: self.local_addr.port(),
            width: self.width?,
            height: self.height?,
            rotation: self.rotation?,
        })
    }

    /// Announces our host, port and prefix to the device and requests its
    /// metadata.  Moves `Connecting` → `Negotiating`; a no-op otherwise.
    pub fn connect(&mut self) {
        if self.state != HandshakeState::Connecting {
            return;
        }
        let host = self.local_addr.ip().to_string();
        let port = self.local_addr.port();
        self.send(OutboundMessage::SysHost(host.clone()));
        self.send(OutboundMessage::SysPort(port));
        self.send(OutboundMessage::SysPrefix(self.prefix.clone()));
        self.send(OutboundMessage::SysInfo { host, port });
        self.state = HandshakeState::Negotiating;
        debug!("/{}: requested device info via {}", self.prefix, self.local_addr);
    }

    /// Records one `/sys/*` reply.
    ///
    /// Returns `true` exactly once: on the message that completes id, size
    /// and rotation.  Messages arriving after that change nothing.
    pub fn apply_sys(&mut self, msg: &InboundMessage) -> bool {
        if self.is_ready() {
            debug!("/{}: ignoring {msg:?} after ready", self.prefix);
            return false;
        }
        match msg {
            InboundMessage::SysId(id) => self.id = Some(id.clone()),
            InboundMessage::SysSize { width, height } => {
                self.width = Some(*width);
                self.height = Some(*height);
            }
            InboundMessage::SysRotation(rotation) => self.rotation = Some(*rotation),
            InboundMessage::SysHost(_) | InboundMessage::SysPort(_) | InboundMessage::SysPrefix(_) => {
                debug!("/{}: device echoed {msg:?}", self.prefix);
            }
            _ => return false,
        }
        if self.id.is_some()
            && self.width.is_some()
            && self.height.is_some()
            && self.rotation.is_some()
        {
            self.state = HandshakeState::Ready;
            return true;
        }
        false
    }

    /// Closes the transport.
    pub fn disconnect(&mut self) {
        self.sink.close();
    }

    fn send(&mut self, msg: OutboundMessage) {
        self.sink.send(msg);
    }
}

impl Grid for GridClient {
    fn width(&self) -> u32 {
        self.width.unwrap_or(0)
    }

    fn height(&self) -> u32 {
        self.height.unwrap_or(0)
    }

    fn led_set(&mut self, x: u32, y: u32, s: u8) {
        self.send(OutboundMessage::LedSet { x, y, s });
    }

    fn led_all(&mut self, s: u8) {
        self.send(OutboundMessage::LedAll(s));
    }

    fn led_map(&mut self, x_offset: u32, y_offset: u32, rows: &LedMap) {
        self.send(OutboundMessage::LedMap {
            x_offset,
            y_offset,
            rows: *rows,
        });
    }

    fn led_row(&mut self, x_offset: u32, y: u32, data: &[u8]) {
        self.send(OutboundMessage::LedRow {
            x_offset,
            y,
            data: data.to_vec(),
        });
    }

    fn led_col(&mut self, x: u32, y_offset: u32, data: &[u8]) {
        self.send(OutboundMessage::LedCol {
            x,
            y_offset,
            data: data.to_vec(),
        });
    }

    fn led_intensity(&mut self, i: u8) {
        self.send(OutboundMessage::LedIntensity(i));
    }

    fn led_level_set(&mut self, x: u32, y: u32, level: u8) {
        self.send(OutboundMessage::LevelSet { x, y, level });
    }

    fn led_level_all(&mut self, level: u8) {
        self.send(OutboundMessage::LevelAll(level));
    }

    fn led_level_map(&mut self, x_offset: u32, y_offset: u32, levels: &[u8]) {
        self.send(OutboundMessage::LevelMap {
            x_offset,
            y_offset,
            levels: levels.to_vec(),
        });
    }

    fn led_level_row(&mut self, x_offset: u32, y: u32, levels: &[u8]) {
        self.send(OutboundMessage::LevelRow {
            x_offset,
            y,
            levels: levels.to_vec(),
        });
    }

    fn led_level_col(&mut self, x: u32, y_offset: u32, levels: &[u8]) {
        self.send(OutboundMessage::LevelCol {
            x,
            y_offset,
            levels: levels.to_vec(),
        });
    }

    fn tilt_set(&mut self, sensor: u32, enabled: bool) {
        self.send(OutboundMessage::TiltSet { sensor, enabled });
    }
}

// ── GridConnection ────────────────────────────────────────────────────────────

/// A [`GridClient`] together with the application consuming its events.
///
/// Inbound messages are processed one at a time through [`handle`]; each
/// handler runs to completion before the next message is looked at.
///
/// [`handle`]: GridConnection::handle
pub struct GridConnection<A> {
    client: GridClient,
    app: A,
    closed: bool,
}

impl<A: GridApp> GridConnection<A> {
    pub fn new(client: GridClient, app: A) -> Self {
        Self {
            client,
            app,
            closed: false,
        }
    }

    /// Starts the handshake.
    pub fn start(&mut self) {
        self.client.connect();
    }

    /// Dispatches one inbound message.
    ///
    /// `/sys/*` replies feed the handshake; key and tilt events go to the
    /// application; `/sys/disconnect` closes the transport.
    pub fn handle(&mut self, msg: InboundMessage) {
        if self.closed {
            return;
        }
        match msg {
            InboundMessage::SysId(_)
            | InboundMessage::SysSize { .. }
            | InboundMessage::SysRotation(_)
            | InboundMessage::SysHost(_)
            | InboundMessage::SysPort(_)
            | InboundMessage::SysPrefix(_) => {
                if self.client.apply_sys(&msg) {
                    if let Some(info) = self.client.device_info() {
                        info!(
                            "device {} ready: {}x{}, rotation {}",
                            info.id, info.width, info.height, info.rotation
                        );
                    }
                    self.app.ready(&mut self.client);
                }
            }
            InboundMessage::GridKey(key) => self.app.grid_key(&mut self.client, key),
            InboundMessage::Tilt(tilt) => self.app.tilt(&mut self.client, tilt),
            InboundMessage::Disconnect => self.close(),
            InboundMessage::DiscoDevice(_)
            | InboundMessage::DiscoAdd(_)
            | InboundMessage::DiscoRemove(_) => {
                warn!("/{}: discovery message on a device connection: {msg:?}", self.client.prefix);
            }
        }
    }

    /// Closes the transport and tells the application.  Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.client.disconnect();
        self.app.disconnect();
        info!("/{}: disconnected", self.client.prefix);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn client(&self) -> &GridClient {
        &self.client
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// Runs `f` with both the application and the device, for drawing
    /// outside of an event handler.
    pub fn with_app<R>(&mut self, f: impl FnOnce(&mut A, &mut GridClient) -> R) -> R {
        f(&mut self.app, &mut self.client)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
