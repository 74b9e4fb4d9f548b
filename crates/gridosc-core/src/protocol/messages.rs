//! All message types exchanged with grid devices and the serialosc daemon.
//!
//! Inbound traffic is decoded exactly once, at the transport boundary, into
//! an [`InboundMessage`].  Each variant carries one payload shape, so the
//! handshake and page logic never inspect raw argument lists.
//!
//! Outbound writes are described by an [`OutboundMessage`].  Binary LED
//! writes keep their unpacked values here; packing into bytes happens in the
//! codec so that the packing rule lives in exactly one place.

/// Default UDP port of the serialosc discovery daemon.
pub const SERIALOSC_PORT: u16 = 12002;

/// Wildcard device id used to register a catch-all application factory.
pub const WILDCARD_ID: &str = "*";

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Press state carried by a `/grid/key` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyState {
    Released = 0,
    Pressed = 1,
}

impl KeyState {
    /// The wire value: `1` for a press, `0` for a release.
    pub fn as_int(self) -> i32 {
        self as i32
    }

    pub fn is_pressed(self) -> bool {
        self == KeyState::Pressed
    }
}

impl From<bool> for KeyState {
    fn from(pressed: bool) -> Self {
        if pressed {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }
}

/// A button press or release at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub x: u32,
    pub y: u32,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn new(x: u32, y: u32, state: KeyState) -> Self {
        Self { x, y, state }
    }

    pub fn press(x: u32, y: u32) -> Self {
        Self::new(x, y, KeyState::Pressed)
    }

    pub fn release(x: u32, y: u32) -> Self {
        Self::new(x, y, KeyState::Released)
    }

    pub fn coords(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

/// A reading from tilt sensor `sensor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiltEvent {
    pub sensor: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A device entry reported by serialosc: `(id, type, port)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAnnouncement {
    /// Serial number, e.g. `"m1000286"`.
    pub id: String,
    /// Model string, e.g. `"monome 128"`.
    pub kind: String,
    /// UDP port the device listens on.
    pub port: u16,
}

/// Every message this library understands, after address matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// `/sys/id s`
    SysId(String),
    /// `/sys/size i i`
    SysSize { width: u32, height: u32 },
    /// `/sys/rotation i` (degrees)
    SysRotation(i32),
    /// `/sys/host s`
    SysHost(String),
    /// `/sys/port i`
    SysPort(u16),
    /// `/sys/prefix s`
    SysPrefix(String),
    /// `/<prefix>/grid/key i i i`
    GridKey(KeyEvent),
    /// `/<prefix>/tilt i i i i`
    Tilt(TiltEvent),
    /// `/sys/disconnect`
    Disconnect,
    /// `/serialosc/device s s i` (reply to `/serialosc/list`)
    DiscoDevice(DeviceAnnouncement),
    /// `/serialosc/add s s i`
    DiscoAdd(DeviceAnnouncement),
    /// `/serialosc/remove s s i`
    DiscoRemove(DeviceAnnouncement),
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Every message this library sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// `/sys/host s`: where the device should send events.
    SysHost(String),
    /// `/sys/port i`
    SysPort(u16),
    /// `/sys/prefix s`
    SysPrefix(String),
    /// `/sys/info s i`: ask the device to report id, size and rotation.
    SysInfo { host: String, port: u16 },

    /// `/<prefix>/grid/led/set x y s`
    LedSet { x: u32, y: u32, s: u8 },
    /// `/<prefix>/grid/led/all s`
    LedAll(u8),
    /// `/<prefix>/grid/led/map x_off y_off b0..b7`, one packed byte per row.
    LedMap {
        x_offset: u32,
        y_offset: u32,
        rows: [[u8; 8]; 8],
    },
    /// `/<prefix>/grid/led/row x_off y b...`
    LedRow { x_offset: u32, y: u32, data: Vec<u8> },
    /// `/<prefix>/grid/led/col x y_off b...`
    LedCol { x: u32, y_offset: u32, data: Vec<u8> },
    /// `/<prefix>/grid/led/intensity i`
    LedIntensity(u8),

    /// `/<prefix>/grid/led/level/set x y l`
    LevelSet { x: u32, y: u32, level: u8 },
    /// `/<prefix>/grid/led/level/all l`
    LevelAll(u8),
    /// `/<prefix>/grid/led/level/map x_off y_off l...` (64 raw levels)
    LevelMap {
        x_offset: u32,
        y_offset: u32,
        levels: Vec<u8>,
    },
    /// `/<prefix>/grid/led/level/row x_off y l...`
    LevelRow {
        x_offset: u32,
        y: u32,
        levels: Vec<u8>,
    },
    /// `/<prefix>/grid/led/level/col x y_off l...`
    LevelCol {
        x: u32,
        y_offset: u32,
        levels: Vec<u8>,
    },

    /// `/<prefix>/tilt/set n s`
    TiltSet { sensor: u32, enabled: bool },

    /// `/serialosc/list host port`
    SerialoscList { host: String, port: u16 },
    /// `/serialosc/notify host port`
    SerialoscNotify { host: String, port: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_wire_values() {
        assert_eq!(KeyState::Pressed.as_int(), 1);
        assert_eq!(KeyState::Released.as_int(), 0);
    }

    #[test]
    fn test_key_state_from_bool() {
        assert_eq!(KeyState::from(true), KeyState::Pressed);
        assert!(!KeyState::from(false).is_pressed());
    }

    #[test]
    fn test_key_event_constructors() {
        // Arrange / Act
        let press = KeyEvent::press(3, 4);
        let release = KeyEvent::release(3, 4);

        // Assert
        assert_eq!(press.coords(), (3, 4));
        assert_eq!(press.state, KeyState::Pressed);
        assert_eq!(release.state, KeyState::Released);
        assert_ne!(press, release);
    }
}
