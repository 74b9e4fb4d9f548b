//! Translation between `rosc` OSC messages and typed gridosc messages.
//!
//! The byte-level OSC encoding is handled by `rosc`.  This module owns the
//! address-pattern surface:
//!
//! ```text
//! /sys/{id,size,host,port,prefix,rotation,disconnect}   device → us
//! /<prefix>/grid/key  /<prefix>/tilt                    device → us
//! /serialosc/{device,add,remove}                        serialosc → us
//! /sys/{host,port,prefix,info}                          us → device
//! /<prefix>/grid/led/...  /<prefix>/tilt/set            us → device
//! /serialosc/{list,notify}                              us → serialosc
//! ```
//!
//! Inbound argument lists are checked here and nowhere else.  A message
//! whose arguments do not match the expected shape is rejected with a
//! [`ProtocolError`] so that core logic only ever sees well-formed values.

use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{
    DeviceAnnouncement, InboundMessage, KeyEvent, KeyState, OutboundMessage, TiltEvent,
};
use crate::protocol::packing::{pack_chunks, pack_row};

/// Errors that can occur while translating OSC traffic.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The address pattern is not one this library handles.
    #[error("unhandled address pattern: {0}")]
    UnknownAddress(String),

    /// Fewer arguments than the address requires.
    #[error("{addr}: missing argument {index}")]
    MissingArgument { addr: String, index: usize },

    /// An argument has the wrong OSC type.
    #[error("{addr}: argument {index} should be {expected}, got {found}")]
    WrongArgumentType {
        addr: String,
        index: usize,
        expected: &'static str,
        found: String,
    },

    /// An integer argument is outside the range its field allows.
    #[error("{addr}: argument {index} out of range: {value}")]
    OutOfRange {
        addr: String,
        index: usize,
        value: i32,
    },

    /// `rosc` could not decode or encode the packet bytes.
    #[error("OSC packet error: {0}")]
    Osc(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalises an application prefix: `"/hello/"` and `"hello"` both become
/// `"hello"`.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}

/// Decodes one OSC message into an [`InboundMessage`].
///
/// `prefix` is the application prefix announced with `/sys/prefix`; it is
/// needed to recognise `/<prefix>/grid/key` and `/<prefix>/tilt`.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownAddress`] for any other address, and an
/// argument error when the arguments do not fit the address.
///
/// # Examples
///
/// ```rust
/// use gridosc_core::protocol::codec::decode_message;
/// use gridosc_core::protocol::messages::{InboundMessage, KeyEvent};
/// use rosc::{OscMessage, OscType};
///
/// let msg = OscMessage {
///     addr: "/hello/grid/key".to_string(),
///     args: vec![OscType::Int(3), OscType::Int(4), OscType::Int(1)],
/// };
/// let decoded = decode_message("hello", &msg).unwrap();
/// assert_eq!(decoded, InboundMessage::GridKey(KeyEvent::press(3, 4)));
/// ```
pub fn decode_message(prefix: &str, msg: &OscMessage) -> Result<InboundMessage, ProtocolError> {
    let args = Args { msg };
    let decoded = match msg.addr.as_str() {
        "/sys/id" => InboundMessage::SysId(args.string(0)?),
        "/sys/size" => InboundMessage::SysSize {
            width: args.unsigned(0)?,
            height: args.unsigned(1)?,
        },
        "/sys/rotation" => InboundMessage::SysRotation(args.int(0)?),
        "/sys/host" => InboundMessage::SysHost(args.string(0)?),
        "/sys/port" => InboundMessage::SysPort(args.port(0)?),
        "/sys/prefix" => InboundMessage::SysPrefix(args.string(0)?),
        "/sys/disconnect" => InboundMessage::Disconnect,
        "/serialosc/device" => InboundMessage::DiscoDevice(args.announcement()?),
        "/serialosc/add" => InboundMessage::DiscoAdd(args.announcement()?),
        "/serialosc/remove" => InboundMessage::DiscoRemove(args.announcement()?),
        addr => match addr
            .strip_prefix('/')
            .and_then(|rest| rest.strip_prefix(normalize_prefix(prefix)))
        {
            Some("/grid/key") => {
                let state = match args.int(2)? {
                    0 => KeyState::Released,
                    1 => KeyState::Pressed,
                    value => {
                        return Err(ProtocolError::OutOfRange {
                            addr: msg.addr.clone(),
                            index: 2,
                            value,
                        })
                    }
                };
                InboundMessage::GridKey(KeyEvent::new(args.unsigned(0)?, args.unsigned(1)?, state))
            }
            Some("/tilt") => InboundMessage::Tilt(TiltEvent {
                sensor: args.unsigned(0)?,
                x: args.int(1)?,
                y: args.int(2)?,
                z: args.int(3)?,
            }),
            _ => return Err(ProtocolError::UnknownAddress(msg.addr.clone())),
        },
    };
    Ok(decoded)
}

/// Encodes an [`OutboundMessage`] as an OSC message.
///
/// Grid and tilt addresses are placed under `/<prefix>`; `/sys/*` and
/// `/serialosc/*` addresses are not prefixed.  Binary row, column and map
/// writes are packed eight LEDs per integer here.
pub fn encode_message(prefix: &str, msg: &OutboundMessage) -> OscMessage {
    let p = normalize_prefix(prefix);
    let (addr, args): (String, Vec<OscType>) = match msg {
        OutboundMessage::SysHost(host) => ("/sys/host".into(), vec![string(host)]),
        OutboundMessage::SysPort(port) => ("/sys/port".into(), vec![int(*port)]),
        OutboundMessage::SysPrefix(prefix) => ("/sys/prefix".into(), vec![string(prefix)]),
        OutboundMessage::SysInfo { host, port } => {
            ("/sys/info".into(), vec![string(host), int(*port)])
        }

        OutboundMessage::LedSet { x, y, s } => (
            format!("/{p}/grid/led/set"),
            vec![int(*x), int(*y), int(*s)],
        ),
        OutboundMessage::LedAll(s) => (format!("/{p}/grid/led/all"), vec![int(*s)]),
        OutboundMessage::LedMap {
            x_offset,
            y_offset,
            rows,
        } => {
            let mut args = vec![int(*x_offset), int(*y_offset)];
            args.extend(rows.iter().map(|row| int(pack_row(row))));
            (format!("/{p}/grid/led/map"), args)
        }
        OutboundMessage::LedRow { x_offset, y, data } => {
            let mut args = vec![int(*x_offset), int(*y)];
            args.extend(pack_chunks(data).into_iter().map(int));
            (format!("/{p}/grid/led/row"), args)
        }
        OutboundMessage::LedCol { x, y_offset, data } => {
            let mut args = vec![int(*x), int(*y_offset)];
            args.extend(pack_chunks(data).into_iter().map(int));
            (format!("/{p}/grid/led/col"), args)
        }
        OutboundMessage::LedIntensity(i) => (format!("/{p}/grid/led/intensity"), vec![int(*i)]),

        OutboundMessage::LevelSet { x, y, level } => (
            format!("/{p}/grid/led/level/set"),
            vec![int(*x), int(*y), int(*level)],
        ),
        OutboundMessage::LevelAll(level) => {
            (format!("/{p}/grid/led/level/all"), vec![int(*level)])
        }
        OutboundMessage::LevelMap {
            x_offset,
            y_offset,
            levels,
        } => (
            format!("/{p}/grid/led/level/map"),
            offset_then_levels(*x_offset, *y_offset, levels),
        ),
        OutboundMessage::LevelRow {
            x_offset,
            y,
            levels,
        } => (
            format!("/{p}/grid/led/level/row"),
            offset_then_levels(*x_offset, *y, levels),
        ),
        OutboundMessage::LevelCol {
            x,
            y_offset,
            levels,
        } => (
            format!("/{p}/grid/led/level/col"),
            offset_then_levels(*x, *y_offset, levels),
        ),

        OutboundMessage::TiltSet { sensor, enabled } => (
            format!("/{p}/tilt/set"),
            vec![int(*sensor), int(u8::from(*enabled))],
        ),

        OutboundMessage::SerialoscList { host, port } => {
            ("/serialosc/list".into(), vec![string(host), int(*port)])
        }
        OutboundMessage::SerialoscNotify { host, port } => {
            ("/serialosc/notify".into(), vec![string(host), int(*port)])
        }
    };
    OscMessage { addr, args }
}

/// Decodes a UDP datagram into its OSC messages, flattening bundles.
///
/// # Errors
///
/// Returns [`ProtocolError::Osc`] if `rosc` rejects the bytes.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<OscMessage>, ProtocolError> {
    let (_, packet) =
        rosc::decoder::decode_udp(bytes).map_err(|e| ProtocolError::Osc(format!("{e:?}")))?;
    let mut out = Vec::new();
    flatten(packet, &mut out);
    trace!("decoded {} message(s) from {} bytes", out.len(), bytes.len());
    Ok(out)
}

/// Encodes one OSC message into datagram bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Osc`] if `rosc` cannot encode the message.
pub fn encode_packet(msg: OscMessage) -> Result<Vec<u8>, ProtocolError> {
    rosc::encoder::encode(&OscPacket::Message(msg))
        .map_err(|e| ProtocolError::Osc(format!("{e:?}")))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

fn int<T: Into<i64>>(v: T) -> OscType {
    // Every coordinate, level and port on this surface fits in an i32.
    OscType::Int(v.into() as i32)
}

fn string(s: &str) -> OscType {
    OscType::String(s.to_string())
}

fn offset_then_levels(a: u32, b: u32, levels: &[u8]) -> Vec<OscType> {
    let mut args = vec![int(a), int(b)];
    args.extend(levels.iter().map(|&l| int(l)));
    args
}

/// Typed access to the arguments of one inbound message.
struct Args<'a> {
    msg: &'a OscMessage,
}

impl Args<'_> {
    fn get(&self, index: usize) -> Result<&OscType, ProtocolError> {
        self.msg
            .args
            .get(index)
            .ok_or_else(|| ProtocolError::MissingArgument {
                addr: self.msg.addr.clone(),
                index,
            })
    }

    fn wrong_type(&self, index: usize, expected: &'static str, found: &OscType) -> ProtocolError {
        ProtocolError::WrongArgumentType {
            addr: self.msg.addr.clone(),
            index,
            expected,
            found: format!("{found:?}"),
        }
    }

    fn int(&self, index: usize) -> Result<i32, ProtocolError> {
        match self.get(index)? {
            OscType::Int(v) => Ok(*v),
            other => Err(self.wrong_type(index, "int", other)),
        }
    }

    fn unsigned(&self, index: usize) -> Result<u32, ProtocolError> {
        let value = self.int(index)?;
        u32::try_from(value).map_err(|_| ProtocolError::OutOfRange {
            addr: self.msg.addr.clone(),
            index,
            value,
        })
    }

    fn port(&self, index: usize) -> Result<u16, ProtocolError> {
        let value = self.int(index)?;
        u16::try_from(value).map_err(|_| ProtocolError::OutOfRange {
            addr: self.msg.addr.clone(),
            index,
            value,
        })
    }

    fn string(&self, index: usize) -> Result<String, ProtocolError> {
        match self.get(index)? {
            OscType::String(s) => Ok(s.clone()),
            other => Err(self.wrong_type(index, "string", other)),
        }
    }

    fn announcement(&self) -> Result<DeviceAnnouncement, ProtocolError> {
        Ok(DeviceAnnouncement {
            id: self.string(0)?,
            kind: self.string(1)?,
            port: self.port(2)?,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
