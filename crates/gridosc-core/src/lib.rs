//! # gridosc-core
//!
//! Shared library for gridosc containing the LED framebuffer model, the
//! row/column bit packing used on the wire, and the typed message set spoken
//! by grid controllers and the serialosc discovery service.
//!
//! It has zero dependencies on sockets or async runtimes.  The OSC byte
//! encoding itself is provided by the `rosc` crate; this crate only turns
//! `rosc` messages into typed Rust values and back.
//!
//! # Architecture overview (for beginners)
//!
//! A grid controller is a rectangle of illuminated buttons.  Pressing a
//! button produces a `/<prefix>/grid/key x y s` message; lighting an LED is
//! done by sending `/<prefix>/grid/led/...` messages back.  A small daemon,
//! serialosc, tells programs which devices are plugged in and on which UDP
//! port each one listens.
//!
//! - **`domain`** – Pure data structures with no I/O.  The most important
//!   piece is [`BitBuffer`]: an in-memory mirror of every LED on a device.
//!
//! - **`protocol`** – How messages travel over the network.  Inbound OSC
//!   messages are matched against their address pattern exactly once and
//!   turned into an [`InboundMessage`]; outbound writes are described by an
//!   [`OutboundMessage`] and encoded back into OSC.

pub mod domain;
pub mod protocol;

pub use domain::bit_buffer::BitBuffer;
pub use domain::corner::{CornerParseError, PageCorner};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{
    DeviceAnnouncement, InboundMessage, KeyEvent, KeyState, OutboundMessage, TiltEvent,
    SERIALOSC_PORT, WILDCARD_ID,
};
pub use protocol::packing::{pack_row, pack_chunks, unpack_row};
