//! Protocol module containing message types, bit packing, and the OSC codec.

pub mod codec;
pub mod messages;
pub mod packing;

pub use codec::{decode_message, decode_packet, encode_message, encode_packet, ProtocolError};
pub use messages::*;
pub use packing::{pack_chunks, pack_row, unpack_row};
