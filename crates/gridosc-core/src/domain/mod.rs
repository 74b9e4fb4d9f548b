//! Domain layer: pure data structures with no I/O.
//!
//! # Sub-modules
//!
//! - **`bit_buffer`** – [`bit_buffer::BitBuffer`], a width × height LED
//!   mirror that silently ignores out-of-range writes.
//!
//! - **`corner`** – [`corner::PageCorner`], the grid corner reserved for the
//!   page-switch button, and the logic that turns it into a coordinate.

pub mod bit_buffer;
pub mod corner;
