//! gridosc library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does gridosc do? (for beginners)
//!
//! A program that wants to drive a grid controller goes through three steps:
//!
//! 1. Ask the serialosc daemon which devices are attached.  Each device gets
//!    its own UDP port.  [`application::registry::DeviceRegistry`] keeps that
//!    list and starts a connection whenever a device appears.
//! 2. Talk to one device.  [`application::grid_client::GridClient`] tells the
//!    device where to send events, waits until the device has reported its
//!    id, size and rotation, and then hands key and tilt events to the
//!    application while turning LED calls into OSC messages.
//! 3. Optionally share one device between several applications.
//!    [`application::pages::PageMultiplexer`] keeps an LED mirror per
//!    application and switches between them with a corner button.

/// Application layer: handshake, page switching, device registry.
pub mod application;

/// Infrastructure layer: UDP transport and configuration file.
pub mod infrastructure;
