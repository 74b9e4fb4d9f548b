//! Infrastructure layer for gridosc.
//!
//! Contains the OS-facing adapters: tokio UDP sockets speaking OSC to
//! serialosc and to each device, and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `gridosc_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.

pub mod storage;
pub mod transport;
