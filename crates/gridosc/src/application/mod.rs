//! Application layer for gridosc.
//!
//! Everything in this layer is synchronous and free of sockets.  Outbound
//! messages leave through the [`grid_client::MessageSink`] trait and new
//! connections are opened through [`registry::DeviceConnector`], so every
//! use case can be driven from a unit test by feeding it
//! [`gridosc_core::InboundMessage`]s.
//!
//! # Sub-modules
//!
//! - **`grid_client`** – The per-device protocol client: the
//!   connecting → negotiating → ready handshake and every LED write.
//!
//! - **`pages`** – Several applications sharing one grid, switched with a
//!   reserved corner button.
//!
//! - **`registry`** – Tracks devices reported by serialosc and starts or
//!   stops an application for each.
//!
//! - **`hello`** – A small demo application: pressing a key lights its row
//!   and column.

pub mod grid_client;
pub mod hello;
pub mod pages;
pub mod registry;
