//! Recording message sink for unit and integration tests.
//!
//! Lets tests drive a [`GridClient`](crate::application::grid_client::GridClient)
//! or a [`DeviceRegistry`](crate::application::registry::DeviceRegistry)
//! without a socket and then inspect exactly what would have been sent.

use std::sync::{Arc, Mutex};

use gridosc_core::OutboundMessage;

use crate::application::grid_client::MessageSink;

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<OutboundMessage>,
    closed: bool,
}

/// A [`MessageSink`] that stores every message.
///
/// Clones share the same record, so a test keeps one clone and hands the
/// other to the code under test.  Messages sent after `close()` are dropped,
/// the same as on a real transport.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything sent so far.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.inner.lock().expect("lock poisoned").messages.clone()
    }

    /// Returns everything sent so far and clears the record.
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.inner.lock().expect("lock poisoned").messages)
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("lock poisoned").closed
    }
}

impl MessageSink for RecordingSink {
    fn send(&mut self, msg: OutboundMessage) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if !inner.closed {
            inner.messages.push(msg);
        }
    }

    fn close(&mut self) {
        self.inner.lock().expect("lock poisoned").closed = true;
    }
}
