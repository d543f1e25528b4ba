//! Notification sinks for user-visible errors.
//!
//! Services push short error strings through a [`Notifier`]. The host decides
//! how they surface: a tracing event, a channel read by the UI loop, or a
//! buffer inspected by tests. [`CompositeNotifier`] fans out to several sinks.

use std::sync::Arc;

use parking_lot::Mutex;
use taskdesk_core::Notifier;
use tokio::sync::mpsc;

/// Logs every notification as a `warn` event on the `taskdesk::toast` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::warn!(target: "taskdesk::toast", message = %message, "user notification");
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiver the host drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify_error(&self, message: &str) {
        // The receiver may have been dropped during shutdown.
        let _ = self.tx.send(message.to_string());
    }
}

/// Buffers notifications in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every message received so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Number of messages received so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }

    /// Drops all buffered messages.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Fans a notification out to every registered sink.
#[derive(Default)]
pub struct CompositeNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink after construction.
    pub fn add(&mut self, sink: Arc<dyn Notifier>) {
        self.sinks.push(sink);
    }
}

impl Notifier for CompositeNotifier {
    fn notify_error(&self, message: &str) {
        for sink in &self.sinks {
            sink.notify_error(message);
        }
    }
}
