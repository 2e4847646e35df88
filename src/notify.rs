//! Transient user-facing message channel (toasts in the dashboard).

use tokio::sync::mpsc;
use tracing::{info, warn};

/// The two-method capability the coordinator needs to report outcomes.
pub trait Notifier: Send + Sync {
  fn notify_success(&self, message: &str);
  fn notify_error(&self, message: &str);
}

/// Routes notifications to the tracing subscriber.
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify_success(&self, message: &str) {
    info!(message, "mutation succeeded");
  }

  fn notify_error(&self, message: &str) {
    warn!(message, "mutation failed");
  }
}

/// Discards notifications; for embedding without a message sink.
pub struct NullNotifier;

impl Notifier for NullNotifier {
  fn notify_success(&self, _message: &str) {}

  fn notify_error(&self, _message: &str) {}
}

/// A notification as delivered to a [`ChannelNotifier`] consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
  Success(String),
  Error(String),
}

/// Forwards notifications over an unbounded channel so a view layer can
/// render them as toasts.
pub struct ChannelNotifier {
  tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Notifier for ChannelNotifier {
  fn notify_success(&self, message: &str) {
    // Receiver may be gone during shutdown; nothing to do about it.
    let _ = self.tx.send(Notification::Success(message.to_string()));
  }

  fn notify_error(&self, message: &str) {
    let _ = self.tx.send(Notification::Error(message.to_string()));
  }
}
