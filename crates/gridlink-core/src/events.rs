//! Outward notifications raised by the handshake reconciler.

use tokio::sync::broadcast;

/// Notification delivered to the owning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A peer group has published usable partition data.
    ///
    /// Re-entrant: raised again on every change while the data remains
    /// present. Consumers must treat it as idempotent, not single-shot.
    Available,
    /// The relation was torn down or the secret revoked.
    Unavailable,
}

/// Broadcast fan-out of [`Notification`]s to subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered notifications
    /// per subscriber. Lagging subscribers lose the oldest.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publishes one notification; returns the number of receivers.
    ///
    /// A bus with no subscribers swallows the notification, which is fine:
    /// availability is also recorded on the handshake state.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or_default()
    }

    /// Publishes every notification from a reconcile outcome.
    pub fn publish_all<I>(&self, notifications: I)
    where
        I: IntoIterator<Item = Notification>,
    {
        for notification in notifications {
            self.publish(notification);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
