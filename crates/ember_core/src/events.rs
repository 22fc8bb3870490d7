//! # World Events
//!
//! Coarse "something changed" notifications from the world to outside
//! observers (renderers, editors, tools).
//!
//! ```text
//! ┌─────────┐  try_send  ┌──────────────┐
//! │  World  │───────────>│ subscriber 1 │
//! │         │───────────>│ subscriber 2 │
//! └─────────┘            └──────────────┘
//! ```
//!
//! Each subscriber owns a bounded crossbeam channel. Publishing never
//! blocks: a full channel drops the event, a dropped receiver is pruned.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::trace;

/// Notifications raised by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldEvent {
    /// Entity or component structure changed.
    Resolve,
    /// The simulation started.
    Started,
    /// The simulation stopped.
    Stopped,
    /// Every entity was removed.
    Unloaded,
    /// The world was written to a stream or file.
    Saved,
    /// The world was read from a stream or file.
    Loaded,
}

/// Broadcasts [`WorldEvent`]s to every subscriber.
///
/// Also keeps a dirty flag that mirrors [`WorldEvent::Resolve`], so pollers
/// do not need a channel at all.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Vec<Sender<WorldEvent>>,
    capacity: usize,
    dirty: bool,
}

impl EventBus {
    /// Creates a bus whose subscriber channels hold `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
            dirty: false,
        }
    }

    /// Opens a new subscriber channel.
    #[must_use]
    pub fn subscribe(&mut self) -> EventReceiver {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.push(sender);
        EventReceiver { receiver }
    }

    /// Sends `event` to every live subscriber without blocking.
    pub fn publish(&mut self, event: WorldEvent) {
        self.subscribers.retain(|sender| match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!(?event, "subscriber channel full, event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Marks the world dirty and publishes [`WorldEvent::Resolve`].
    pub fn resolve(&mut self) {
        self.dirty = true;
        self.publish(WorldEvent::Resolve);
    }

    /// Whether a resolve happened since the last [`EventBus::take_dirty`].
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Number of live subscribers (as of the last publish).
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Handle for receiving world events.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<WorldEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    pub fn drain(&self) -> Vec<WorldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<WorldEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_to_all_subscribers() {
        let mut bus = EventBus::new(8);
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(WorldEvent::Started);
        bus.resolve();

        assert_eq!(first.drain(), vec![WorldEvent::Started, WorldEvent::Resolve]);
        assert_eq!(second.try_recv(), Some(WorldEvent::Started));
        assert!(bus.is_dirty());
    }

    #[test]
    fn test_full_channel_drops_events() {
        let mut bus = EventBus::new(1);
        let receiver = bus.subscribe();

        bus.resolve();
        bus.resolve();
        assert_eq!(receiver.pending_count(), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_disconnected_subscribers_are_pruned() {
        let mut bus = EventBus::new(4);
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(WorldEvent::Saved);
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.has_events());
    }

    #[test]
    fn test_take_dirty_clears() {
        let mut bus = EventBus::new(4);
        assert!(!bus.take_dirty());
        bus.resolve();
        assert!(bus.take_dirty());
        assert!(!bus.is_dirty());
    }
}
