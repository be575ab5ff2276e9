//! Event bus for change notification
//!
//! A thin wrapper over `tokio::sync::broadcast`. Subscribers only receive
//! events emitted after they subscribe; slow subscribers lose the oldest
//! events once `capacity` is exceeded.

use tokio::sync::broadcast;

/// Broadcast channel shared between a producer and any number of observers
#[derive(Debug, Clone)]
pub struct EventBus<E: Clone> {
    tx: broadcast::Sender<E>,
    capacity: usize,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use pantry_common::events::EventBus;
    ///
    /// let event_bus: EventBus<u32> = EventBus::new(16);
    /// assert_eq!(event_bus.capacity(), 16);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_ignored() {
        let bus: EventBus<&'static str> = EventBus::new(4);
        bus.emit_lossy("nobody");
        assert_eq!(bus.capacity(), 4);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit_lossy(1);
        bus.emit_lossy(2);

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(8);
        let _early = bus.subscribe();
        bus.emit_lossy(1);

        let mut late = bus.subscribe();
        bus.emit_lossy(2);
        assert_eq!(late.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_past_capacity() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..4 {
            bus.emit_lossy(i);
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap(), 2);
    }
}
