//! Per-subscriber delivery counters
//!
//! The manager counts an event as queued when it is handed to a subscriber's
//! channel; the `EventReceiver` counts it as received when it is taken off.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

#[derive(Default)]
pub struct SubscriberStatistics {
    backlog: AtomicUsize,
    received: AtomicUsize,
    last_received_at: RwLock<Option<Instant>>,
}

impl SubscriberStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events queued for the subscriber and not yet received
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Relaxed)
    }

    /// Count one queued event; returns the new backlog
    pub fn record_queued(&self) -> usize {
        self.backlog.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_received(&self) {
        let _ = self
            .backlog
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });
        self.received.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut at) = self.last_received_at.write() {
            *at = Some(Instant::now());
        }
    }

    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }

    pub fn last_received_at(&self) -> Option<Instant> {
        *self.last_received_at.read().ok()?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_never_underflows() {
        let stats = SubscriberStatistics::new();
        stats.record_received();
        assert_eq!(stats.backlog(), 0);

        assert_eq!(stats.record_queued(), 1);
        assert_eq!(stats.record_queued(), 2);
        stats.record_received();
        assert_eq!(stats.backlog(), 1);
    }

    #[test]
    fn test_received_updates_timestamp() {
        let stats = SubscriberStatistics::new();
        assert!(stats.last_received_at().is_none());

        stats.record_received();
        assert_eq!(stats.received(), 1);
        assert!(stats.last_received_at().is_some());
    }
}
