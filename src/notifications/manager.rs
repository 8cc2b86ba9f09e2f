//! AsyncNotificationManager implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::event::{Event, EventFilter};
use crate::notifications::stats::SubscriberStatistics;

// Backlog at which a subscriber is reported as falling behind
const HIGH_WATER_MARK: usize = 10_000;

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
    statistics: Arc<SubscriberStatistics>,
}

/// Receiving end of a subscription; keeps the subscriber statistics current
pub struct EventReceiver {
    receiver: UnboundedReceiver<Event>,
    statistics: Arc<SubscriberStatistics>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<Event> {
        let event = self.receiver.recv().await;
        if event.is_some() {
            self.statistics.record_received();
        }
        event
    }

    pub fn try_recv(&mut self) -> Option<Event> {
        let event = self.receiver.try_recv().ok();
        if event.is_some() {
            self.statistics.record_received();
        }
        event
    }
}

#[derive(Default)]
pub struct AsyncNotificationManager {
    subscribers: HashMap<String, SubscriberInfo>,
}

impl AsyncNotificationManager {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> NotificationResult<EventReceiver> {
        let (sender, receiver) = unbounded_channel();
        let statistics = Arc::new(SubscriberStatistics::new());

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
            statistics: Arc::clone(&statistics),
        };

        if let Some(existing) = self.subscribers.insert(subscriber_id.clone(), subscriber_info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        Ok(EventReceiver {
            receiver,
            statistics,
        })
    }

    pub fn unsubscribe(&mut self, subscriber_id: &str) -> bool {
        self.subscribers.remove(subscriber_id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    pub fn get_subscriber_statistics(&self, subscriber_id: &str) -> Option<Arc<SubscriberStatistics>> {
        self.subscribers
            .get(subscriber_id)
            .map(|info| Arc::clone(&info.statistics))
    }

    pub fn check_high_water_marks(&self) -> Vec<String> {
        self.subscribers
            .iter()
            .filter(|(_, info)| info.statistics.backlog() >= HIGH_WATER_MARK)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Deliver `event` to every subscriber whose filter accepts it
    ///
    /// Subscribers whose receiver has been dropped are removed and reported in
    /// `PublishFailed`; the others still receive the event.
    pub async fn publish(&mut self, event: Event) -> NotificationResult<()> {
        let mut failed_subscribers = Vec::new();

        for (subscriber_id, subscriber_info) in &self.subscribers {
            if !subscriber_info.filter.accepts(&event) {
                continue;
            }

            let queued = subscriber_info.statistics.record_queued();
            if queued == HIGH_WATER_MARK {
                log::warn!(
                    "Subscriber '{}' ({}) has {} undelivered events",
                    subscriber_id,
                    subscriber_info.source,
                    queued
                );
            }

            if subscriber_info.sender.send(event.clone()).is_err() {
                failed_subscribers.push(subscriber_id.clone());
            }
        }

        for subscriber_id in &failed_subscribers {
            self.subscribers.remove(subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type: event.kind().to_string(),
                failed_subscribers,
            });
        }

        Ok(())
    }
}
