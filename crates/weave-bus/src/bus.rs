//! # NotificationBus Implementation
//!
//! Subscriber lists are guarded by a `parking_lot::RwLock`. `notify` takes
//! its snapshot under the read lock and delivers outside it, so handlers
//! may subscribe, unsubscribe, and notify from within `on_event` without
//! deadlocking - the snapshot rule decides what they see.

use crate::event::{Event, Topic};
use crate::subscriber::{EventStream, Subscriber, SubscriptionId};
use crate::DEFAULT_STREAM_CAPACITY;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;
use weave_types::BoxError;

/// Notification bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Broadcast capacity per topic for the stream surface.
    pub stream_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

/// One subscriber's failure during a delivery pass.
///
/// Wraps the handler's own error without aborting delivery to the rest of
/// the snapshot.
#[derive(Debug, Error)]
#[error("handler '{subscriber}' (subscription #{seq}) failed: {source}")]
pub struct HandlerFailure {
    /// Name of the failing subscriber.
    pub subscriber: String,
    /// Sequence number of its subscription.
    pub seq: u64,
    /// The handler's error, unchanged.
    #[source]
    pub source: BoxError,
}

/// Aggregate outcome of one `notify` call.
///
/// Partial failure is a first-class result, not an exception: delivery is
/// always attempted for the full snapshot.
#[derive(Debug)]
pub struct DeliveryReport {
    /// Id of the delivered event.
    pub event_id: Uuid,
    /// Handlers that accepted the event.
    pub delivered: usize,
    /// Handlers that failed, in delivery order.
    pub failures: Vec<HandlerFailure>,
}

impl DeliveryReport {
    /// True if every snapshot member accepted the event.
    #[must_use]
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }

    /// Snapshot size: deliveries attempted, successful or not.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// A subscriber with its insertion sequence number.
struct RegisteredSubscriber<E> {
    seq: u64,
    subscriber: Arc<dyn Subscriber<E>>,
}

impl<E> Clone for RegisteredSubscriber<E> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            subscriber: Arc::clone(&self.subscriber),
        }
    }
}

/// Per-topic state: ordered subscribers plus an optional stream channel.
struct TopicState<E> {
    subscribers: Vec<RegisteredSubscriber<E>>,
    stream_sender: Option<broadcast::Sender<Event<E>>>,
}

impl<E> TopicState<E> {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            stream_sender: None,
        }
    }

    fn is_inert(&self) -> bool {
        self.subscribers.is_empty()
            && self
                .stream_sender
                .as_ref()
                .is_none_or(|sender| sender.receiver_count() == 0)
    }
}

/// Subject/observer mechanism with snapshot delivery and failure
/// aggregation.
///
/// The bus owns the subscription list for each topic; subscribers are
/// referenced, never owned - the bus never controls subscriber lifetime.
pub struct NotificationBus<E> {
    config: BusConfig,
    topics: RwLock<HashMap<Topic, TopicState<E>>>,
    next_seq: AtomicU64,
    events_published: AtomicU64,
}

impl<E: Clone> NotificationBus<E> {
    /// Create a bus with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with custom settings.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            topics: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register a subscriber for a topic. Returns a handle usable for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(
        &self,
        topic: impl Into<Topic>,
        subscriber: Arc<dyn Subscriber<E>>,
    ) -> SubscriptionId {
        let topic = topic.into();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

        debug!(
            topic = %topic,
            subscriber = subscriber.name(),
            seq,
            "Subscriber registered"
        );

        let mut topics = self.topics.write();
        topics
            .entry(topic.clone())
            .or_insert_with(TopicState::new)
            .subscribers
            .push(RegisteredSubscriber { seq, subscriber });

        SubscriptionId { topic, seq }
    }

    /// Remove a subscription. Idempotent: a second call for the same
    /// handle is a no-op returning `false`.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut topics = self.topics.write();
        let Some(state) = topics.get_mut(&id.topic) else {
            return false;
        };

        let before = state.subscribers.len();
        state.subscribers.retain(|entry| entry.seq != id.seq);
        let removed = state.subscribers.len() != before;

        if removed {
            debug!(topic = %id.topic, seq = id.seq, "Subscriber removed");
        }
        if state.is_inert() {
            topics.remove(&id.topic);
        }
        removed
    }

    /// Deliver an event to a snapshot of the topic's subscribers, in
    /// subscription order.
    ///
    /// Handler failures are collected into the returned report; delivery
    /// always continues through the full snapshot, and a failure never
    /// removes the handler's subscription.
    pub fn notify(&self, topic: impl Into<Topic>, payload: E) -> DeliveryReport {
        let topic = topic.into();
        let event = Event::new(topic.clone(), payload);
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot decides the recipient set; delivery runs outside the lock.
        let (snapshot, stream_sender) = {
            let topics = self.topics.read();
            match topics.get(&topic) {
                Some(state) => (state.subscribers.clone(), state.stream_sender.clone()),
                None => (Vec::new(), None),
            }
        };

        // Best-effort stream fan-out; not part of the report.
        if let Some(sender) = stream_sender {
            let _ = sender.send(event.clone());
        }

        let mut delivered = 0;
        let mut failures = Vec::new();
        for entry in &snapshot {
            match entry.subscriber.on_event(&event) {
                Ok(()) => delivered += 1,
                Err(source) => {
                    warn!(
                        topic = %topic,
                        subscriber = entry.subscriber.name(),
                        seq = entry.seq,
                        error = %source,
                        "Handler failed, continuing delivery"
                    );
                    failures.push(HandlerFailure {
                        subscriber: entry.subscriber.name().to_string(),
                        seq: entry.seq,
                        source,
                    });
                }
            }
        }

        debug!(
            topic = %topic,
            event_id = %event.id,
            delivered,
            failed = failures.len(),
            "Event delivered"
        );

        DeliveryReport {
            event_id: event.id,
            delivered,
            failures,
        }
    }

    /// Open a best-effort event stream for a topic.
    #[must_use]
    pub fn stream(&self, topic: impl Into<Topic>) -> EventStream<E> {
        let topic = topic.into();
        let mut topics = self.topics.write();
        let state = topics.entry(topic.clone()).or_insert_with(TopicState::new);
        let sender = state
            .stream_sender
            .get_or_insert_with(|| broadcast::channel(self.config.stream_capacity).0);
        EventStream::new(sender.subscribe(), topic)
    }

    /// Number of handler subscriptions for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .read()
            .get(topic)
            .map_or(0, |state| state.subscribers.len())
    }

    /// Topics that currently have subscribers or live streams.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Total events published through this bus.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl<E: Clone> Default for NotificationBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
