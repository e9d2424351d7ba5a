//! # Subscribers, Subscription Handles, and Event Streams

use crate::event::{Event, Topic};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;
use weave_types::BoxError;

/// A registered interest in a topic's events.
///
/// The return value of `on_event` feeds the bus's failure-isolation
/// reporting: an `Err` is recorded as a `HandlerFailure`, and delivery to
/// the remaining subscribers continues.
pub trait Subscriber<E>: Send + Sync {
    /// Subscriber name (debugging and failure reports).
    fn name(&self) -> &str;

    /// Handle one delivered event.
    ///
    /// # Errors
    ///
    /// Whatever the handler raises; collected, never fatal to delivery.
    fn on_event(&self, event: &Event<E>) -> Result<(), BoxError>;
}

/// Handle identifying one subscription, usable for unsubscribe.
///
/// Sequence numbers are strictly increasing in subscription order;
/// unsubscribing makes the handle permanently inert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub(crate) topic: Topic,
    pub(crate) seq: u64,
}

impl SubscriptionId {
    /// The topic this subscription listens on.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Insertion sequence number within the bus.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Errors from stream operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The bus (and with it the topic's channel) was dropped.
    #[error("event stream closed")]
    Closed,
}

/// Best-effort stream of one topic's events.
///
/// Backed by a broadcast channel: a lagging consumer drops the oldest
/// events rather than wedging the bus. Implements
/// `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream<E> {
    receiver: broadcast::Receiver<Event<E>>,
    topic: Topic,
}

impl<E: Clone> EventStream<E> {
    pub(crate) fn new(receiver: broadcast::Receiver<Event<E>>, topic: Topic) -> Self {
        Self { receiver, topic }
    }

    /// The topic this stream follows.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Receive the next event.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next event on the topic
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<Event<E>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(topic = %self.topic, lagged = count, "Stream lagged, events dropped");
                    continue;
                }
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Errors
    ///
    /// `StreamError::Closed` if the channel was closed.
    pub fn try_recv(&mut self) -> Result<Option<Event<E>>, StreamError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(StreamError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }
}

impl<E: Clone> Stream for EventStream<E> {
    type Item = Event<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Non-blocking check; re-arm the waker while empty.
        match self.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(StreamError::Closed) => Poll::Ready(None),
        }
    }
}
