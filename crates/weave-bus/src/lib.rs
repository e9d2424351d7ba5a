//! # Notification Bus - Subject/Observer Delivery
//!
//! Maintains ordered subscriber lists per topic and delivers state-change
//! events to them deterministically.
//!
//! ## Delivery Rules
//!
//! - `notify` delivers to a **snapshot** of the topic's subscriber list
//!   taken at call start, in subscription order. Subscribers added during
//!   delivery do not receive the event; subscribers removed during delivery
//!   still receive it if they were in the snapshot (at-most-once, decided
//!   at snapshot time).
//! - One failing handler never blocks the rest: failures are collected and
//!   returned as an aggregate [`DeliveryReport`], and a failure never
//!   removes the handler's subscription.
//! - Ordering is guaranteed within a topic only, never across topics.
//!
//! ## Stream Surface
//!
//! Synchronous handlers are the primary contract. Async consumers use
//! [`NotificationBus::stream`], a best-effort broadcast channel per topic:
//! lagging streams drop the oldest events and do not participate in
//! delivery reports.

pub mod bus;
pub mod event;
pub mod subscriber;

pub use bus::{BusConfig, DeliveryReport, HandlerFailure, NotificationBus};
pub use event::{Event, Topic};
pub use subscriber::{EventStream, StreamError, Subscriber, SubscriptionId};

/// Default events buffered per stream subscriber before lagging.
pub const DEFAULT_STREAM_CAPACITY: usize = 1024;
