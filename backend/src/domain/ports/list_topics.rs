//! Ports for per-list topic fan-out.
//!
//! The publisher side is used by the list service after a mutation has been
//! committed; the subscription side is used by live transport adapters once
//! they have confirmed the caller may view the list. Neither side performs
//! membership checks.

use crate::domain::{ConnectionId, ListEvent, ListId, LiveConnection};

/// Delivery accounting for one publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose outbox accepted the event.
    pub delivered: usize,
    /// Subscribers whose outbox was full; the event was dropped for them.
    pub dropped: usize,
    /// Subscribers found closed and removed from the topic.
    pub pruned: usize,
}

/// Best-effort publication of committed list changes.
#[cfg_attr(test, mockall::automock)]
pub trait ListEventPublisher: Send + Sync {
    /// Deliver `event` to every current subscriber of `list` without waiting
    /// on any of them.
    fn publish(&self, list: ListId, event: ListEvent) -> PublishReport;
}

/// Subscription management for live connections.
#[cfg_attr(test, mockall::automock)]
pub trait TopicSubscriptions: Send + Sync {
    /// Bind `connection` to `list`. Returns `false` when already subscribed.
    fn subscribe(&self, connection: &LiveConnection, list: ListId) -> bool;

    /// Remove one binding. Returns `false` when it did not exist.
    fn unsubscribe(&self, connection: ConnectionId, list: ListId) -> bool;

    /// Remove every binding of a terminated connection; returns how many.
    fn unsubscribe_all(&self, connection: ConnectionId) -> usize;
}

/// Publisher that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpListEventPublisher;

impl ListEventPublisher for NoOpListEventPublisher {
    fn publish(&self, _list: ListId, _event: ListEvent) -> PublishReport {
        PublishReport::default()
    }
}
