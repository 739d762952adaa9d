//! In-process topic registry implementing list event fan-out.
//!
//! Each live connection owns a bounded outbox. Publishing never awaits: a
//! full outbox loses the event for that connection only, and a closed outbox
//! removes the connection from every topic it was bound to. Because the
//! list service publishes while holding the list's lock, events for one
//! topic enter each outbox in commit order.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::ports::{ListEventPublisher, PublishReport, TopicSubscriptions};
use crate::domain::{ConnectionId, ListEvent, ListId, LiveConnection, TopicEvent};

#[derive(Default)]
struct Topics {
    subscribers: HashMap<ListId, HashMap<ConnectionId, mpsc::Sender<TopicEvent>>>,
    bindings: HashMap<ConnectionId, HashSet<ListId>>,
}

impl Topics {
    fn remove(&mut self, connection: ConnectionId, list: ListId) -> bool {
        let removed = match self.subscribers.get_mut(&list) {
            Some(topic) => {
                let removed = topic.remove(&connection).is_some();
                if topic.is_empty() {
                    self.subscribers.remove(&list);
                }
                removed
            }
            None => false,
        };
        if let Some(lists) = self.bindings.get_mut(&connection) {
            lists.remove(&list);
            if lists.is_empty() {
                self.bindings.remove(&connection);
            }
        }
        removed
    }
}

/// Registry of list topics and their subscribed connections.
#[derive(Default)]
pub struct TopicRegistry {
    topics: Mutex<Topics>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn topics(&self) -> MutexGuard<'_, Topics> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of connections currently bound to `list`.
    pub fn subscriber_count(&self, list: ListId) -> usize {
        self.topics()
            .subscribers
            .get(&list)
            .map_or(0, HashMap::len)
    }
}

impl ListEventPublisher for TopicRegistry {
    fn publish(&self, list: ListId, event: ListEvent) -> PublishReport {
        let mut topics = self.topics();
        let mut report = PublishReport::default();
        let Some(topic) = topics.subscribers.get(&list) else {
            return report;
        };

        let mut closed = Vec::new();
        for (connection, outbox) in topic {
            let delivery = TopicEvent {
                list_id: list,
                event: event.clone(),
            };
            match outbox.try_send(delivery) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    warn!(
                        connection = %connection,
                        list_id = %list,
                        event = event.kind(),
                        "subscriber outbox full; event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*connection),
            }
        }

        for connection in closed {
            topics.remove(connection, list);
            report.pruned += 1;
            debug!(connection = %connection, list_id = %list, "pruned closed subscriber");
        }
        report
    }
}

impl TopicSubscriptions for TopicRegistry {
    fn subscribe(&self, connection: &LiveConnection, list: ListId) -> bool {
        let mut topics = self.topics();
        let topic = topics.subscribers.entry(list).or_default();
        if topic.contains_key(&connection.id()) {
            return false;
        }
        topic.insert(connection.id(), connection.outbox().clone());
        topics
            .bindings
            .entry(connection.id())
            .or_default()
            .insert(list);
        true
    }

    fn unsubscribe(&self, connection: ConnectionId, list: ListId) -> bool {
        self.topics().remove(connection, list)
    }

    fn unsubscribe_all(&self, connection: ConnectionId) -> usize {
        let mut topics = self.topics();
        let lists = topics.bindings.remove(&connection).unwrap_or_default();
        for list in &lists {
            if let Some(topic) = topics.subscribers.get_mut(list) {
                topic.remove(&connection);
                if topic.is_empty() {
                    topics.subscribers.remove(list);
                }
            }
        }
        lists.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use rstest::rstest;

    fn deleted() -> ListEvent {
        ListEvent::ItemDeleted {
            item_id: ItemId::random(),
        }
    }

    #[rstest]
    fn publish_reaches_only_the_topic_subscribers() {
        let registry = TopicRegistry::new();
        let list = ListId::random();
        let other = ListId::random();
        let (a, mut rx_a) = LiveConnection::open(4);
        let (b, mut rx_b) = LiveConnection::open(4);
        assert!(registry.subscribe(&a, list));
        assert!(registry.subscribe(&b, other));

        let event = deleted();
        let report = registry.publish(list, event.clone());

        assert_eq!(report.delivered, 1);
        assert_eq!(rx_a.try_recv().expect("delivered").event, event);
        assert!(rx_b.try_recv().is_err());
    }

    #[rstest]
    fn duplicate_subscription_is_a_no_op() {
        let registry = TopicRegistry::new();
        let list = ListId::random();
        let (a, mut rx) = LiveConnection::open(4);
        assert!(registry.subscribe(&a, list));
        assert!(!registry.subscribe(&a, list));

        registry.publish(list, deleted());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "one copy per connection");
    }

    #[rstest]
    fn full_outbox_drops_without_affecting_others() {
        let registry = TopicRegistry::new();
        let list = ListId::random();
        let (slow, _slow_rx) = LiveConnection::open(1);
        let (fast, mut fast_rx) = LiveConnection::open(8);
        registry.subscribe(&slow, list);
        registry.subscribe(&fast, list);

        registry.publish(list, deleted());
        let report = registry.publish(list, deleted());

        assert_eq!(report.dropped, 1);
        assert_eq!(report.delivered, 1);
        assert!(fast_rx.try_recv().is_ok());
        assert!(fast_rx.try_recv().is_ok());
        assert_eq!(registry.subscriber_count(list), 2);
    }

    #[rstest]
    fn closed_connections_are_pruned_on_publish() {
        let registry = TopicRegistry::new();
        let list = ListId::random();
        let (gone, rx) = LiveConnection::open(4);
        registry.subscribe(&gone, list);
        drop(rx);

        let report = registry.publish(list, deleted());
        assert_eq!(report.pruned, 1);
        assert_eq!(registry.subscriber_count(list), 0);
        assert_eq!(registry.unsubscribe_all(gone.id()), 0);
    }

    #[rstest]
    fn unsubscribe_all_removes_every_binding() {
        let registry = TopicRegistry::new();
        let first = ListId::random();
        let second = ListId::random();
        let (conn, _rx) = LiveConnection::open(4);
        registry.subscribe(&conn, first);
        registry.subscribe(&conn, second);

        assert!(registry.unsubscribe(conn.id(), first));
        assert!(!registry.unsubscribe(conn.id(), first));
        assert_eq!(registry.unsubscribe_all(conn.id()), 1);
        assert_eq!(registry.subscriber_count(second), 0);
        assert_eq!(registry.publish(second, deleted()), PublishReport::default());
    }

    #[rstest]
    fn per_topic_order_is_preserved() {
        let registry = TopicRegistry::new();
        let list = ListId::random();
        let (conn, mut rx) = LiveConnection::open(16);
        registry.subscribe(&conn, list);

        let ids: Vec<_> = (0..5).map(|_| ItemId::random()).collect();
        for id in &ids {
            registry.publish(list, ListEvent::ItemDeleted { item_id: *id });
        }
        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|delivery| match delivery.event {
                ListEvent::ItemDeleted { item_id } => item_id,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(received, ids);
    }
}
