//! Change events pushed to list topic subscribers and the live connection
//! handle that receives them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;

use super::item::{ItemId, ItemView};
use super::list::ListId;

/// Committed change to a list, carrying the canonical post-mutation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ListEvent {
    ItemAdded(ItemView),
    ItemDeleted {
        #[serde(rename = "itemId")]
        item_id: ItemId,
    },
    ItemUpdated(ItemView),
}

impl ListEvent {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ItemAdded(_) => "itemAdded",
            Self::ItemDeleted { .. } => "itemDeleted",
            Self::ItemUpdated(_) => "itemUpdated",
        }
    }
}

/// Event as delivered to one connection's outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEvent {
    pub list_id: ListId,
    pub event: ListEvent,
}

/// Process-unique identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of a live connection's bounded outbox.
///
/// The transport adapter owns the receiving half and drains it into the
/// socket; the fan-out registry only ever uses non-blocking sends.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    id: ConnectionId,
    outbox: mpsc::Sender<TopicEvent>,
}

impl LiveConnection {
    /// Open a connection with an outbox holding at most `capacity` events.
    ///
    /// # Examples
    /// ```
    /// use synclist::domain::LiveConnection;
    ///
    /// let (connection, receiver) = LiveConnection::open(8);
    /// assert!(!connection.is_closed());
    /// drop(receiver);
    /// assert!(connection.is_closed());
    /// ```
    pub fn open(capacity: usize) -> (Self, mpsc::Receiver<TopicEvent>) {
        let (outbox, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::next(),
                outbox,
            },
            receiver,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn outbox(&self) -> &mpsc::Sender<TopicEvent> {
        &self.outbox
    }

    /// Whether the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}
