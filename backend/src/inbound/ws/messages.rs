//! Wire-level frame definitions for the WebSocket adapter.
//!
//! Client frames carry the list id as a raw string so a malformed id can be
//! answered with an `error` frame rather than a protocol close.

use serde::{Deserialize, Serialize};

use crate::domain::{Error, ErrorCode, ListEvent, ListId, TopicEvent};

/// Inbound frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    Subscribe {
        #[serde(rename = "listId")]
        list_id: String,
    },
    Unsubscribe {
        #[serde(rename = "listId")]
        list_id: String,
    },
}

/// Outbound frame pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    Subscribed {
        #[serde(rename = "listId")]
        list_id: ListId,
    },
    Unsubscribed {
        #[serde(rename = "listId")]
        list_id: ListId,
    },
    Event {
        #[serde(rename = "listId")]
        list_id: ListId,
        #[serde(flatten)]
        event: ListEvent,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl From<TopicEvent> for ServerFrame {
    fn from(value: TopicEvent) -> Self {
        Self::Event {
            list_id: value.list_id,
            event: value.event,
        }
    }
}

impl From<&Error> for ServerFrame {
    fn from(error: &Error) -> Self {
        let message = match error.code() {
            ErrorCode::InternalError => "Internal server error".to_owned(),
            _ => error.message().to_owned(),
        };
        Self::Error {
            code: error.code(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use serde_json::{Value, json};

    #[test]
    fn parses_subscribe_frames() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"subscribe","listId":"abc"}"#).expect("parses");
        assert_eq!(
            frame,
            ClientFrame::Subscribe {
                list_id: "abc".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_frame_types() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"publish","listId":"x"}"#).is_err());
    }

    #[test]
    fn event_frames_flatten_the_list_event() {
        let list_id = ListId::random();
        let item_id = ItemId::random();
        let frame = ServerFrame::from(TopicEvent {
            list_id,
            event: ListEvent::ItemDeleted { item_id },
        });
        let value = serde_json::to_value(frame).expect("serialises");
        assert_eq!(
            value,
            json!({
                "type": "event",
                "listId": list_id.to_string(),
                "event": "itemDeleted",
                "payload": {"itemId": item_id.to_string()},
            })
        );
    }

    #[test]
    fn internal_errors_are_redacted() {
        let frame = ServerFrame::from(&Error::internal("pool exploded"));
        let value = serde_json::to_value(frame).expect("serialises");
        assert_eq!(value.get("code"), Some(&Value::from("internal_error")));
        assert_eq!(
            value.get("message"),
            Some(&Value::from("Internal server error"))
        );
    }
}
