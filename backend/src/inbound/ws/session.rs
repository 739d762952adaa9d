//! Per-connection WebSocket handler.
//!
//! Each connection owns a bounded outbox registered with the topic fan-out.
//! The session loop multiplexes heartbeats, client frames and outbox events.
//! The public contract pings every 5s and considers a connection idle after
//! 10s without client traffic; tests shorten both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::{ListQuery, TopicSubscriptions};
use crate::domain::{Error, ListId, LiveConnection, TopicEvent, UserId};
use crate::inbound::ws::messages::{ClientFrame, ServerFrame};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Ports and identity a session needs.
pub(super) struct SessionDeps {
    pub user: UserId,
    pub lists: Arc<dyn ListQuery>,
    pub topics: Arc<dyn TopicSubscriptions>,
    pub outbox_capacity: usize,
}

pub(super) async fn handle_ws_session(deps: SessionDeps, session: Session, stream: MessageStream) {
    let (connection, outbox) = LiveConnection::open(deps.outbox_capacity);
    let ws = WsSession {
        user: deps.user,
        lists: deps.lists,
        topics: deps.topics,
        connection,
    };
    info!(connection = %ws.connection.id(), user_id = %ws.user, "live connection opened");
    ws.run(session, stream, outbox).await;
    let released = ws.topics.unsubscribe_all(ws.connection.id());
    info!(connection = %ws.connection.id(), released, "live connection closed");
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    user: UserId,
    lists: Arc<dyn ListQuery>,
    topics: Arc<dyn TopicSubscriptions>,
    connection: LiveConnection,
}

impl WsSession {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut outbox: mpsc::Receiver<TopicEvent>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                event = outbox.recv() => match event {
                    Some(event) => send_frame(&mut session, &ServerFrame::from(event))
                        .await
                        .map_err(SessionError::Network),
                    None => Err(SessionError::StreamClosed),
                },
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                let close_action = close_action_for(error);
                close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, "rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        let reply = match frame {
            ClientFrame::Subscribe { list_id } => self.subscribe(&list_id).await,
            ClientFrame::Unsubscribe { list_id } => self.unsubscribe(&list_id),
        };
        let reply = reply.unwrap_or_else(|error| ServerFrame::from(&error));
        send_frame(session, &reply)
            .await
            .map_err(SessionError::Network)
    }

    async fn subscribe(&self, raw: &str) -> Result<ServerFrame, Error> {
        let list_id = parse_list_id(raw)?;
        self.lists.ensure_viewer(list_id, self.user).await?;
        if self.topics.subscribe(&self.connection, list_id) {
            debug!(connection = %self.connection.id(), list_id = %list_id, "subscribed");
        }
        Ok(ServerFrame::Subscribed { list_id })
    }

    fn unsubscribe(&self, raw: &str) -> Result<ServerFrame, Error> {
        let list_id = parse_list_id(raw)?;
        if self.topics.unsubscribe(self.connection.id(), list_id) {
            debug!(connection = %self.connection.id(), list_id = %list_id, "unsubscribed");
        }
        Ok(ServerFrame::Unsubscribed { list_id })
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        let connection = self.connection.id();
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(%connection, "WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(%connection, error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(%connection, error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }
}

fn parse_list_id(raw: &str) -> Result<ListId, Error> {
    ListId::new(raw).map_err(|_| {
        Error::invalid_request("listId must be a valid UUID")
            .with_details(serde_json::json!({ "field": "listId", "value": raw }))
    })
}

async fn send_frame(session: &mut Session, frame: &ServerFrame) -> Result<(), Closed> {
    match serde_json::to_string(frame) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialize WebSocket frame");
            Ok(())
        }
    }
}

fn close_action_for(error: SessionError) -> CloseAction {
    match error {
        SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Policy,
            description: Some("invalid payload".to_owned()),
        })),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, close_action: CloseAction) {
    if let CloseAction::Close(reason) = close_action {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "failed to close WebSocket session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
