//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::DustbinEvent;
use crate::service::NotificationService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers them.
/// - Forwards events from the [`broadcast::Receiver`] whose topic the
///   client subscribed to.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DustbinEvent>,
    notifications: Arc<NotificationService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &notifications).await;
                        if ws_tx.send(Message::text(reply.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if subs.matches(&event) {
                            let frame = WsMessage::event(&event).to_json();
                            if ws_tx.send(Message::text(frame)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Answers one text frame from the client.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    notifications: &NotificationService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command message");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { topics } => {
            let change = subs.subscribe(&topics);
            WsMessage::response(
                msg.id,
                serde_json::json!({
                    "subscribed": change.accepted,
                    "rejected": change.rejected,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { topics } => {
            let change = subs.unsubscribe(&topics);
            WsMessage::response(
                msg.id,
                serde_json::json!({
                    "unsubscribed": change.accepted,
                    "rejected": change.rejected,
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::UnreadCount => match notifications.unread_count().await {
            Ok(count) => WsMessage::response(msg.id, serde_json::json!({ "count": count })),
            Err(err) => {
                tracing::error!(error = %err, "ws unread count failed");
                WsMessage::error(msg.id, 500, "Internal server error")
            }
        },
        WsCommand::Ping => WsMessage::response(msg.id, serde_json::json!({ "pong": true })),
    }
}
