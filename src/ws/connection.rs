//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming actions and forwarding subscribed events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{WsAction, WsMessage, WsMessageType};
use super::subscription::TopicSubscriptions;
use crate::app_state::AppState;
use crate::domain::{BridgeEvent, Topic};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads actions from the client and dispatches them.
/// - Forwards events for subscribed topics from the bus to the client.
///
/// The connection starts with no subscriptions; the client opts into
/// topics explicitly. All bus subscriptions are revoked when the loop
/// exits, whichever side closed first.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (forward_tx, mut forward_rx) = mpsc::unbounded_channel::<(Topic, BridgeEvent)>();
    let mut subs = TopicSubscriptions::new(state.bus.clone(), forward_tx);

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &state).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Event forwarded from a bus subscription
            forwarded = forward_rx.recv() => {
                let Some((topic, event)) = forwarded else { break };
                let msg = WsMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    msg_type: WsMessageType::Event,
                    timestamp: chrono::Utc::now(),
                    payload: serde_json::json!({
                        "topic": topic,
                        "event": event,
                    }),
                };
                let json = serde_json::to_string(&msg).unwrap_or_default();
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    subs: &mut TopicSubscriptions,
    state: &AppState,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return error_message(String::new(), 400, "malformed JSON");
    };

    let action = match serde_json::from_value::<WsAction>(msg.payload.clone()) {
        Ok(action) => action,
        Err(e) => {
            return error_message(msg.id, 400, &format!("unknown action: {e}"));
        }
    };

    let payload = match action {
        WsAction::Subscribe { topics } => {
            subs.subscribe(&topics);
            serde_json::json!({
                "subscribed": subs.topics(),
                "count": subs.count(),
            })
        }
        WsAction::Unsubscribe { topics } => {
            subs.unsubscribe(&topics);
            serde_json::json!({
                "unsubscribed": topics,
                "remaining_count": subs.count(),
            })
        }
        WsAction::Control {
            device_id,
            command,
            params,
        } => {
            let outcome = state.control.send_control(device_id, command, params).await;
            serde_json::to_value(&outcome).unwrap_or_default()
        }
        WsAction::GetStatus { device_id } => match device_id {
            Some(id) => match state.store.current_status(id) {
                Some(status) => serde_json::json!({ "device": status }),
                None => {
                    return error_message(msg.id, 404, &format!("device not found: {id}"));
                }
            },
            None => serde_json::json!({ "devices": state.store.snapshot() }),
        },
    };

    let response = WsMessage {
        id: msg.id,
        msg_type: WsMessageType::Response,
        timestamp: chrono::Utc::now(),
        payload,
    };
    serde_json::to_string(&response).ok()
}

fn error_message(id: String, code: u32, message: &str) -> Option<String> {
    let err = WsMessage {
        id,
        msg_type: WsMessageType::Error,
        timestamp: chrono::Utc::now(),
        payload: serde_json::json!({
            "code": code,
            "message": message,
        }),
    };
    serde_json::to_string(&err).ok()
}
