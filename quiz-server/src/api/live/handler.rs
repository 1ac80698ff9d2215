//! Live session handler

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::{ClientMessage, ServerMessage};
use tokio::time::Duration;

use crate::core::ServerState;
use crate::delivery::{DeliveryEngine, DeliveryError};

const INVALID_ACK: &str = "Invalid ack: seq must be a positive number";
const ACK_FAILED: &str = "Failed to record ack";

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    #[serde(rename = "clientId")]
    client_id: Option<String>,
}

/// GET /ws?clientId=<id>
pub async fn handle_live_ws(
    State(state): State<ServerState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let client_id = query
        .client_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    ws.on_upgrade(move |socket| async move {
        match client_id {
            Some(client_id) => live_session(socket, state, client_id).await,
            None => reject_session(socket).await,
        }
    })
}

/// Report the missing client id, then close
async fn reject_session(mut socket: WebSocket) {
    tracing::warn!("Live connection without clientId rejected");
    let _ = send_message(&mut socket, &ServerMessage::error("clientId is required")).await;
    let _ = socket.send(Message::Close(None)).await;
}

async fn live_session(socket: WebSocket, state: ServerState, client_id: String) {
    let (mut sink, mut stream) = socket.split();
    let engine = state.engine.clone();

    let mut subscription = engine.subscribe(&client_id);
    let session_id = subscription.id();
    tracing::info!(client_id = %client_id, session_id, "Live session connected");

    // Registered for fanout before the client is told to reconcile
    let ready = ServerMessage::ready(session_id, engine.current_seq());
    if send_message(&mut sink, &ready).await.is_err() {
        engine.unsubscribe(session_id);
        return;
    }

    let mut ping_interval =
        tokio::time::interval(Duration::from_millis(state.config.ping_interval_ms.max(1)));
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            pushed = subscription.recv() => {
                match pushed {
                    Some(question) => {
                        let msg = ServerMessage::Question((*question).clone());
                        if send_message(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    // Unregistered by fanout
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = process_client_message(&engine, &client_id, text.as_str())
                            && send_message(&mut sink, &reply).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(client_id = %client_id, session_id, error = %e, "Live socket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    engine.unsubscribe(session_id);
    tracing::info!(client_id = %client_id, session_id, "Live session disconnected");
}

/// Handle one inbound text frame
///
/// Returns the frame to send back, if any. A recorded ack produces no reply.
pub fn process_client_message(
    engine: &DeliveryEngine,
    client_id: &str,
    text: &str,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(client_id = %client_id, error = %e, "Unparseable live frame");
            return Some(ServerMessage::error(INVALID_ACK));
        }
    };

    match message {
        ClientMessage::Ack(payload) => {
            if payload.seq < 1 {
                return Some(ServerMessage::error(INVALID_ACK));
            }
            match engine.record_ack(client_id, payload.seq) {
                Ok(_) => None,
                Err(DeliveryError::InvalidInput(_)) => Some(ServerMessage::error(INVALID_ACK)),
                Err(e) => {
                    tracing::error!(client_id = %client_id, seq = payload.seq, error = %e, "Failed to record ack");
                    Some(ServerMessage::error(ACK_FAILED))
                }
            }
        }
    }
}

async fn send_message<S>(sink: &mut S, msg: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = msg.to_json().map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
