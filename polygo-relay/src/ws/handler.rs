use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;

use crate::AppState;
use crate::error::AppError;

const MAX_SESSION_LEN: usize = 64;

/// WebSocket upgrade handler: GET /ws/{session}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(session): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    validate_session(&session)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session)))
}

fn validate_session(session: &str) -> Result<(), AppError> {
    let valid = !session.is_empty()
        && session.len() <= MAX_SESSION_LEN
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid session id: {session}")))
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, session: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Create a channel for sending messages back to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let (peer_id, existing) = match state.registry.join(&session, tx).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::debug!("Rejected peer for session={session}: {e}");
            let msg = json!({"kind": "error", "message": e.to_string()}).to_string();
            let _ = ws_sink.send(Message::Text(msg.into())).await;
            let _ = ws_sink
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "session full".into(),
                })))
                .await;
            return;
        }
    };

    tracing::debug!("WebSocket joined: session={session} peer={peer_id}");

    let joined = json!({"kind": "player_joined", "player": peer_id}).to_string();
    state
        .registry
        .broadcast_except(&session, peer_id, &joined)
        .await;
    for other in existing {
        let msg = json!({"kind": "player_joined", "player": other}).to_string();
        state.registry.send_to(&session, peer_id, &msg).await;
    }

    // Spawn task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sink.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Game traffic is opaque: forward text frames as they are
    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            Message::Text(text) => {
                state
                    .registry
                    .broadcast_except(&session, peer_id, text.as_str())
                    .await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Cleanup
    let remaining = state.registry.leave(&session, peer_id).await;
    send_task.abort();

    if !remaining.is_empty() {
        let left = json!({"kind": "player_left", "player": peer_id, "at": Utc::now()}).to_string();
        state.registry.broadcast_except(&session, peer_id, &left).await;
    }

    tracing::debug!("WebSocket closed: session={session} peer={peer_id}");
}
