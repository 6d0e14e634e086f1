//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{CloseReason, MAX_FRAME_BYTES, Outbound},
    infrastructure::dto::websocket::decode_client_command,
    ui::state::AppState,
    usecase::{FrameVerdict, SessionHandler},
};

/// How long queued frames may take to flush once the receive side has finished.
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    // Oversize frames must reach the session so it can answer with 1009 itself.
    let ws = ws.max_message_size(2 * MAX_FRAME_BYTES);

    if !state.config.is_origin_allowed(origin.as_deref()) {
        tracing::warn!("Rejected WebSocket from origin {:?}", origin);
        return ws.on_upgrade(reject_socket);
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn reject_socket(mut socket: WebSocket) {
    let reason = CloseReason::OriginNotAllowed;
    if let Err(e) = socket.send(close_message(reason)).await {
        tracing::debug!("Failed to send close to rejected socket: {}", e);
    }
}

fn close_message(reason: CloseReason) -> Message {
    Message::Close(Some(CloseFrame {
        code: reason.code(),
        reason: reason.to_string().into(),
    }))
}

/// Spawns a task that drains the connection's outbound channel into the WebSocket sink.
///
/// The task ends after writing a close frame, when the channel is dropped, or when
/// the socket refuses a write.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close(reason) => {
                    let _ = sender.send(close_message(reason)).await;
                    break;
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive outbound frames
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_participant_usecase.execute(tx).await;
    tracing::info!("Connection {} opened", connection_id);

    let mut send_task = pusher_loop(rx, sender);

    let mut session = SessionHandler::new(connection_id, state.protocol_usecases.clone());
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on connection {}: {}", connection_id, e);
                    break;
                }
            };

            let text = match msg {
                Message::Text(text) => {
                    if let FrameVerdict::Close(_) = session.admit(text.len()).await {
                        break;
                    }
                    text.to_string()
                }
                Message::Binary(data) => {
                    if let FrameVerdict::Close(_) = session.admit(data.len()).await {
                        break;
                    }
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            tracing::debug!(
                                "Dropped non UTF-8 binary frame from connection {}",
                                connection_id
                            );
                            continue;
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::debug!("Connection {} requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => continue,
            };

            match decode_client_command(&text) {
                Ok(command) => session.dispatch(command).await,
                Err(e) => {
                    tracing::debug!("Dropped frame from connection {}: {}", connection_id, e);
                }
            }
        }
        session.close();
    });

    // If any one of the tasks completes, wind down the other
    tokio::select! {
        _ = &mut recv_task => {
            // Unregistering drops the channel sender, so the pusher loop ends after
            // flushing whatever is already queued.
            state
                .disconnect_participant_usecase
                .execute(&connection_id)
                .await;
            if tokio::time::timeout(SEND_DRAIN_TIMEOUT, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
            state
                .disconnect_participant_usecase
                .execute(&connection_id)
                .await;
        }
    };

    tracing::info!("Connection {} closed", connection_id);
}
