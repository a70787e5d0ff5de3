//! Websocket endpoint driving the story pipeline.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use storygen_error::StorygenResult;
use storygen_story::{ClientMessage, MessageSink, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::AppState;

/// Error sent when a story is requested but no pipeline is available.
pub const NOT_INITIALIZED_MESSAGE: &str = "Agent runners not properly initialized";

/// Outbound messages buffered per connection.
const OUTBOUND_BUFFER: usize = 32;

/// `GET /ws/{user_id}`: upgrade to a websocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Serve one connection.
///
/// A spawned task forwards queued [`ServerMessage`]s to the socket while
/// this task reads client frames and runs requests in arrival order.
#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, user_id: String, state: AppState) {
    info!("Client connected");
    let (mut sink, mut stream) = socket.split();
    let (mut outbound, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to encode server message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!("Websocket sink closed");
                break;
            }
        }
    });

    if MessageSink::send(&mut outbound, ServerMessage::connected())
        .await
        .is_ok()
    {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if let Err(e) = handle_text(text.as_str(), &user_id, &state, &mut outbound).await {
                        debug!(error = %e, "Outbound channel closed");
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "Websocket receive error");
                    break;
                }
            }
        }
    }

    // Let queued messages drain before the socket is dropped
    drop(outbound);
    if let Err(e) = send_task.await {
        warn!(error = %e, "Websocket sender task failed");
    }
    info!("Client disconnected");
}

async fn handle_text(
    text: &str,
    user_id: &str,
    state: &AppState,
    outbound: &mut mpsc::Sender<ServerMessage>,
) -> StorygenResult<()> {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Malformed client message");
            return MessageSink::send(outbound, ServerMessage::error(format!("Invalid message: {}", e))).await;
        }
    };

    match message {
        ClientMessage::GenerateStory { data } => {
            MessageSink::send(outbound, ServerMessage::processing()).await?;
            match &state.pipeline {
                Some(pipeline) => pipeline.run(user_id, &data, outbound).await?,
                None => {
                    error!("Story requested but no pipeline is configured");
                    MessageSink::send(outbound, ServerMessage::error(NOT_INITIALIZED_MESSAGE)).await?;
                }
            }
        }
        ClientMessage::Ping => MessageSink::send(outbound, ServerMessage::Pong).await?,
        ClientMessage::Unknown(kind) => {
            warn!(message_type = ?kind, "Unknown message type");
        }
    }

    Ok(())
}
