use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::protocol::{WsIncomingMessage, WsOutgoingMessage};
use crate::core::errors::ApiError;
use crate::pipeline::TraceStep;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<WsIncomingMessage, String>>();

    tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let parsed = serde_json::from_str::<WsIncomingMessage>(&text)
                        .map_err(|e| format!("Invalid message: {}", e));
                    if tx.send(parsed).is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    while let Some(incoming) = rx.recv().await {
        let result = match incoming {
            Ok(data) => handle_message(&mut sender, &state, data).await,
            Err(message) => Err(ApiError::BadRequest(message)),
        };
        if let Err(err) = result {
            tracing::warn!("WebSocket request failed: {}", err);
            let payload = WsOutgoingMessage::Error {
                message: err.to_string(),
            };
            if send_message(&mut sender, &payload).await.is_err() {
                break;
            }
        }
    }
}

async fn handle_message(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &Arc<AppState>,
    data: WsIncomingMessage,
) -> Result<(), ApiError> {
    let msg_type = data.msg_type.as_deref().unwrap_or("ask");
    if msg_type != "ask" {
        return Err(ApiError::BadRequest(format!(
            "Unknown message type: {}",
            msg_type
        )));
    }

    let question = data
        .question()
        .ok_or_else(|| ApiError::BadRequest("Question must not be empty".to_string()))?
        .to_string();
    let strategy = data
        .strategy
        .unwrap_or(state.settings.server.default_strategy);
    let session_id = data.session_id.clone();

    let (trace_tx, mut trace_rx) = mpsc::unbounded_channel::<TraceStep>();
    let pipeline = state.pipeline.clone();
    let run = tokio::spawn(async move {
        pipeline
            .run(&question, strategy, session_id.as_deref(), Some(trace_tx))
            .await
    });

    // Ends once the run drops its trace sender.
    while let Some(step) = trace_rx.recv().await {
        send_message(sender, &WsOutgoingMessage::thought(step)).await?;
    }

    let outcome = run.await.map_err(ApiError::internal)??;

    send_message(
        sender,
        &WsOutgoingMessage::Answer {
            message: outcome.answer,
            strategy: outcome.strategy,
        },
    )
    .await?;
    send_message(sender, &WsOutgoingMessage::Done).await
}

pub async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: &WsOutgoingMessage,
) -> Result<(), ApiError> {
    let text = serde_json::to_string(payload).map_err(ApiError::internal)?;
    sender
        .send(Message::Text(text))
        .await
        .map_err(ApiError::internal)?;
    Ok(())
}
