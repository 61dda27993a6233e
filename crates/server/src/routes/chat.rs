use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_chat(socket, state))
}

/// One frame in, one frame out: each text frame carries a question as
/// `{"message": "..."}`; the reply is `{"type": "answer"|"error", ...}`.
async fn relay_chat(mut socket: WebSocket, state: AppState) {
    while let Some(Ok(frame)) = socket.recv().await {
        let Message::Text(payload) = frame else {
            continue;
        };

        let request: ChatRequest = match serde_json::from_str(payload.as_str()) {
            Ok(request) => request,
            Err(error) => {
                debug!(%error, "ignoring malformed chat frame");
                continue;
            }
        };

        let question = request.message.trim();
        if question.is_empty() {
            continue;
        }

        let corpus = state.corpus_snapshot().await;
        let reply = match state.answerer.answer(question, &corpus).await {
            Ok(answer) => ChatReply {
                kind: "answer",
                message: answer.text,
                sources: answer.sources,
            },
            Err(error) => {
                warn!(%error, "chat answer failed");
                ChatReply {
                    kind: "error",
                    message: format!("Error generating response: {error}"),
                    sources: Vec::new(),
                }
            }
        };

        let Ok(text) = serde_json::to_string(&reply) else {
            break;
        };
        if socket.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}
