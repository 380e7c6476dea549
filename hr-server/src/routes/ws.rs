//! `GET /ws/{session_id}` — per-session streaming transport.
//! Selects over `hr-jobber::CallbackRouter`'s per-session channel (job
//! progress/completion) and `hr-stream::StreamRegistry`'s per-session
//! channel (LLM token chunks) and forwards whichever arrives first. The
//! `LLM.*` handlers only return the aggregate result today (a real vendor
//! gateway would drive the stream half by holding the `StreamHandle` this
//! connection registers), so in practice only the job-callback channel is
//! ever non-empty — the stream side is wired for when that changes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use hr_identity::SessionId;
use hr_jobber::CallbackEvent;
use hr_stream::StreamChunk;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
enum OutboundFrame {
    JobCallback(CallbackEvent),
    LlmStream(StreamChunk),
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state, SessionId::new(session_id)))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, session_id: SessionId) {
    let (cb_tx, mut cb_rx) = tokio::sync::mpsc::unbounded_channel();
    state.callbacks.register_session(session_id.clone(), cb_tx);
    let (_stream_handle, mut stream_rx) = state.streams.start(session_id.clone());

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // this transport is server -> client only; anything a client
                    // sends besides ping/pong/close is ignored.
                    Some(Ok(_)) => continue,
                }
            }
            Some(event) = cb_rx.recv() => {
                if send_frame(&mut socket, OutboundFrame::JobCallback(event)).await.is_err() {
                    break;
                }
            }
            Some(chunk) = stream_rx.recv() => {
                if send_frame(&mut socket, OutboundFrame::LlmStream(chunk)).await.is_err() {
                    break;
                }
            }
        }
    }

    state.callbacks.unregister_session(&session_id);
    state.streams.cancel(&session_id);
}

async fn send_frame(socket: &mut WebSocket, frame: OutboundFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_callback_frame_is_tagged() {
        let frame = OutboundFrame::JobCallback(CallbackEvent {
            job_id: "job1".to_string(),
            job_type: "payroll_calculate".to_string(),
            status: "completed".to_string(),
            payload: serde_json::json!({ "gross": 100 }),
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["channel"], "job_callback");
        assert_eq!(value["job_id"], "job1");
    }

    #[test]
    fn llm_stream_frame_is_tagged() {
        let frame = OutboundFrame::LlmStream(StreamChunk::text("hello", None));
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["channel"], "llm_stream");
    }
}
