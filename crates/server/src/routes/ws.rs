//! WebSocket handler for live session updates.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use sandbox::SessionState;
use tracing::{debug, warn};
use uuid::Uuid;
use web_types::{WsClientMessage, WsServerMessage};

use super::not_found;
use crate::state::{AppState, SharedEditor};

/// GET /api/editors/:editor/ws - WebSocket upgrade for one editor.
///
/// Sits behind the origin guard like the rest of the API.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(editor): Path<Uuid>,
) -> Response {
    let Some(shared) = state.editor(editor).await else {
        return not_found(format!("Editor not found: {editor}")).into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, editor, shared))
}

/// Stream every state change of one editor's session to one client.
async fn handle_socket(socket: WebSocket, state: AppState, editor: Uuid, shared: SharedEditor) {
    let viewer = state.add_viewer(editor).await;
    let mut updates = shared.lock().await.controller().subscribe();
    let (mut sender, mut receiver) = socket.split();
    debug!(%viewer, %editor, "viewer connected");

    let current = updates.borrow_and_update().clone();
    if send_state(&mut sender, &state, editor, &current).await.is_ok() {
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = updates.borrow_and_update().clone();
                    if send_state(&mut sender, &state, editor, &current).await.is_err() {
                        break;
                    }
                }
                incoming = receiver.next() => {
                    let text = match incoming {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue,
                    };

                    let reply = handle_client_message(&state, editor, &text).await;
                    if let Some(reply) = reply
                        && send(&mut sender, &reply).await.is_err()
                    {
                        break;
                    }
                }
            }
        }
    }

    state.remove_viewer(viewer).await;
}

/// Act on one client message; returns an error reply when it is unusable.
async fn handle_client_message(
    state: &AppState,
    editor: Uuid,
    text: &str,
) -> Option<WsServerMessage> {
    let message: WsClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            return Some(WsServerMessage::Error {
                message: format!("Invalid message format: {e}"),
            });
        }
    };

    match message {
        WsClientMessage::Run(request) => match state.run(editor, request).await {
            Some(_) => None,
            None => Some(WsServerMessage::Error {
                message: "run did not start a session".to_string(),
            }),
        },
    }
}

async fn send_state(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    editor: Uuid,
    current: &SessionState,
) -> Result<(), axum::Error> {
    let view = state.session_view(editor, current).await;
    send(sender, &WsServerMessage::State(view)).await
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &WsServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "failed to encode message");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    const RUN_JSON: &str =
        r#"{"type":"Run","payload":{"buffers":{"markup":"<p>ws</p>","style":"","script":""}}}"#;

    #[tokio::test]
    async fn test_invalid_message_gets_error_reply() {
        let state = test_state();
        let editor = state.open_editor().await.unwrap();

        let reply = handle_client_message(&state, editor, "not json").await;

        assert!(matches!(reply, Some(WsServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn test_run_message_starts_session() {
        let state = test_state();
        let editor = state.open_editor().await.unwrap();
        let shared = state.editor(editor).await.unwrap();
        let mut updates = shared.lock().await.controller().subscribe();

        let reply = handle_client_message(&state, editor, RUN_JSON).await;

        assert!(reply.is_none());
        assert!(updates.has_changed().unwrap());
        let current = updates.borrow_and_update().clone();
        assert!(current.session().is_some());
    }

    #[tokio::test]
    async fn test_run_message_only_touches_its_editor() {
        let state = test_state();
        let editor = state.open_editor().await.unwrap();
        let other = state.open_editor().await.unwrap();
        let shared = state.editor(other).await.unwrap();
        let mut updates = shared.lock().await.controller().subscribe();

        handle_client_message(&state, editor, RUN_JSON).await;

        assert!(!updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().session().is_none());
    }

    #[tokio::test]
    async fn test_run_message_for_closed_editor() {
        let state = test_state();

        let reply = handle_client_message(&state, Uuid::new_v4(), RUN_JSON).await;

        assert!(matches!(reply, Some(WsServerMessage::Error { .. })));
    }
}
