use std::ops::ControlFlow;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use runtime::SessionEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::state::AppState;

pub async fn events_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe at upgrade time so nothing published after `connected` is missed.
    let events = state.subscribe_events();
    ws.on_upgrade(move |socket| forward_session_events(socket, events))
}

async fn forward_session_events(
    mut socket: WebSocket,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    if push(&mut socket, &SessionEvent::Connected).await.is_break() {
        return;
    }
    debug!("event subscriber connected");

    loop {
        let step = tokio::select! {
            inbound = socket.recv() => client_frame(inbound),
            received = events.recv() => match received {
                Ok(event) => push(&mut socket, &event).await,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event subscriber lagged; skipping ahead");
                    ControlFlow::Continue(())
                }
                Err(RecvError::Closed) => {
                    let _ = socket.send(Message::Close(None)).await;
                    ControlFlow::Break(())
                }
            },
        };
        if step.is_break() {
            break;
        }
    }
    debug!("event subscriber disconnected");
}

/// Inbound frames are ignored apart from close and transport errors.
fn client_frame(frame: Option<Result<Message, axum::Error>>) -> ControlFlow<()> {
    match frame {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => ControlFlow::Break(()),
        Some(Ok(_)) => ControlFlow::Continue(()),
    }
}

async fn push(socket: &mut WebSocket, event: &SessionEvent) -> ControlFlow<()> {
    let Ok(payload) = serde_json::to_string(event) else {
        return ControlFlow::Continue(());
    };
    match socket.send(Message::Text(payload)).await {
        Ok(()) => ControlFlow::Continue(()),
        Err(_) => ControlFlow::Break(()),
    }
}
