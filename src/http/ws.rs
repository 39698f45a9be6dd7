use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::http::state::AppState;
use crate::session::message::ClientMessage;
use crate::session::registry::{session_channel, SessionRegistry, DEFAULT_STATE};

/// GET /ws: playback client connection.
pub async fn client_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let registry = Arc::clone(state.dispatcher.registry());
    ws.on_upgrade(move |socket: WebSocket| {
        let (sink, stream) = socket.split();
        run_session(sink, stream, registry)
    })
}

/// Register the connection, forward broadcast frames to `sink`, and record
/// the state reports read from `stream`. The session is unregistered when
/// either direction ends.
pub async fn run_session<W, R, E>(mut sink: W, mut stream: R, registry: Arc<SessionRegistry>)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    let (tx, mut rx) = session_channel();
    let id = registry.register(tx);

    let writer = async {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.as_ref().into())).await {
                tracing::warn!("Send to client {} failed: {}", id, e);
                break;
            }
        }
    };

    let reader = async {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match ClientMessage::parse(text.as_str()) {
                    Some(ClientMessage::MediaState { state }) => {
                        let state = state.unwrap_or_else(|| DEFAULT_STATE.to_string());
                        tracing::debug!("Client {} reports state {}", id, state);
                        registry.update_state(id, state);
                    }
                    None => tracing::debug!("Ignoring message from client {}", id),
                },
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {} // ping/pong and binary frames
            }
        }
    };

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    registry.unregister(id);
}
