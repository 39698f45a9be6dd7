use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::Value;

use cuecast::http::ws::run_session;
use cuecast::session::broadcast::Broadcaster;
use cuecast::session::message::ControlCommand;
use cuecast::session::registry::{SessionRegistry, DEFAULT_STATE};

type Inbound = mpsc::UnboundedSender<Result<Message, axum::Error>>;

/// A session driven through in-memory channels instead of a socket.
fn open_session(
    registry: &Arc<SessionRegistry>,
) -> (Inbound, mpsc::UnboundedReceiver<Message>, tokio::task::JoinHandle<()>) {
    let (out_tx, out_rx) = mpsc::unbounded::<Message>();
    let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
    let task = tokio::spawn(run_session(out_tx, in_rx, Arc::clone(registry)));
    (in_tx, out_rx, task)
}

async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn text(json: &str) -> Result<Message, axum::Error> {
    Ok(Message::Text(json.into()))
}

#[tokio::test]
async fn connect_registers_and_close_unregisters() {
    let registry = Arc::new(SessionRegistry::new());
    let (inbound, _outbound, task) = open_session(&registry);
    eventually(|| registry.active_count() == 1).await;

    inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
    task.await.unwrap();
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn dropped_stream_unregisters() {
    let registry = Arc::new(SessionRegistry::new());
    let (inbound, _outbound, task) = open_session(&registry);
    eventually(|| registry.active_count() == 1).await;

    drop(inbound);
    task.await.unwrap();
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn media_state_reports_are_stored() {
    let registry = Arc::new(SessionRegistry::new());
    let (inbound, _outbound, _task) = open_session(&registry);
    eventually(|| registry.active_count() == 1).await;

    inbound.unbounded_send(text(r#"{"type":"media_state","state":"playing"}"#)).unwrap();
    eventually(|| registry.latest_state() == "playing").await;

    inbound.unbounded_send(text("not json at all")).unwrap();
    inbound.unbounded_send(text(r#"{"type":"media_state"}"#)).unwrap();
    eventually(|| registry.latest_state() == DEFAULT_STATE).await;
    assert_eq!(registry.active_count(), 1);
}

#[tokio::test]
async fn broadcast_frames_reach_the_socket() {
    let registry = Arc::new(SessionRegistry::new());
    let (_inbound, mut outbound, _task) = open_session(&registry);
    eventually(|| registry.active_count() == 1).await;

    let report = Broadcaster::new(Arc::clone(&registry)).broadcast_command(ControlCommand::Pause);
    assert_eq!(report.clients_notified, 1);

    let message = tokio::time::timeout(Duration::from_secs(1), outbound.next())
        .await
        .unwrap()
        .unwrap();
    let body = match message {
        Message::Text(body) => body,
        other => panic!("expected a text frame, got {other:?}"),
    };
    let frame: Value = serde_json::from_str(body.as_str()).unwrap();
    assert_eq!(frame["command"], "pause");
}

#[tokio::test]
async fn closed_socket_sink_ends_the_session() {
    let registry = Arc::new(SessionRegistry::new());
    let (_inbound, outbound, task) = open_session(&registry);
    eventually(|| registry.active_count() == 1).await;

    drop(outbound);
    Broadcaster::new(Arc::clone(&registry)).broadcast_command(ControlCommand::Stop);
    task.await.unwrap();
    assert_eq!(registry.active_count(), 0);
}
