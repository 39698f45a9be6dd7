use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// State reported for a session that has not reported anything yet.
pub const DEFAULT_STATE: &str = "null";

/// Frames a session may have in flight before it counts as stalled.
pub const SESSION_QUEUE: usize = 16;

/// Outgoing half of one client connection. Frames are pre-serialized JSON
/// text shared between all recipients of a broadcast.
pub type SessionSender = mpsc::Sender<Arc<str>>;
pub type SessionReceiver = mpsc::Receiver<Arc<str>>;

/// Channel for one session, bounded at [`SESSION_QUEUE`] frames.
pub fn session_channel() -> (SessionSender, SessionReceiver) {
    mpsc::channel(SESSION_QUEUE)
}

/// Opaque handle for a registered session. Handles are never reused, so a
/// stale handle can only miss; it cannot reach a newer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Session {
    id: SessionId,
    state: String,
    sender: SessionSender,
    connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Members {
    next_id: u64,
    /// Connection order; the last element is the most recent connection.
    sessions: Vec<Session>,
}

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub state: String,
    pub connected_at: DateTime<Utc>,
}

/// Membership list of connected playback clients.
///
/// Every mutation takes the one lock, and the lock is never held across an
/// `.await` or a send, so connects are not held up by slow broadcasts.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    members: Mutex<Members>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, sender: SessionSender) -> SessionId {
        let mut members = self.lock();
        let id = SessionId(members.next_id);
        members.next_id += 1;
        members.sessions.push(Session {
            id,
            state: DEFAULT_STATE.to_string(),
            sender,
            connected_at: Utc::now(),
        });
        tracing::info!("Client {} connected. Total connections: {}", id, members.sessions.len());
        id
    }

    /// Remove a session. Returns false if it was already gone; calling this
    /// twice is harmless.
    pub fn unregister(&self, id: SessionId) -> bool {
        let mut members = self.lock();
        let Some(pos) = members.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        members.sessions.remove(pos);
        tracing::info!("Client {} disconnected. Total connections: {}", id, members.sessions.len());
        true
    }

    /// Record the last state a client reported. Unknown handles are ignored:
    /// a state report can race with the disconnect of its own session.
    pub fn update_state(&self, id: SessionId, state: impl Into<String>) -> bool {
        let mut members = self.lock();
        match members.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.state = state.into();
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().sessions.iter().any(|s| s.id == id)
    }

    /// `(handle, last state)` for every session, in connection order.
    pub fn iterate(&self) -> Vec<(SessionId, String)> {
        self.lock()
            .sessions
            .iter()
            .map(|s| (s.id, s.state.clone()))
            .collect()
    }

    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.lock()
            .sessions
            .iter()
            .map(|s| SessionInfo {
                id: s.id,
                state: s.state.clone(),
                connected_at: s.connected_at,
            })
            .collect()
    }

    /// Last reported state of the most recently connected session, or
    /// [`DEFAULT_STATE`] when nothing is connected. This describes one
    /// client, not an agreement across all of them.
    pub fn latest_state(&self) -> String {
        self.lock()
            .sessions
            .last()
            .map(|s| s.state.clone())
            .unwrap_or_else(|| DEFAULT_STATE.to_string())
    }

    /// Copy of the current membership for fan-out. Sessions registered after
    /// this call are not part of the snapshot.
    pub(crate) fn snapshot(&self) -> Vec<(SessionId, SessionSender)> {
        self.lock()
            .sessions
            .iter()
            .map(|s| (s.id, s.sender.clone()))
            .collect()
    }
}
