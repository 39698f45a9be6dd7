use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;

use crate::session::message::{ControlCommand, PlaybackDirective};
use crate::session::registry::{SessionId, SessionRegistry};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BroadcastReport {
    /// Sessions that were members when the broadcast started, including
    /// any that failed. Answers "was anything listening", not "did every
    /// send succeed".
    pub clients_notified: usize,
    /// Sessions whose send failed; they have been unregistered.
    pub failed: Vec<SessionId>,
}

impl BroadcastReport {
    pub fn is_unreachable(&self) -> bool {
        self.clients_notified == 0
    }
}

/// Sends directives and commands to every connected session.
///
/// Delivery is best effort and at most once. A session whose send fails, or
/// whose queue is already full, is treated as disconnected and pruned; the
/// rest still receive the message.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn broadcast_play(&self, directive: &PlaybackDirective) -> BroadcastReport {
        let report = self.fan_out(&directive.to_json());
        tracing::info!(
            "Broadcasting {}: {} to {} clients",
            directive.kind,
            directive.media_url,
            report.clients_notified
        );
        report
    }

    pub fn broadcast_command(&self, command: ControlCommand) -> BroadcastReport {
        let report = self.fan_out(&command.to_json(Utc::now()));
        tracing::info!("Broadcasting {} to {} clients", command, report.clients_notified);
        report
    }

    fn fan_out(&self, payload: &Value) -> BroadcastReport {
        let members = self.registry.snapshot();
        if members.is_empty() {
            tracing::debug!("No clients connected, nothing to send");
            return BroadcastReport::default();
        }

        let frame: Arc<str> = Arc::from(payload.to_string());
        let mut failed = Vec::new();
        for (id, sender) in &members {
            match sender.try_send(Arc::clone(&frame)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Client {} is not keeping up, dropping it", id);
                    failed.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!("Client {} went away, dropping it", id);
                    failed.push(*id);
                }
            }
        }
        for id in &failed {
            self.registry.unregister(*id);
        }
        if !failed.is_empty() {
            tracing::warn!(
                "Delivered to {} of {} clients",
                members.len() - failed.len(),
                members.len()
            );
        }

        BroadcastReport {
            clients_notified: members.len(),
            failed,
        }
    }
}
