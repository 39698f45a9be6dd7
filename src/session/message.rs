use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::media::mime::MediaKind;

/// A "play this now" instruction. Clients render from the most recent
/// directive only; nothing is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackDirective {
    pub media_url: String,
    pub kind: MediaKind,
    /// Playback volume, 0.0 to 1.0.
    pub volume: f32,
    pub looped: bool,
    pub issued_at: DateTime<Utc>,
    /// Where the client can fetch tags for the file (audio only).
    pub metadata_url: Option<String>,
}

impl PlaybackDirective {
    pub fn new(media_url: impl Into<String>, kind: MediaKind, volume: f32, looped: bool) -> Self {
        Self {
            media_url: media_url.into(),
            kind,
            volume,
            looped,
            issued_at: Utc::now(),
            metadata_url: None,
        }
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = Some(url.into());
        self
    }

    /// Wire form sent to clients. Audio and video use distinct URL keys,
    /// which is how the browser client picks its player element.
    pub fn to_json(&self) -> Value {
        let timestamp = unix_seconds(self.issued_at);
        match self.kind {
            MediaKind::Audio => json!({
                "action": "play",
                "kind": self.kind,
                "audio_url": self.media_url,
                "volume": self.volume,
                "loop": self.looped,
                "timestamp": timestamp,
                "metadata": self.metadata_url,
            }),
            MediaKind::Video => json!({
                "action": "play",
                "kind": self.kind,
                "video_url": self.media_url,
                "volume": self.volume,
                "timestamp": timestamp,
            }),
        }
    }
}

/// Bare transport commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Pause,
    Stop,
}

impl ControlCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Stop => "stop",
        }
    }

    pub fn to_json(self, issued_at: DateTime<Utc>) -> Value {
        json!({
            "command": self.as_str(),
            "timestamp": unix_seconds(issued_at),
        })
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" => Ok(ControlCommand::Pause),
            "stop" => Ok(ControlCommand::Stop),
            other => Err(format!("unknown control command: {other}")),
        }
    }
}

/// Messages clients send up the socket. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    MediaState {
        #[serde(default)]
        state: Option<String>,
    },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Seconds since the Unix epoch with millisecond precision, the timestamp
/// format browser clients compare against.
pub fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
