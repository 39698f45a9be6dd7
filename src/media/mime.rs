use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which half of the catalog a file belongs to. Each kind is scanned from
/// its own root folder and resolved independently.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Audio, MediaKind::Video];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Extensions (lowercase, no dot) accepted when scanning a root of this kind.
    ///
    /// The sound folder historically held short `.mp4` clips as well, so the
    /// audio list keeps `mp4`; the player renders it audio-only.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &["ogg", "oga", "opus", "mp3", "wav", "flac", "m4a", "mp4"],
            MediaKind::Video => &["mp4", "m4v", "av1", "webm", "mkv", "mov"],
        }
    }

    /// True when `path` carries an extension on this kind's allow-list.
    /// Matching is case-insensitive.
    pub fn accepts(self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.extensions().contains(&ext.as_str())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" | "sound" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

/// MIME type used when serving a file over `/media`. Falls back to
/// `application/octet-stream` for anything unrecognized so that files outside
/// the allow-lists are still fetchable by URL.
pub fn mime_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" | "m4v" => "video/mp4",
        "av1" => "video/av1",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}
