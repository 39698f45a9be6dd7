use std::path::PathBuf;

use crate::media::mime::MediaKind;

/// Why a command could not be turned into playback. Every variant is a
/// normal outcome that is reported back to whoever issued the command;
/// none of them is fatal to the process.
///
/// Failed sends during fan-out are not errors: the broadcast still counts as
/// delivered and the failing sessions are pruned (see
/// [`BroadcastReport`](crate::session::broadcast::BroadcastReport)).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// The catalog for this kind has no entries yet (first scan still
    /// running, or nothing on disk).
    #[error("{kind} catalog is not loaded yet")]
    NotReady { kind: MediaKind },

    /// The catalog is populated but the best candidate scored below the
    /// confidence threshold. `suggestion` names that best candidate.
    #[error("no {kind} matched {query:?} closely enough")]
    NoMatch {
        kind: MediaKind,
        query: String,
        suggestion: Option<String>,
    },

    /// The resolved file was removed after the catalog was built.
    #[error("{} no longer exists on disk", .path.display())]
    Stale { path: PathBuf },

    /// Nothing was connected when the directive went out.
    #[error("no playback clients are connected")]
    Unreachable,

    #[error("{0}")]
    InvalidArgument(String),
}
