//! On-disk copies of a [`CatalogIndex`], so startup can skip the full scan.
//!
//! A snapshot is a JSON document tagged with a format name and version.
//! Anything that does not match the current version is rejected and the
//! caller falls back to a rescan. Deleting the file is always safe.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::index::{CatalogIndex, MediaEntry};
use crate::media::mime::MediaKind;

const SNAPSHOT_FORMAT: &str = "cuecast-catalog";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Format(#[from] serde_json::Error),
    #[error("unsupported snapshot format {format:?} version {version}")]
    VersionMismatch { format: String, version: u32 },
    #[error("snapshot holds {found} entries, expected {expected}")]
    KindMismatch { found: MediaKind, expected: MediaKind },
    #[error("snapshot was taken from another root: {}", .0.display())]
    RootMismatch(PathBuf),
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    format: String,
    version: u32,
    kind: MediaKind,
    root: PathBuf,
    saved_at: DateTime<Utc>,
    entries: Vec<SnapshotEntry>,
    folders: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    stem: String,
    path: PathBuf,
}

/// Default snapshot location for `kind` inside `dir`.
pub fn snapshot_path(dir: &Path, kind: MediaKind) -> PathBuf {
    dir.join(format!("{}_catalog.json", kind.as_str()))
}

/// Write `index` to `path`, replacing any previous snapshot. The file is
/// written next to its destination and renamed into place, so a crash never
/// leaves a half-written snapshot behind.
pub fn save(index: &CatalogIndex, path: &Path) -> Result<(), SnapshotError> {
    let file = SnapshotFile {
        format: SNAPSHOT_FORMAT.to_string(),
        version: SNAPSHOT_VERSION,
        kind: index.kind(),
        root: index.root().to_owned(),
        saved_at: Utc::now(),
        entries: index
            .entries()
            .iter()
            .map(|e| SnapshotEntry {
                stem: e.stem.clone(),
                path: e.path.clone(),
            })
            .collect(),
        folders: index.folders().iter().cloned().collect(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec(&file)?)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!("Saved {} snapshot ({} entries) to {}", index.kind(), index.len(), path.display());
    Ok(())
}

/// Read a snapshot written by [`save`] and verify it holds `expected` entries.
pub fn load(path: &Path, expected: MediaKind) -> Result<CatalogIndex, SnapshotError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SnapshotError::NotFound(path.to_owned()));
        }
        Err(e) => return Err(e.into()),
    };
    let file: SnapshotFile = serde_json::from_slice(&bytes)?;

    if file.format != SNAPSHOT_FORMAT || file.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            format: file.format,
            version: file.version,
        });
    }
    if file.kind != expected {
        return Err(SnapshotError::KindMismatch {
            found: file.kind,
            expected,
        });
    }

    let mut index = CatalogIndex::new(file.kind, file.root);
    for entry in file.entries {
        index.insert(MediaEntry::new(entry.stem, entry.path, file.kind));
    }
    for folder in file.folders {
        index.insert_folder(folder);
    }
    tracing::debug!(
        "Loaded {} snapshot ({} entries, saved {}) from {}",
        expected,
        index.len(),
        file.saved_at,
        path.display()
    );
    Ok(index)
}
