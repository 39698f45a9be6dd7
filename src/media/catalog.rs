//! Both halves of the catalog, shared between request handlers.
//!
//! Each kind lives behind `RwLock<Arc<CatalogIndex>>`. Readers clone the
//! `Arc` under a short read lock and then work on that snapshot without any
//! lock held; a rebuild scans into a fresh index off-lock and swaps the `Arc`
//! in one write. A query therefore sees either the old or the new index in
//! full, never a mix.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::error::DispatchError;
use crate::media::index::CatalogIndex;
use crate::media::mime::MediaKind;
use crate::media::resolver::{self, MatchResult};
use crate::media::scanner::{self, CatalogError};
use crate::media::snapshot::{self, SnapshotError};

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub audio_root: PathBuf,
    pub video_root: PathBuf,
    /// Path substrings that exclude a file or folder from scanning.
    pub exclude: Vec<String>,
    /// Directory holding the per-kind snapshot files.
    pub snapshot_dir: PathBuf,
}

impl CatalogSettings {
    pub fn root(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Audio => &self.audio_root,
            MediaKind::Video => &self.video_root,
        }
    }

    pub fn snapshot_path(&self, kind: MediaKind) -> PathBuf {
        snapshot::snapshot_path(&self.snapshot_dir, kind)
    }
}

/// Where a freshly installed index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    Snapshot,
    Scan,
}

/// Result of rebuilding one kind.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub kind: MediaKind,
    pub source: IndexSource,
    pub before: usize,
    pub after: usize,
    pub skipped: usize,
    pub elapsed_secs: f64,
}

impl RebuildReport {
    /// Entries gained (negative when files were removed).
    pub fn added(&self) -> i64 {
        self.after as i64 - self.before as i64
    }
}

pub struct Catalog {
    settings: CatalogSettings,
    audio: RwLock<Arc<CatalogIndex>>,
    video: RwLock<Arc<CatalogIndex>>,
    /// Serializes rebuilds so the last swap reflects the last request.
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl Catalog {
    /// Empty catalog; queries report `NotReady` until an index is installed.
    pub fn new(settings: CatalogSettings) -> Self {
        let audio = CatalogIndex::new(MediaKind::Audio, &settings.audio_root);
        let video = CatalogIndex::new(MediaKind::Video, &settings.video_root);
        Self {
            settings,
            audio: RwLock::new(Arc::new(audio)),
            video: RwLock::new(Arc::new(video)),
            rebuild_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    fn slot(&self, kind: MediaKind) -> &RwLock<Arc<CatalogIndex>> {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    /// The current index for `kind`. Stays valid (and unchanged) even if a
    /// rebuild swaps in a new one afterwards.
    pub fn index(&self, kind: MediaKind) -> Arc<CatalogIndex> {
        let slot = self.slot(kind).read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Install `index` as the current index for its kind, returning the old one.
    pub fn replace(&self, index: CatalogIndex) -> Arc<CatalogIndex> {
        let mut slot = self.slot(index.kind()).write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, Arc::new(index))
    }

    pub fn len(&self, kind: MediaKind) -> usize {
        self.index(kind).len()
    }

    pub fn resolve(&self, kind: MediaKind, query: &str) -> Vec<MatchResult> {
        resolver::resolve(&self.index(kind), query)
    }

    pub fn pick(&self, kind: MediaKind, query: &str) -> Result<MatchResult, DispatchError> {
        resolver::pick(&self.index(kind), query)
    }

    /// Install an index for `kind` from its snapshot, or from a full scan when
    /// `force` is set or the snapshot is missing, stale or unreadable.
    /// A fresh scan rewrites the snapshot.
    ///
    /// Blocking: walks the filesystem. Run it on a blocking thread.
    pub fn load_or_build(&self, kind: MediaKind, force: bool) -> Result<RebuildReport, CatalogError> {
        let start = std::time::Instant::now();
        let before = self.len(kind);

        if !force {
            match self.load_snapshot(kind) {
                Ok(index) => {
                    let after = index.len();
                    tracing::info!("Loaded {} {} entries from snapshot", after, kind);
                    self.replace(index);
                    return Ok(RebuildReport {
                        kind,
                        source: IndexSource::Snapshot,
                        before,
                        after,
                        skipped: 0,
                        elapsed_secs: start.elapsed().as_secs_f64(),
                    });
                }
                Err(SnapshotError::NotFound(path)) => {
                    tracing::info!("No {} snapshot at {}, scanning", kind, path.display());
                }
                Err(e) => {
                    tracing::warn!("Ignoring {} snapshot: {}", kind, e);
                }
            }
        }

        let output = scanner::build(self.settings.root(kind), kind, &self.settings.exclude)?;
        let path = self.settings.snapshot_path(kind);
        if let Err(e) = snapshot::save(&output.index, &path) {
            tracing::warn!("Could not save {} snapshot to {}: {}", kind, path.display(), e);
        }

        let after = output.index.len();
        self.replace(output.index);
        Ok(RebuildReport {
            kind,
            source: IndexSource::Scan,
            before,
            after,
            skipped: output.stats.skipped,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn load_snapshot(&self, kind: MediaKind) -> Result<CatalogIndex, SnapshotError> {
        let index = snapshot::load(&self.settings.snapshot_path(kind), kind)?;
        if index.root() != self.settings.root(kind) {
            return Err(SnapshotError::RootMismatch(index.root().to_owned()));
        }
        Ok(index)
    }

    /// Rescan every kind in the background and swap each new index in when its
    /// scan completes. Queries keep using the old indexes meanwhile. A kind
    /// whose scan fails keeps its old index.
    pub async fn rebuild(self: &Arc<Self>) -> Vec<Result<RebuildReport, CatalogError>> {
        self.load_all(true).await
    }

    /// [`load_or_build`](Self::load_or_build) for every kind on the blocking
    /// pool. Concurrent calls run one after another.
    pub async fn load_all(self: &Arc<Self>, force: bool) -> Vec<Result<RebuildReport, CatalogError>> {
        let _guard = self.rebuild_lock.lock().await;
        let mut reports = Vec::with_capacity(MediaKind::ALL.len());
        for kind in MediaKind::ALL {
            let catalog = Arc::clone(self);
            let result = match tokio::task::spawn_blocking(move || catalog.load_or_build(kind, force)).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!("{} catalog task failed: {}", kind, e);
                    continue;
                }
            };
            match &result {
                Ok(report) => tracing::info!(
                    "{} catalog ready: {} -> {} entries in {:.1}s",
                    kind,
                    report.before,
                    report.after,
                    report.elapsed_secs
                ),
                Err(e) => tracing::warn!("{} catalog not updated, keeping old index: {}", kind, e),
            }
            reports.push(result);
        }
        reports
    }
}
