use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::media::index::{CatalogIndex, MediaEntry};
use crate::media::mime::MediaKind;

/// Statistics collected during one scan, for the summary line and for
/// callers that report rebuild results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// Distinct stems in the resulting index.
    pub indexed: usize,
    /// Files whose stem collided with an earlier file (later one kept).
    pub replaced: usize,
    /// Files and folders skipped by the exclusion rules.
    pub excluded: usize,
    /// Unreadable entries and broken links that were skipped.
    pub skipped: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug)]
pub struct ScanOutput {
    pub index: CatalogIndex,
    pub stats: ScanStats,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog root does not exist: {}", .0.display())]
    RootMissing(PathBuf),
    #[error("catalog root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// True when any exclusion substring occurs in the path.
pub fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let text = path.to_string_lossy();
    exclude.iter().any(|needle| !needle.is_empty() && text.contains(needle.as_str()))
}

/// Walk `root` recursively (following symlinks) and index every file whose
/// extension is on `kind`'s allow-list. Entry paths are `root` joined with
/// the names found on the way down; links are not resolved.
///
/// Only a missing or non-directory root is an error. Unreadable subtrees are
/// logged and skipped; the rest of the tree is still indexed.
pub fn build(root: &Path, kind: MediaKind, exclude: &[String]) -> Result<ScanOutput, CatalogError> {
    if !root.exists() {
        return Err(CatalogError::RootMissing(root.to_owned()));
    }
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_owned()));
    }

    let start = Instant::now();
    let mut index = CatalogIndex::new(kind, root);
    let mut stats = ScanStats::default();
    let mut excluded = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if is_excluded(entry.path(), exclude) {
                excluded += 1;
                tracing::debug!("Excluded from catalog: {}", entry.path().display());
                return false;
            }
            true
        });

    for entry in walker {
        match entry {
            Err(e) => {
                tracing::warn!("Skipping unreadable entry during {} scan: {}", kind, e);
                stats.skipped += 1;
            }
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                if !kind.accepts(path) {
                    continue;
                }
                let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                tracing::debug!("indexed {} -> {}", stem, path.display());
                if let Some(old) = index.insert(MediaEntry::new(stem, path, kind)) {
                    tracing::debug!("{} replaced by a later file with the same name", old.path.display());
                    stats.replaced += 1;
                }
            }
            Ok(_) => {} // directories: walkdir handles recursion
        }
    }

    stats.excluded = excluded;
    stats.indexed = index.len();
    stats.elapsed_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Indexed {} {} files across {} folders in {:.1}s ({} skipped, {} excluded)",
        stats.indexed,
        kind,
        index.folders().len(),
        stats.elapsed_secs,
        stats.skipped,
        stats.excluded
    );
    log_samples(&index);

    Ok(ScanOutput { index, stats })
}

fn log_samples(index: &CatalogIndex) {
    let folders: Vec<&str> = index.folders().iter().take(5).map(String::as_str).collect();
    let more = if index.folders().len() > folders.len() { ", ..." } else { "" };
    tracing::debug!("Sample folders: {}{}", folders.join(", "), more);

    let mut stems: Vec<&str> = index.entries().iter().map(|e| e.stem.as_str()).collect();
    stems.sort_unstable();
    let more = if stems.len() > 10 { ", ..." } else { "" };
    stems.truncate(10);
    tracing::debug!("Sample names: {}{}", stems.join(", "), more);
}
