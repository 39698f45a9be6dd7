use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::media::mime::MediaKind;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    /// File name without extension, as found on disk. Key within its kind.
    pub stem: String,
    /// Location of the file at scan time. May have disappeared since.
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaEntry {
    pub fn new(stem: impl Into<String>, path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            stem: stem.into(),
            path: path.into(),
            kind,
        }
    }
}

/// Flat stem -> entry mapping for a single media kind.
///
/// Iteration follows first-insertion order of each stem; re-inserting an
/// existing stem replaces its entry in place (last write wins). Subfolder
/// structure survives only in `folders`, which is diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogIndex {
    kind: MediaKind,
    root: PathBuf,
    entries: Vec<MediaEntry>,
    positions: HashMap<String, usize>,
    folders: BTreeSet<String>,
}

impl CatalogIndex {
    pub fn new(kind: MediaKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
            entries: Vec::new(),
            positions: HashMap::new(),
            folders: BTreeSet::new(),
        }
    }

    /// Insert or replace the entry for `entry.stem`. Returns the replaced
    /// entry, if any. Entries of a different kind are ignored.
    pub fn insert(&mut self, entry: MediaEntry) -> Option<MediaEntry> {
        if entry.kind != self.kind {
            tracing::warn!(
                "Ignoring {} entry {:?} in {} index",
                entry.kind,
                entry.stem,
                self.kind
            );
            return None;
        }
        if let Some(folder) = self.folder_of(&entry.path) {
            self.folders.insert(folder);
        }
        match self.positions.get(&entry.stem) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entry)),
            None => {
                self.positions.insert(entry.stem.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Record a folder without adding an entry (used when restoring snapshots).
    pub(crate) fn insert_folder(&mut self, folder: String) {
        self.folders.insert(folder);
    }

    fn folder_of(&self, path: &Path) -> Option<String> {
        let parent = path.parent()?;
        let relative = parent.strip_prefix(&self.root).unwrap_or(parent);
        Some(relative.to_string_lossy().replace('\\', "/"))
    }

    pub fn get(&self, stem: &str) -> Option<&MediaEntry> {
        self.positions.get(stem).map(|&pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn folders(&self) -> &BTreeSet<String> {
        &self.folders
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uniformly random entry, or `None` for an empty index.
    pub fn random_entry(&self) -> Option<&MediaEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get(fastrand::usize(..self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_but_keeps_position() {
        let mut index = CatalogIndex::new(MediaKind::Audio, "/m");
        index.insert(MediaEntry::new("a", "/m/x/a.mp3", MediaKind::Audio));
        index.insert(MediaEntry::new("b", "/m/b.mp3", MediaKind::Audio));
        let old = index.insert(MediaEntry::new("a", "/m/y/a.ogg", MediaKind::Audio));

        assert_eq!(old.map(|e| e.path), Some(PathBuf::from("/m/x/a.mp3")));
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].path, PathBuf::from("/m/y/a.ogg"));
        assert_eq!(index.get("b").map(|e| e.stem.as_str()), Some("b"));
    }

    #[test]
    fn folders_are_relative_to_root() {
        let mut index = CatalogIndex::new(MediaKind::Video, "/m");
        index.insert(MediaEntry::new("clip", "/m/memes/old/clip.mp4", MediaKind::Video));
        index.insert(MediaEntry::new("top", "/m/top.mp4", MediaKind::Video));
        let folders: Vec<_> = index.folders().iter().cloned().collect();
        assert_eq!(folders, vec!["".to_string(), "memes/old".to_string()]);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let mut index = CatalogIndex::new(MediaKind::Video, "/m");
        index.insert(MediaEntry::new("a", "/m/a.mp3", MediaKind::Audio));
        assert!(index.is_empty());
    }

    #[test]
    fn random_entry_on_empty_is_none() {
        let index = CatalogIndex::new(MediaKind::Audio, "/m");
        assert!(index.random_entry().is_none());
    }
}
