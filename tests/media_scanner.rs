use std::fs;
use std::path::{Path, PathBuf};

use cuecast::media::index::{CatalogIndex, MediaEntry};
use cuecast::media::mime::MediaKind;
use cuecast::media::scanner::{build, is_excluded, CatalogError};
use cuecast::media::snapshot::{self, SnapshotError};

fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"x").unwrap();
    path
}

fn stems(index: &CatalogIndex) -> Vec<&str> {
    let mut stems: Vec<&str> = index.entries().iter().map(|e| e.stem.as_str()).collect();
    stems.sort_unstable();
    stems
}

#[test]
fn scan_nonexistent_root_is_an_error() {
    let err = build(Path::new("/nonexistent/path/does/not/exist"), MediaKind::Audio, &[]).unwrap_err();
    assert!(matches!(err, CatalogError::RootMissing(_)));
}

#[test]
fn scan_file_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = touch(dir.path(), "not-a-dir.mp3");
    let err = build(&file, MediaKind::Audio, &[]).unwrap_err();
    assert!(matches!(err, CatalogError::NotADirectory(_)));
}

#[test]
fn scan_indexes_allowed_extensions_recursively() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Evil Laugh.mp3");
    touch(dir.path(), "memes/Bruh.ogg");
    touch(dir.path(), "memes/deep/Airhorn.WAV");
    touch(dir.path(), "memes/notes.txt");
    touch(dir.path(), "cover.jpg");

    let output = build(dir.path(), MediaKind::Audio, &[]).unwrap();
    assert_eq!(stems(&output.index), vec!["Airhorn", "Bruh", "Evil Laugh"]);
    assert_eq!(output.stats.indexed, 3);
    assert_eq!(output.stats.skipped, 0);
    assert!(output.index.folders().contains("memes/deep"));
    assert!(output.index.entries().iter().all(|e| e.kind == MediaKind::Audio));
}

#[test]
fn scan_skips_excluded_paths() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Keep.mp3");
    touch(dir.path(), "Elvis/Hound Dog.mp3");
    touch(dir.path(), "other/Elvis - Live.mp3");

    let exclude = vec!["Elvis".to_string()];
    let output = build(dir.path(), MediaKind::Audio, &exclude).unwrap();
    assert_eq!(stems(&output.index), vec!["Keep"]);
    assert_eq!(output.stats.excluded, 2);
}

#[test]
fn is_excluded_ignores_empty_needles() {
    assert!(!is_excluded(Path::new("/m/a.mp3"), &["".to_string()]));
    assert!(is_excluded(Path::new("/m/Elvis/a.mp3"), &["Elvis".to_string()]));
}

#[test]
fn duplicate_stems_keep_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/Same.mp3");
    touch(dir.path(), "b/Same.ogg");

    let output = build(dir.path(), MediaKind::Audio, &[]).unwrap();
    assert_eq!(output.index.len(), 1);
    assert_eq!(output.stats.replaced, 1);
    assert!(output.index.get("Same").is_some());
}

#[cfg(unix)]
#[test]
fn broken_symlink_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Good.mp3");
    std::os::unix::fs::symlink(dir.path().join("missing-target"), dir.path().join("dangling.mp3")).unwrap();

    let output = build(dir.path(), MediaKind::Audio, &[]).unwrap();
    assert_eq!(stems(&output.index), vec!["Good"]);
    assert_eq!(output.stats.skipped, 1);
}

#[test]
fn snapshot_round_trip_preserves_mapping() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Song (Live).mp3");
    touch(dir.path(), "sub/Other - Remix.ogg");
    let index = build(dir.path(), MediaKind::Audio, &[]).unwrap().index;

    let snap = dir.path().join("cache").join("audio_catalog.json");
    snapshot::save(&index, &snap).unwrap();
    let loaded = snapshot::load(&snap, MediaKind::Audio).unwrap();

    assert_eq!(loaded, index);
    assert_eq!(loaded.get("Song (Live)").map(|e| e.path.clone()), index.get("Song (Live)").map(|e| e.path.clone()));
}

#[test]
fn snapshot_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = snapshot::load(&dir.path().join("nope.json"), MediaKind::Audio).unwrap_err();
    assert!(matches!(err, SnapshotError::NotFound(_)));
}

#[test]
fn snapshot_wrong_kind_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = CatalogIndex::new(MediaKind::Video, dir.path());
    index.insert(MediaEntry::new("clip", dir.path().join("clip.mp4"), MediaKind::Video));
    let snap = snapshot::snapshot_path(dir.path(), MediaKind::Video);
    snapshot::save(&index, &snap).unwrap();

    let err = snapshot::load(&snap, MediaKind::Audio).unwrap_err();
    assert!(matches!(err, SnapshotError::KindMismatch { .. }));
}

#[test]
fn snapshot_other_version_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let snap = dir.path().join("audio_catalog.json");
    let stale = r#"{"format":"cuecast-catalog","version":0,"kind":"audio","root":"/m",
        "saved_at":"2024-01-01T00:00:00Z","entries":[],"folders":[]}"#;
    fs::write(&snap, stale).unwrap();

    let err = snapshot::load(&snap, MediaKind::Audio).unwrap_err();
    assert!(matches!(err, SnapshotError::VersionMismatch { version: 0, .. }));
}

#[test]
fn snapshot_garbage_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let snap = dir.path().join("audio_catalog.json");
    fs::write(&snap, b"\x80\x04\x95 not json").unwrap();
    let err = snapshot::load(&snap, MediaKind::Audio).unwrap_err();
    assert!(matches!(err, SnapshotError::Format(_)));
}

#[cfg(unix)]
#[test]
fn linked_folder_entries_stay_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Musique");
    fs::create_dir_all(&root).unwrap();
    touch(dir.path(), "nas/Sandstorm.mp3");
    std::os::unix::fs::symlink(dir.path().join("nas"), root.join("linked")).unwrap();

    let output = build(&root, MediaKind::Audio, &[]).unwrap();
    let entry = output.index.get("Sandstorm").unwrap();
    assert_eq!(entry.path, root.join("linked/Sandstorm.mp3"));
    assert_eq!(output.index.root(), root.as_path());
}

#[cfg(unix)]
#[test]
fn linked_root_is_not_resolved() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "nas/Sandstorm.mp3");
    let root = dir.path().join("Musique");
    std::os::unix::fs::symlink(dir.path().join("nas"), &root).unwrap();

    let output = build(&root, MediaKind::Audio, &[]).unwrap();
    assert_eq!(output.index.get("Sandstorm").unwrap().path, root.join("Sandstorm.mp3"));
}
