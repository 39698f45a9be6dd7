use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use cuecast::media::catalog::{Catalog, CatalogSettings, IndexSource};
use cuecast::media::index::{CatalogIndex, MediaEntry};
use cuecast::media::mime::MediaKind;

struct Fixture {
    _dir: tempfile::TempDir,
    audio: PathBuf,
    settings: CatalogSettings,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let audio = base.join("Musique");
    let video = base.join("Video");
    fs::create_dir_all(&audio).unwrap();
    fs::create_dir_all(&video).unwrap();
    fs::write(audio.join("Airhorn.mp3"), b"x").unwrap();
    fs::write(audio.join("Sad Trombone.ogg"), b"x").unwrap();
    fs::write(video.join("Cat.webm"), b"x").unwrap();

    let settings = CatalogSettings {
        audio_root: audio.clone(),
        video_root: video,
        exclude: Vec::new(),
        snapshot_dir: base.join("cache"),
    };
    Fixture { _dir: dir, audio, settings }
}

fn generation(root: &Path, tag: &str, size: usize) -> CatalogIndex {
    let mut index = CatalogIndex::new(MediaKind::Audio, root);
    for i in 0..size {
        let stem = format!("{tag}-{i}");
        index.insert(MediaEntry::new(&stem, root.join(format!("{stem}.mp3")), MediaKind::Audio));
    }
    index
}

#[test]
fn new_catalog_is_empty_until_loaded() {
    let fx = fixture();
    let catalog = Catalog::new(fx.settings);
    assert_eq!(catalog.len(MediaKind::Audio), 0);
    assert!(catalog.pick(MediaKind::Audio, "airhorn").is_err());
}

#[test]
fn readers_see_whole_generations_during_swaps() {
    let catalog = Arc::new(Catalog::new(fixture().settings));
    let root = catalog.settings().audio_root.clone();
    catalog.replace(generation(&root, "old", 50));

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let index = catalog.index(MediaKind::Audio);
                    let tag = if index.len() == 50 { "old" } else { "new" };
                    assert!(index.len() == 50 || index.len() == 80, "torn index of {}", index.len());
                    assert!(index.entries().iter().all(|e| e.stem.starts_with(tag)));
                }
            })
        })
        .collect();

    for round in 0..200 {
        let next = if round % 2 == 0 {
            generation(&root, "new", 80)
        } else {
            generation(&root, "old", 50)
        };
        catalog.replace(next);
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn held_index_survives_replacement() {
    let fx = fixture();
    let catalog = Catalog::new(fx.settings);
    catalog.replace(generation(&fx.audio, "old", 3));

    let held = catalog.index(MediaKind::Audio);
    let previous = catalog.replace(generation(&fx.audio, "new", 7));

    assert_eq!(held.len(), 3);
    assert!(Arc::ptr_eq(&held, &previous));
    assert_eq!(catalog.len(MediaKind::Audio), 7);
}

#[test]
fn first_load_scans_then_reuses_snapshot() {
    let fx = fixture();
    let catalog = Catalog::new(fx.settings.clone());

    let report = catalog.load_or_build(MediaKind::Audio, false).unwrap();
    assert_eq!(report.source, IndexSource::Scan);
    assert_eq!(report.after, 2);
    assert!(fx.settings.snapshot_path(MediaKind::Audio).is_file());

    // A file added after the snapshot stays invisible until a forced rebuild.
    fs::write(fx.audio.join("Bruh.mp3"), b"x").unwrap();
    let fresh = Catalog::new(fx.settings.clone());
    let report = fresh.load_or_build(MediaKind::Audio, false).unwrap();
    assert_eq!(report.source, IndexSource::Snapshot);
    assert_eq!(fresh.len(MediaKind::Audio), 2);

    let report = fresh.load_or_build(MediaKind::Audio, true).unwrap();
    assert_eq!(report.source, IndexSource::Scan);
    assert_eq!(report.before, 2);
    assert_eq!(report.after, 3);
    assert_eq!(report.added(), 1);
}

#[test]
fn snapshot_for_another_root_is_ignored() {
    let fx = fixture();
    Catalog::new(fx.settings.clone()).load_or_build(MediaKind::Audio, false).unwrap();

    let other = fx.audio.parent().unwrap().join("Elsewhere");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("Only Here.mp3"), b"x").unwrap();
    let moved = CatalogSettings {
        audio_root: other,
        ..fx.settings.clone()
    };

    let catalog = Catalog::new(moved);
    let report = catalog.load_or_build(MediaKind::Audio, false).unwrap();
    assert_eq!(report.source, IndexSource::Scan);
    assert!(catalog.index(MediaKind::Audio).get("Only Here").is_some());
}

#[test]
fn failed_rebuild_keeps_previous_index() {
    let fx = fixture();
    let catalog = Catalog::new(fx.settings.clone());
    catalog.load_or_build(MediaKind::Audio, true).unwrap();

    fs::remove_dir_all(&fx.audio).unwrap();
    assert!(catalog.load_or_build(MediaKind::Audio, true).is_err());
    assert_eq!(catalog.len(MediaKind::Audio), 2);
}

#[tokio::test]
async fn rebuild_refreshes_both_kinds() {
    let fx = fixture();
    let catalog = Arc::new(Catalog::new(fx.settings.clone()));
    let initial = catalog.load_all(false).await;
    assert_eq!(initial.len(), 2);
    assert!(initial.iter().all(Result::is_ok));

    fs::write(fx.settings.video_root.join("Dog.mp4"), b"x").unwrap();
    let reports = catalog.rebuild().await;
    let video = reports
        .into_iter()
        .filter_map(Result::ok)
        .find(|r| r.kind == MediaKind::Video)
        .unwrap();
    assert_eq!(video.before, 1);
    assert_eq!(video.after, 2);
    assert_eq!(catalog.len(MediaKind::Video), 2);
}
