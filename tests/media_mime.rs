use std::path::Path;
use cuecast::media::mime::{mime_for, MediaKind};

#[test]
fn test_audio_allow_list() {
    assert!(MediaKind::Audio.accepts(Path::new("laugh.ogg")));
    assert!(MediaKind::Audio.accepts(Path::new("song.mp3")));
    assert!(MediaKind::Audio.accepts(Path::new("clip.wav")));
    assert!(!MediaKind::Audio.accepts(Path::new("movie.mkv")));
}

#[test]
fn test_video_allow_list() {
    assert!(MediaKind::Video.accepts(Path::new("movie.mp4")));
    assert!(MediaKind::Video.accepts(Path::new("movie.av1")));
    assert!(!MediaKind::Video.accepts(Path::new("song.mp3")));
}

#[test]
fn test_case_insensitive() {
    assert!(MediaKind::Audio.accepts(Path::new("LOUD.MP3")));
    assert!(MediaKind::Video.accepts(Path::new("Clip.Mp4")));
}

#[test]
fn test_no_extension_rejected() {
    assert!(!MediaKind::Audio.accepts(Path::new("Makefile")));
    assert!(!MediaKind::Video.accepts(Path::new("README")));
}

#[test]
fn test_mime_for_known_and_unknown() {
    assert_eq!(mime_for(Path::new("a.mp3")), "audio/mpeg");
    assert_eq!(mime_for(Path::new("a.ogg")), "audio/ogg");
    assert_eq!(mime_for(Path::new("a.mp4")), "video/mp4");
    assert_eq!(mime_for(Path::new("a.txt")), "application/octet-stream");
}

#[test]
fn test_kind_from_str() {
    assert_eq!("audio".parse::<MediaKind>(), Ok(MediaKind::Audio));
    assert_eq!("Video".parse::<MediaKind>(), Ok(MediaKind::Video));
    assert!("image".parse::<MediaKind>().is_err());
}
