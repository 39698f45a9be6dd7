//! Glue between commands and playback: resolve a query against the catalog,
//! turn the winning file into a fetchable URL, and broadcast it.
//!
//! A single [`Dispatcher`] is built at startup and handed to both the HTTP
//! API and the socket transport, so they share one catalog and one session
//! registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::command::{self, Command, CommandError, Target};
use crate::error::DispatchError;
use crate::media::catalog::{Catalog, RebuildReport};
use crate::media::index::MediaEntry;
use crate::media::mime::MediaKind;
use crate::media::resolver::{self, MatchResult};
use crate::session::broadcast::{BroadcastReport, Broadcaster};
use crate::session::message::{ControlCommand, PlaybackDirective};
use crate::session::registry::SessionRegistry;

/// Builds client-facing URLs for files under the media root.
#[derive(Debug, Clone)]
pub struct MediaUrls {
    public_url: String,
    media_root: PathBuf,
    audio_dir: String,
}

impl MediaUrls {
    pub fn new(public_url: &str, media_root: impl Into<PathBuf>, audio_dir: impl Into<String>) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            media_root: media_root.into(),
            audio_dir: audio_dir.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// `<public>/media/<percent-encoded path relative to the media root>`.
    pub fn media_url(&self, path: &Path) -> Result<String, DispatchError> {
        let relative = path.strip_prefix(&self.media_root).map_err(|_| {
            DispatchError::InvalidArgument(format!(
                "{} is outside the media root",
                path.display()
            ))
        })?;
        Ok(format!("{}/media/{}", self.public_url, encode_path(relative)))
    }

    /// Tag-service URL for a media URL that points into the audio folder:
    /// `/media/<audio_dir>/x.mp3` becomes `/metadata/x.mp3`. Other URLs are
    /// returned unchanged.
    pub fn metadata_url(&self, media_url: &str) -> String {
        let prefix = format!("/media/{}", urlencoding::encode(&self.audio_dir));
        media_url.replacen(&prefix, "/metadata", 1)
    }
}

fn encode_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// A directive that went out.
#[derive(Debug, Clone, Serialize)]
pub struct Played {
    pub entry: MediaEntry,
    /// `None` for random picks.
    pub score: Option<f64>,
    pub media_url: String,
    pub report: BroadcastReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub kind: MediaKind,
    pub query: String,
    pub results: Vec<MatchResult>,
    pub catalog_size: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub audio_entries: usize,
    pub video_entries: usize,
    pub active_connections: usize,
    pub media_state: String,
}

/// Reply to a text command: success flag plus one human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub ok: bool,
    pub text: String,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self { ok: true, text: text.into() }
    }

    fn err(text: impl Into<String>) -> Self {
        Self { ok: false, text: text.into() }
    }
}

pub struct Dispatcher {
    catalog: Arc<Catalog>,
    broadcaster: Broadcaster,
    urls: MediaUrls,
    volume: f32,
}

impl Dispatcher {
    pub fn new(catalog: Arc<Catalog>, registry: Arc<SessionRegistry>, urls: MediaUrls, volume: f32) -> Self {
        Self {
            catalog,
            broadcaster: Broadcaster::new(registry),
            urls,
            volume,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.broadcaster.registry()
    }

    pub fn urls(&self) -> &MediaUrls {
        &self.urls
    }

    /// Resolve `target` and broadcast it. Fails without sending anything
    /// unless a confident, still-existing match is found.
    pub fn play(&self, kind: MediaKind, target: &Target, looped: bool) -> Result<Played, DispatchError> {
        let index = self.catalog.index(kind);
        let (entry, score) = match target {
            Target::Query(query) => {
                let MatchResult { entry, score } = resolver::pick(&index, query)?;
                (entry, Some(score))
            }
            Target::Random => {
                let entry = index
                    .random_entry()
                    .cloned()
                    .ok_or(DispatchError::NotReady { kind })?;
                if !entry.path.exists() {
                    return Err(DispatchError::Stale { path: entry.path });
                }
                (entry, None)
            }
        };

        let media_url = self.urls.media_url(&entry.path)?;
        let mut directive = PlaybackDirective::new(&media_url, kind, self.volume, looped);
        if kind == MediaKind::Audio {
            directive = directive.with_metadata_url(self.urls.metadata_url(&media_url));
        }

        let report = self.broadcaster.broadcast_play(&directive);
        if report.is_unreachable() {
            return Err(DispatchError::Unreachable);
        }
        Ok(Played {
            entry,
            score,
            media_url,
            report,
        })
    }

    /// Ranked candidates for display. Files deleted since the scan are
    /// silently left out.
    pub fn search(&self, kind: MediaKind, query: &str) -> Result<SearchResults, DispatchError> {
        let start = Instant::now();
        let index = self.catalog.index(kind);
        if index.is_empty() {
            return Err(DispatchError::NotReady { kind });
        }
        let mut results = resolver::resolve(&index, query);
        resolver::retain_existing(&mut results);
        if results.is_empty() {
            return Err(DispatchError::NoMatch {
                kind,
                query: query.to_string(),
                suggestion: None,
            });
        }
        Ok(SearchResults {
            kind,
            query: query.to_string(),
            results,
            catalog_size: index.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    pub fn control(&self, command: ControlCommand) -> BroadcastReport {
        self.broadcaster.broadcast_command(command)
    }

    pub fn status(&self) -> Status {
        let registry = self.registry();
        Status {
            audio_entries: self.catalog.len(MediaKind::Audio),
            video_entries: self.catalog.len(MediaKind::Video),
            active_connections: registry.active_count(),
            media_state: registry.latest_state(),
        }
    }

    /// Rescan both kinds. Returns the reports of kinds that rebuilt
    /// successfully; failures are logged and keep the old index.
    pub async fn reload(&self) -> Vec<RebuildReport> {
        self.catalog
            .rebuild()
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    /// Parse and run one line of chat text.
    pub async fn execute_text(&self, text: &str) -> Reply {
        match command::parse(text) {
            Ok(command) => self.execute(command).await,
            Err(CommandError::NotACommand) => Reply::err(format!(
                "Not a command. Try: {}",
                command::usage().collect::<Vec<_>>().join(", ")
            )),
            Err(e) => Reply::err(e.to_string()),
        }
    }

    pub async fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Play { kind, target, looped } => match self.play(kind, &target, looped) {
                Ok(played) => Reply::ok(format!(
                    "{} is now playing on {} client(s){}",
                    played.entry.stem,
                    played.report.clients_notified,
                    if looped { " (looping)" } else { "" }
                )),
                Err(e) => Reply::err(describe(&e)),
            },
            Command::Search { kind, query } => match self.search(kind, &query) {
                Ok(found) => Reply::ok(format_search(&found)),
                Err(e) => Reply::err(describe(&e)),
            },
            Command::Control(command) => {
                let report = self.control(command);
                if report.is_unreachable() {
                    Reply::err(describe(&DispatchError::Unreachable))
                } else {
                    Reply::ok(format!("Sent {} to {} client(s)", command, report.clients_notified))
                }
            }
            Command::Status => {
                let status = self.status();
                Reply::ok(format!(
                    "{} cached sounds, {} cached videos, {} connected client(s), media state: {}",
                    status.audio_entries,
                    status.video_entries,
                    status.active_connections,
                    status.media_state
                ))
            }
            Command::Reload => {
                let reports = self.reload().await;
                if reports.is_empty() {
                    return Reply::err("Reload failed, keeping the previous catalog");
                }
                let lines: Vec<String> = reports
                    .iter()
                    .map(|r| {
                        format!(
                            "{}: {} entries ({:+}) in {:.0}s",
                            r.kind,
                            r.after,
                            r.added(),
                            r.elapsed_secs
                        )
                    })
                    .collect();
                Reply::ok(format!("Catalog reloaded. {}", lines.join("; ")))
            }
        }
    }
}

/// User-facing sentence for a dispatch failure.
pub fn describe(error: &DispatchError) -> String {
    match error {
        DispatchError::NotReady { kind } => format!("The {kind} catalog is not loaded yet."),
        DispatchError::NoMatch {
            kind,
            query,
            suggestion: Some(best),
        } => format!("No {kind} matched '{query}' closely enough (maybe you meant '{best}'?)"),
        DispatchError::NoMatch { kind, query, .. } => format!("No {kind} found matching '{query}'"),
        DispatchError::Stale { path } => {
            format!("{} was removed from disk, try !reload", path.display())
        }
        DispatchError::Unreachable => "No playback client is connected.".to_string(),
        DispatchError::InvalidArgument(msg) => msg.clone(),
    }
}

/// Confidence marker for one search result.
pub fn confidence_marker(score: f64) -> &'static str {
    if score > 0.9 {
        "[high]"
    } else if score > 0.7 {
        "[medium]"
    } else {
        "[low]"
    }
}

fn format_search(found: &SearchResults) -> String {
    let mut text = format!("Search results for '{}'\n", found.query);
    for result in &found.results {
        text.push_str(&format!(
            "{} {} - match {:.0}%\n",
            confidence_marker(result.score),
            result.entry.stem,
            result.score * 100.0
        ));
    }
    text.push_str(&format!(
        "Searched through {} files in {:.3}s",
        found.catalog_size, found.elapsed_secs
    ));
    text
}
