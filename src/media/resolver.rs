use serde::Serialize;

use crate::error::DispatchError;
use crate::media::index::{CatalogIndex, MediaEntry};
use crate::media::matcher;

/// Most results ever returned for one query.
pub const MAX_RESULTS: usize = 5;

/// Minimum top score for a result to be played without confirmation.
pub const CONFIDENT_SCORE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub entry: MediaEntry,
    pub score: f64,
}

impl MatchResult {
    pub fn is_confident(&self) -> bool {
        self.score >= CONFIDENT_SCORE
    }
}

/// Score every entry of `index` against `query` and return the best
/// [`MAX_RESULTS`], highest first. Equal scores keep index order.
///
/// An empty index yields an empty list; callers that need to tell "not
/// loaded" from "no match" must check `index.is_empty()` themselves.
pub fn resolve(index: &CatalogIndex, query: &str) -> Vec<MatchResult> {
    let mut scored: Vec<MatchResult> = index
        .entries()
        .iter()
        .map(|entry| MatchResult {
            score: matcher::score(&entry.stem, query),
            entry: entry.clone(),
        })
        .collect();

    // sort_by is stable, so ties stay in index order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(MAX_RESULTS);
    scored
}

/// Drop results whose file has disappeared since the scan. Returns how many
/// were removed.
pub fn retain_existing(results: &mut Vec<MatchResult>) -> usize {
    let before = results.len();
    results.retain(|r| {
        let exists = r.entry.path.exists();
        if !exists {
            tracing::debug!("Dropping stale result {}", r.entry.path.display());
        }
        exists
    });
    before - results.len()
}

/// Resolve `query` to the single entry that should be played, applying the
/// acceptance policy: the index must be populated, the top score must reach
/// [`CONFIDENT_SCORE`], and the file must still exist.
pub fn pick(index: &CatalogIndex, query: &str) -> Result<MatchResult, DispatchError> {
    if index.is_empty() {
        return Err(DispatchError::NotReady { kind: index.kind() });
    }

    let top = resolve(index, query).into_iter().next();
    let top = match top {
        Some(top) if top.is_confident() => top,
        other => {
            return Err(DispatchError::NoMatch {
                kind: index.kind(),
                query: query.to_string(),
                suggestion: other.map(|r| r.entry.stem),
            });
        }
    };

    if !top.entry.path.exists() {
        return Err(DispatchError::Stale {
            path: top.entry.path,
        });
    }
    Ok(top)
}
