use std::path::PathBuf;
use std::sync::Arc;

use crate::dispatch::Dispatcher;

/// Shared application state injected into all route handlers via
/// `axum::extract::State`. Created once at startup; cloning only bumps the
/// reference counts.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Optional directory with the browser player, served for unmatched paths.
    pub web_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            web_root: None,
        }
    }

    pub fn with_web_root(mut self, web_root: Option<PathBuf>) -> Self {
        self.web_root = web_root;
        self
    }
}
