//! Application state for the API server

use crate::{ChapterDownloader, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// The chapter download engine
    pub downloader: Arc<ChapterDownloader>,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<ChapterDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
