//! Pluggable chapter sources
//!
//! A [`ChapterSource`] adapts one upstream content site to the resolver
//! contract: search for manga, list chapters, and return the ordered page list
//! for a chapter. Implementations must preserve the page order declared by the
//! upstream site.

use crate::error::ResolveError;
use crate::types::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

pub mod mangapill;
pub mod weebcentral;

pub use mangapill::MangaPill;
pub use weebcentral::WeebCentral;

/// A manga search result from a source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MangaSummary {
    /// Source-local manga id
    pub id: String,
    /// Display title
    pub title: String,
    /// Cover image URL, if the source exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// A chapter listing entry from a source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChapterSummary {
    /// Source-local chapter id
    pub id: String,
    /// Chapter number (may be fractional, e.g. 10.5)
    pub number: f64,
    /// Display title
    pub title: String,
}

/// A content source that can resolve manga, chapters, and page lists
///
/// Every method must complete within a bounded time; implementations hold an
/// HTTP client constructed with an explicit timeout.
#[async_trait]
pub trait ChapterSource: Send + Sync {
    /// Stable identifier for this source (e.g., "en.mangapill")
    fn id(&self) -> &str;

    /// Search the source's catalog; an empty query returns recent updates
    async fn search(&self, query: &str, page: u32) -> Result<Vec<MangaSummary>, ResolveError>;

    /// List chapters for a manga
    async fn chapters(&self, manga_id: &str) -> Result<Vec<ChapterSummary>, ResolveError>;

    /// Return the ordered page list for a chapter
    ///
    /// The returned order is the upstream declaration order and is consumed
    /// as-is; callers never re-sort it.
    async fn pages(&self, manga_id: &str, chapter_id: &str) -> Result<Vec<Page>, ResolveError>;
}

/// Registry of installed chapter sources, keyed by source id
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn ChapterSource>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own id, replacing any previous entry
    pub fn register(&mut self, source: Arc<dyn ChapterSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Look up a source by id
    pub fn get(&self, source_id: &str) -> Result<Arc<dyn ChapterSource>, ResolveError> {
        self.sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownSource(source_id.to_string()))
    }

    /// Ids of all registered sources
    pub fn ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }
}
