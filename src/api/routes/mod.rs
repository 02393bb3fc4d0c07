//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] — Enqueue and poll download jobs
//! - [`sources`] — Browse registered content sources
//! - [`system`] — Health and OpenAPI

use serde::{Deserialize, Serialize};

mod jobs;
mod sources;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use jobs::*;
pub use sources::*;
pub use system::*;

// ============================================================================
// Query Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /sources/:source_id/manga
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SearchQuery {
    /// Search string; empty or absent lists recent updates
    #[serde(default)]
    pub query: String,
    /// Result page number, 1-based (default: 1)
    pub page: Option<u32>,
}

/// Query parameters for GET /sources/:source_id/chapters
///
/// Manga ids contain slashes, so they are passed as a query parameter rather
/// than a path segment.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChaptersQuery {
    /// Source-local manga id
    pub manga_id: String,
}

/// Query parameters for GET /sources/:source_id/pages
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PagesQuery {
    /// Source-local manga id
    pub manga_id: String,
    /// Source-local chapter id
    pub chapter_id: String,
}
