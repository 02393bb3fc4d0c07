//! OpenAPI documentation and schema generation
//!
//! Compile-time OpenAPI spec for the chapter-dl REST API, generated with
//! utoipa. Served at `/openapi.json` and, when enabled, browsable at
//! `/swagger-ui`.

use utoipa::OpenApi;

/// OpenAPI documentation for the chapter-dl REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "chapter-dl REST API",
        version = "0.2.0",
        description = "Poll-driven manga chapter download engine: enqueue a chapter, poll the job to drive it one step at a time, and collect the packaged CBZ archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:7070", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::enqueue_job,
        crate::api::routes::poll_job,

        // Source browsing
        crate::api::routes::list_sources,
        crate::api::routes::search_manga,
        crate::api::routes::list_chapters,
        crate::api::routes::list_pages,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobStatus,
        crate::types::Page,
        crate::types::EnqueueRequest,
        crate::types::EnqueueResponse,
        crate::types::PollResponse,

        // Source types from source/mod.rs
        crate::source::MangaSummary,
        crate::source::ChapterSummary,

        // Config types from config.rs
        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::RetentionConfig,
        crate::config::ApiConfig,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Download jobs - Enqueue chapters and poll them to completion"),
        (name = "sources", description = "Content sources - Search manga, list chapters and pages"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
