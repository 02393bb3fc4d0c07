//! REST API server module
//!
//! Exposes the poll-driven download engine over HTTP: enqueue a chapter, poll
//! it to completion, and browse the registered content sources. Each poll
//! request performs exactly one unit of download work server-side.

use crate::{ChapterDownloader, Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Jobs
/// - `POST /jobs` - Enqueue a chapter download
/// - `GET /jobs/:job_id` - Poll a job (drives one unit of work)
///
/// ## Source Browsing
/// - `GET /sources` - List registered source ids
/// - `GET /sources/:source_id/manga` - Search manga (`?query=&page=`)
/// - `GET /sources/:source_id/chapters` - List chapters (`?manga_id=`)
/// - `GET /sources/:source_id/pages` - List pages (`?manga_id=&chapter_id=`)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(downloader: Arc<ChapterDownloader>, config: Arc<Config>) -> Router {
    let state = AppState::new(downloader, config.clone());

    let router = Router::new()
        // Jobs
        .route("/jobs", post(routes::enqueue_job))
        .route("/jobs/:job_id", get(routes::poll_job))
        // Source browsing. Manga and chapter ids contain slashes, so they
        // travel as query parameters rather than path segments.
        .route("/sources", get(routes::list_sources))
        .route("/sources/:source_id/manga", get(routes::search_manga))
        .route("/sources/:source_id/chapters", get(routes::list_chapters))
        .route("/sources/:source_id/pages", get(routes::list_pages))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI gets its own spec path; /openapi.json stays a plain route.
    let router = if config.server.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/swagger-ui/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Origins containing "*" (or an empty list) allow any origin; otherwise only
/// the listed origins are allowed. All methods and headers are permitted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until shutdown or error.
///
/// # Example
///
/// ```no_run
/// use chapter_dl::{ChapterDownloader, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let downloader = Arc::new(ChapterDownloader::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// chapter_dl::api::start_api_server(downloader, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    downloader: Arc<ChapterDownloader>,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(downloader, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}
