//! Source browsing handlers.

use super::{ChaptersQuery, PagesQuery, SearchQuery};
use crate::api::AppState;
use crate::error::{ApiError, Error, ResolveError, ToHttpStatus};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /sources - List registered source ids
#[utoipa::path(
    get,
    path = "/sources",
    tag = "sources",
    responses(
        (status = 200, description = "Registered source ids", body = Vec<String>)
    )
)]
pub async fn list_sources(State(state): State<AppState>) -> impl IntoResponse {
    let mut ids: Vec<String> = state
        .downloader
        .sources()
        .ids()
        .into_iter()
        .map(String::from)
        .collect();
    ids.sort();

    (StatusCode::OK, Json(ids))
}

/// GET /sources/:source_id/manga - Search a source's catalog
#[utoipa::path(
    get,
    path = "/sources/{source_id}/manga",
    tag = "sources",
    params(
        ("source_id" = String, Path, description = "Source id"),
        ("query" = Option<String>, Query, description = "Search string; empty lists recent updates"),
        ("page" = Option<u32>, Query, description = "Result page number, 1-based")
    ),
    responses(
        (status = 200, description = "Matching manga", body = Vec<crate::source::MangaSummary>),
        (status = 404, description = "Unknown source", body = ApiError),
        (status = 502, description = "Source unreachable", body = ApiError)
    )
)]
pub async fn search_manga(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let source = match state.downloader.sources().get(&source_id) {
        Ok(source) => source,
        Err(e) => return resolve_error_response(e),
    };

    match source.search(&params.query, params.page.unwrap_or(1)).await {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(e) => resolve_error_response(e),
    }
}

/// GET /sources/:source_id/chapters - List a manga's chapters
#[utoipa::path(
    get,
    path = "/sources/{source_id}/chapters",
    tag = "sources",
    params(
        ("source_id" = String, Path, description = "Source id"),
        ("manga_id" = String, Query, description = "Source-local manga id")
    ),
    responses(
        (status = 200, description = "Chapter listing, newest first", body = Vec<crate::source::ChapterSummary>),
        (status = 404, description = "Unknown source or manga", body = ApiError),
        (status = 502, description = "Source unreachable", body = ApiError)
    )
)]
pub async fn list_chapters(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Query(params): Query<ChaptersQuery>,
) -> Response {
    let source = match state.downloader.sources().get(&source_id) {
        Ok(source) => source,
        Err(e) => return resolve_error_response(e),
    };

    match source.chapters(&params.manga_id).await {
        Ok(chapters) => (StatusCode::OK, Json(chapters)).into_response(),
        Err(e) => resolve_error_response(e),
    }
}

/// GET /sources/:source_id/pages - List a chapter's pages in reading order
#[utoipa::path(
    get,
    path = "/sources/{source_id}/pages",
    tag = "sources",
    params(
        ("source_id" = String, Path, description = "Source id"),
        ("manga_id" = String, Query, description = "Source-local manga id"),
        ("chapter_id" = String, Query, description = "Source-local chapter id")
    ),
    responses(
        (status = 200, description = "Ordered page list", body = Vec<crate::types::Page>),
        (status = 404, description = "Unknown source or chapter", body = ApiError),
        (status = 502, description = "Source unreachable", body = ApiError)
    )
)]
pub async fn list_pages(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Query(params): Query<PagesQuery>,
) -> Response {
    let source = match state.downloader.sources().get(&source_id) {
        Ok(source) => source,
        Err(e) => return resolve_error_response(e),
    };

    match source.pages(&params.manga_id, &params.chapter_id).await {
        Ok(pages) => (StatusCode::OK, Json(pages)).into_response(),
        Err(e) => resolve_error_response(e),
    }
}

/// Map a resolver error onto the standard error envelope and status code
fn resolve_error_response(e: ResolveError) -> Response {
    let error = Error::Resolve(e);
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::from(error))).into_response()
}
