//! Error types for chapter-dl
//!
//! The taxonomy follows the job lifecycle: resolution errors terminate a job,
//! per-page fetch errors are absorbed by the skip policy, and packaging errors
//! terminate a job without leaving a partial artifact. API integration gets
//! HTTP status mapping and a structured JSON error envelope.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for chapter-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chapter-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chapters_dir")
        key: Option<String>,
    },

    /// Page list resolution failed; terminal for the owning job
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Single-page fetch failed; absorbed by the skip-and-continue policy
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Archive creation failed; terminal for the owning job
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Job not found in the registry
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors from resolving a chapter's page list against a content source
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The manga or chapter does not exist on the source
    #[error("not found: {0}")]
    NotFound(String),

    /// The source rejected the request due to rate limiting
    #[error("rate limited by source: {0}")]
    RateLimited(String),

    /// The source responded but its content could not be parsed
    #[error("failed to parse source response: {0}")]
    Parse(String),

    /// The source could not be reached
    #[error("source network error: {0}")]
    Network(String),

    /// No source is registered under the requested id
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// The resolver call exceeded its time budget
    #[error("resolver timed out after {seconds} seconds")]
    Timeout {
        /// The timeout that was exceeded, in seconds
        seconds: u64,
    },
}

/// Errors from fetching and staging a single page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch exceeded its time budget
    #[error("timeout fetching {url}")]
    Timeout {
        /// The page URL that timed out
        url: String,
    },

    /// The upstream host returned a non-success status
    #[error("HTTP {status} fetching {url}")]
    Http {
        /// The HTTP status code returned by the host
        status: u16,
        /// The page URL that was requested
        url: String,
    },

    /// Connection or transfer failure
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// The page URL that was requested
        url: String,
        /// The underlying failure description
        reason: String,
    },

    /// Failed to write the staged page file
    #[error("failed to stage page: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from packaging staged pages into an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No staged page files were available to archive
    #[error("no staged pages to archive")]
    EmptyInput,

    /// Writing the archive failed
    #[error("failed to write archive {path}: {reason}")]
    Write {
        /// The archive path being written
        path: PathBuf,
        /// The underlying failure description
        reason: String,
    },

    /// I/O error while reading staged files or renaming the archive
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// API error response format
///
/// Returned by API endpoints when a request-level error occurs. Job-level
/// conditions (unknown job, failed job) are never reported through this
/// envelope; the poll endpoint always answers with a well-formed status body.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "validation_error",
///     "message": "source_id must not be empty"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::JobNotFound(_) => 404,
            Error::Resolve(ResolveError::NotFound(_)) => 404,
            Error::Resolve(ResolveError::UnknownSource(_)) => 404,

            // 422 Unprocessable Entity - Semantic errors
            Error::Resolve(ResolveError::Parse(_)) => 422,
            Error::Archive(_) => 422,

            // 429 Too Many Requests - upstream throttling passed through
            Error::Resolve(ResolveError::RateLimited(_)) => 429,

            // 502 Bad Gateway - External service errors
            Error::Resolve(ResolveError::Network(_)) => 502,
            Error::Fetch(_) => 502,
            Error::Network(_) => 502,

            // 504 Gateway Timeout
            Error::Resolve(ResolveError::Timeout { .. }) => 504,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Resolve(e) => match e {
                ResolveError::NotFound(_) => "chapter_not_found",
                ResolveError::RateLimited(_) => "rate_limited",
                ResolveError::Parse(_) => "parse_error",
                ResolveError::Network(_) => "source_unreachable",
                ResolveError::UnknownSource(_) => "unknown_source",
                ResolveError::Timeout { .. } => "resolve_timeout",
            },
            Error::Fetch(e) => match e {
                FetchError::Timeout { .. } => "fetch_timeout",
                FetchError::Http { .. } => "fetch_http_error",
                FetchError::Network { .. } => "fetch_network_error",
                FetchError::Io(_) => "fetch_io_error",
            },
            Error::Archive(e) => match e {
                ArchiveError::EmptyInput => "empty_archive_input",
                ArchiveError::Write { .. } => "archive_write_failed",
                ArchiveError::Io(_) => "archive_io_error",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::JobNotFound(_) => "job_not_found",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Fetch(FetchError::Http { status, url }) => Some(serde_json::json!({
                "status": status,
                "url": url,
            })),
            Error::Archive(ArchiveError::Write { path, .. }) => Some(serde_json::json!({
                "path": path,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns (Error, expected_status_code, expected_error_code) for every
    /// reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("chapters_dir".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::JobNotFound("no such job".into()),
                404,
                "job_not_found",
            ),
            (
                Error::Resolve(ResolveError::NotFound("chapter 12".into())),
                404,
                "chapter_not_found",
            ),
            (
                Error::Resolve(ResolveError::UnknownSource("en.nowhere".into())),
                404,
                "unknown_source",
            ),
            (
                Error::Resolve(ResolveError::RateLimited("429 from upstream".into())),
                429,
                "rate_limited",
            ),
            (
                Error::Resolve(ResolveError::Parse("no pages in document".into())),
                422,
                "parse_error",
            ),
            (
                Error::Resolve(ResolveError::Network("dns failure".into())),
                502,
                "source_unreachable",
            ),
            (
                Error::Resolve(ResolveError::Timeout { seconds: 30 }),
                504,
                "resolve_timeout",
            ),
            (
                Error::Fetch(FetchError::Timeout {
                    url: "http://x/1.jpg".into(),
                }),
                502,
                "fetch_timeout",
            ),
            (
                Error::Fetch(FetchError::Http {
                    status: 404,
                    url: "http://x/1.jpg".into(),
                }),
                502,
                "fetch_http_error",
            ),
            (
                Error::Fetch(FetchError::Network {
                    url: "http://x/1.jpg".into(),
                    reason: "connection reset".into(),
                }),
                502,
                "fetch_network_error",
            ),
            (
                Error::Archive(ArchiveError::EmptyInput),
                422,
                "empty_archive_input",
            ),
            (
                Error::Archive(ArchiveError::Write {
                    path: PathBuf::from("/out/ch.cbz"),
                    reason: "disk full".into(),
                }),
                422,
                "archive_write_failed",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    #[test]
    fn resolver_not_found_is_404() {
        let err = Error::Resolve(ResolveError::NotFound("manga 7".into()));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn rate_limited_is_429() {
        let err = Error::Resolve(ResolveError::RateLimited("slow down".into()));
        assert_eq!(err.status_code(), 429);
    }

    #[test]
    fn empty_archive_input_is_422() {
        assert_eq!(Error::Archive(ArchiveError::EmptyInput).status_code(), 422);
    }

    #[test]
    fn api_error_from_fetch_http_has_status_and_url() {
        let err = Error::Fetch(FetchError::Http {
            status: 503,
            url: "http://cdn.example/p1.jpg".into(),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "fetch_http_error");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["status"], 503);
        assert_eq!(details["url"], "http://cdn.example/p1.jpg");
    }

    #[test]
    fn api_error_from_archive_write_has_path() {
        let err = Error::Archive(ArchiveError::Write {
            path: PathBuf::from("/chapters/one/12.cbz"),
            reason: "disk full".into(),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "archive_write_failed");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["path"], "/chapters/one/12.cbz");
    }

    #[test]
    fn api_error_from_config_with_key_has_key_detail() {
        let err = Error::Config {
            message: "bad ratio".into(),
            key: Some("max_failure_ratio".into()),
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "config_error");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["key"], "max_failure_ratio");
    }

    #[test]
    fn api_error_from_job_not_found_has_no_details() {
        let api: ApiError = Error::JobNotFound("abc".into()).into();

        assert_eq!(api.error.code, "job_not_found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::Resolve(ResolveError::RateLimited("try later".into()));
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(api.error.message, display_msg);
    }

    #[test]
    fn api_error_validation_factory() {
        let api = ApiError::validation("source_id must not be empty");

        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "source_id must not be empty");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_not_found_factory() {
        let api = ApiError::not_found("source en.mangapill");

        assert_eq!(api.error.code, "not_found");
        assert_eq!(api.error.message, "source en.mangapill not found");
    }

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }
}
