//! # chapter-dl
//!
//! Poll-driven backend library for manga chapter download applications.
//!
//! ## Design Philosophy
//!
//! chapter-dl is designed to be:
//! - **Poll-driven** - The host's poll loop is the engine's clock; each poll
//!   performs exactly one bounded unit of work
//! - **Resilient** - Individual page failures are skipped and recorded, never
//!   fatal on their own
//! - **Atomic** - Staged pages and archives become visible only once fully
//!   written; no partial artifacts
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use chapter_dl::{ChapterDownloader, Config, PollResponse};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ChapterDownloader::new(Config::default())?;
//!
//!     let id = downloader
//!         .enqueue("en.mangapill", "/manga/2/one-piece", "/chapters/2-11050000/one-piece-chapter-1105")
//!         .await?;
//!
//!     loop {
//!         match downloader.poll(&id).await {
//!             PollResponse::Pending { current, total } => {
//!                 println!("{current}/{total}");
//!             }
//!             PollResponse::Completed { artifact_path, warnings } => {
//!                 println!("done: {artifact_path} ({} warnings)", warnings.len());
//!                 break;
//!             }
//!             PollResponse::Failed { message } => {
//!                 eprintln!("failed: {message}");
//!                 break;
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// CBZ archive packaging
pub mod archive;
/// Configuration types
pub mod config;
/// Public downloader facade
pub mod downloader;
/// The poll-driven job state machine
pub mod driver;
/// Error types
pub mod error;
/// Page fetching and staging
pub mod fetch;
/// In-memory job registry
pub mod registry;
/// Pluggable chapter sources
pub mod source;
/// Core types
pub mod types;
/// Utility functions
pub(crate) mod utils;

// Re-export commonly used types
pub use archive::CbzWriter;
pub use config::{ApiConfig, Config, DownloadConfig, RetentionConfig};
pub use downloader::ChapterDownloader;
pub use driver::JobDriver;
pub use error::{
    ApiError, ArchiveError, Error, ErrorDetail, FetchError, ResolveError, Result, ToHttpStatus,
};
pub use fetch::PageFetcher;
pub use registry::{JobHandle, JobRegistry};
pub use source::{
    ChapterSource, ChapterSummary, MangaPill, MangaSummary, SourceRegistry, WeebCentral,
};
pub use types::{EnqueueRequest, EnqueueResponse, Job, JobId, JobStatus, Page, PollResponse};
