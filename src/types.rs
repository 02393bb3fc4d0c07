//! Core types for chapter-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Opaque unique identifier for a download job
///
/// Backed by a v4 UUID so ids are never reused for the lifetime of the
/// registry (or any other registry, for that matter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Create a fresh JobId
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job lifecycle status
///
/// Moves forward along Pending → Downloading → Packaging → Completed, or from
/// any non-terminal state to Failed. It never regresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, page list not yet resolved
    Pending,
    /// Page list resolved, pages being fetched one per poll
    Downloading,
    /// All pages accounted for, archive not yet written
    Packaging,
    /// Artifact written; terminal
    Completed,
    /// Unrecoverable failure; terminal
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no further work on poll)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One page of a chapter: ordinal index and image URL
///
/// Order is declared by the upstream source and preserved end to end; pages
/// are never re-sorted by URL or filename.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Page {
    /// Ordinal index as declared by the source
    pub index: u32,
    /// Image URL
    pub url: String,
}

/// A tracked unit of chapter-download work
///
/// Created by enqueue, owned by the registry, and mutated exclusively by the
/// job driver during poll-triggered invocations.
#[derive(Clone, Debug)]
pub struct Job {
    /// Unique id, assigned once at creation
    pub id: JobId,
    /// Content source the chapter belongs to
    pub source_id: String,
    /// Manga identifier within the source
    pub manga_id: String,
    /// Chapter identifier within the manga
    pub chapter_id: String,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Ordered page list; populated once resolution succeeds, immutable after
    pub pages: Vec<Page>,
    /// Next page index to download; monotonically non-decreasing
    pub cursor: usize,
    /// Staged page files in download order (skipped pages absent)
    pub staged: Vec<PathBuf>,
    /// Human-readable notes about skipped pages
    pub warnings: Vec<String>,
    /// Count of pages that failed to download
    pub failed_pages: usize,
    /// Staging directory; Some iff status is Downloading or Packaging
    pub staging_path: Option<PathBuf>,
    /// Final archive location; Some iff status is Completed
    pub artifact_path: Option<PathBuf>,
    /// Failure reason; Some iff status is Failed
    pub error: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the most recent poll (creation time before the first poll)
    pub last_polled_at: DateTime<Utc>,
}

impl Job {
    /// Create a new Pending job
    pub fn new(
        id: JobId,
        source_id: impl Into<String>,
        manga_id: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            source_id: source_id.into(),
            manga_id: manga_id.into(),
            chapter_id: chapter_id.into(),
            status: JobStatus::Pending,
            pages: Vec::new(),
            cursor: 0,
            staged: Vec::new(),
            warnings: Vec::new(),
            failed_pages: 0,
            staging_path: None,
            artifact_path: None,
            error: None,
            created_at: now,
            last_polled_at: now,
        }
    }

    /// Whether the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to Failed with the given reason
    ///
    /// Must only be called on a non-terminal job; terminal results are
    /// immutable.
    pub fn fail(&mut self, message: impl Into<String>) {
        debug_assert!(!self.is_terminal(), "fail() called on a terminal job");
        self.status = JobStatus::Failed;
        self.error = Some(message.into());
        self.staging_path = None;
    }
}

/// Request body for enqueuing a chapter download
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnqueueRequest {
    /// Content source id (e.g., "en.mangapill")
    pub source_id: String,
    /// Manga id within the source
    pub manga_id: String,
    /// Chapter id within the manga
    pub chapter_id: String,
}

/// Response body for a successful enqueue
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnqueueResponse {
    /// Opaque job id for subsequent polls
    pub job_id: JobId,
}

/// Poll response: the externally visible view of a job
///
/// In-progress jobs (internally Pending, Downloading, or Packaging) are all
/// surfaced as `PENDING` with progress counters; callers stop polling on
/// `COMPLETED` or `FAILED`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "data")]
pub enum PollResponse {
    /// Work remains; poll again to drive the next step
    #[serde(rename = "PENDING")]
    Pending {
        /// Pages accounted for so far (downloaded or skipped)
        current: usize,
        /// Total pages; 0 until resolution succeeds
        total: usize,
    },

    /// The chapter archive is ready
    #[serde(rename = "COMPLETED")]
    Completed {
        /// Location of the packaged artifact
        artifact_path: String,
        /// Notes about pages skipped under the failure policy
        warnings: Vec<String>,
    },

    /// The job failed and will make no further progress
    #[serde(rename = "FAILED")]
    Failed {
        /// Human-readable failure reason
        message: String,
    },
}

impl From<&Job> for PollResponse {
    fn from(job: &Job) -> Self {
        match job.status {
            JobStatus::Completed => PollResponse::Completed {
                artifact_path: job
                    .artifact_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                warnings: job.warnings.clone(),
            },
            JobStatus::Failed => PollResponse::Failed {
                message: job
                    .error
                    .clone()
                    .unwrap_or_else(|| "job failed".to_string()),
            },
            JobStatus::Pending | JobStatus::Downloading | JobStatus::Packaging => {
                PollResponse::Pending {
                    current: job.cursor,
                    total: job.pages.len(),
                }
            }
        }
    }
}
