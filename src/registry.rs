//! Process-wide job registry
//!
//! The single source of truth for job progress. The outer lock guards map
//! membership only; each job carries its own mutex so driver invocations on
//! the same job serialize while independent jobs progress concurrently.

use crate::types::{Job, JobId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Shared handle to one job's state
pub type JobHandle = Arc<Mutex<Job>>;

/// Registry mapping job ids to job state
///
/// Constructed once at startup and injected into the facade; entries live
/// until evicted by TTL.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobHandle>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Pending job and return its id
    ///
    /// Performs no I/O; the first poll does the resolution work.
    pub async fn create(
        &self,
        source_id: impl Into<String>,
        manga_id: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> JobId {
        let id = JobId::new();
        let job = Job::new(id, source_id, manga_id, chapter_id);
        debug!(job_id = %id, "job created");

        self.jobs
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(job)));
        id
    }

    /// Look up a job handle by id
    pub async fn get(&self, id: &JobId) -> Option<JobHandle> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Number of registered jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the registry holds no jobs
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Remove jobs whose last poll is older than `ttl`, returning snapshots
    /// of the evicted jobs so the caller can reclaim their staging
    /// directories
    ///
    /// Jobs currently locked by an in-flight poll are skipped and picked up
    /// by a later sweep.
    pub async fn evict_expired(&self, ttl: Duration) -> Vec<Job> {
        let cutoff = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::MAX);
        let now = Utc::now();

        let mut map = self.jobs.write().await;
        let mut evicted = Vec::new();

        map.retain(|id, handle| {
            let Ok(job) = handle.try_lock() else {
                // Mid-poll; definitionally not abandoned
                return true;
            };
            if now.signed_duration_since(job.last_polled_at) > cutoff {
                debug!(job_id = %id, status = ?job.status, "evicting expired job");
                evicted.push(job.clone());
                false
            } else {
                true
            }
        });

        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted expired jobs");
        }
        evicted
    }
}
