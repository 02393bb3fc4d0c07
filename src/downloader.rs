//! Public facade for the chapter download engine
//!
//! [`ChapterDownloader`] owns the registry, the driver, and the source set.
//! Hosts call [`ChapterDownloader::enqueue`] to register work and
//! [`ChapterDownloader::poll`] to drive it; each poll performs exactly one
//! bounded unit of work and returns the job's externally visible state.

use crate::config::Config;
use crate::driver::JobDriver;
use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::registry::{JobHandle, JobRegistry};
use crate::source::{MangaPill, SourceRegistry, WeebCentral};
use crate::types::{JobId, PollResponse};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// The chapter download engine
///
/// Cheap to clone behind `Arc`s; all state lives in the shared registry.
pub struct ChapterDownloader {
    config: Arc<Config>,
    registry: Arc<JobRegistry>,
    driver: Arc<JobDriver>,
    sources: Arc<SourceRegistry>,
}

impl ChapterDownloader {
    /// Create a downloader with the built-in sources registered
    pub fn new(config: Config) -> Result<Self> {
        let mut sources = SourceRegistry::new();
        sources.register(Arc::new(MangaPill::new(config.download.resolve_timeout())?));
        sources.register(Arc::new(WeebCentral::new(
            config.download.resolve_timeout(),
        )?));
        Self::with_sources(config, sources)
    }

    /// Create a downloader over a caller-supplied source set
    pub fn with_sources(config: Config, sources: SourceRegistry) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let fetcher = PageFetcher::new(config.download.fetch_timeout())?;
        let registry = Arc::new(JobRegistry::new());
        let sources = Arc::new(sources);
        let driver = Arc::new(JobDriver::new(sources.clone(), fetcher, config.clone()));

        Ok(Self {
            config,
            registry,
            driver,
            sources,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The registered content sources
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Register a chapter download and return its job id
    ///
    /// Performs no network or filesystem work; all I/O is deferred to polls.
    pub async fn enqueue(
        &self,
        source_id: &str,
        manga_id: &str,
        chapter_id: &str,
    ) -> Result<JobId> {
        for (value, key) in [
            (source_id, "source_id"),
            (manga_id, "manga_id"),
            (chapter_id, "chapter_id"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{key} must not be empty"),
                    key: Some(key.to_string()),
                });
            }
        }

        let id = self.registry.create(source_id, manga_id, chapter_id).await;
        info!(job_id = %id, source_id, manga_id, chapter_id, "chapter download enqueued");
        Ok(id)
    }

    /// Poll a job: perform one unit of work and report its state
    ///
    /// Unknown ids answer with a `FAILED` body rather than an error, so a
    /// caller that polls past eviction gets a well-formed terminal response.
    /// Polls on the same job serialize on the job's own lock.
    pub async fn poll(&self, id: &JobId) -> PollResponse {
        let Some(handle) = self.registry.get(id).await else {
            return PollResponse::Failed {
                message: format!("unknown job: {id}"),
            };
        };
        self.drive(id, handle).await
    }

    /// Drive one step of a job whose handle has already been looked up
    ///
    /// The eviction sweep can remove the job between the registry lookup and
    /// acquiring its lock (the sweep's `try_lock` succeeds while the poll is
    /// still waiting on the map lock). Membership is re-checked under the job
    /// lock: an evicted job is never stepped, so its reclaimed staging
    /// directory is never recreated. Once membership is confirmed the sweep
    /// cannot evict the job until the lock is released, and the refreshed
    /// `last_polled_at` keeps it out of the next sweep.
    async fn drive(&self, id: &JobId, handle: JobHandle) -> PollResponse {
        let mut job = handle.lock().await;
        if self.registry.get(id).await.is_none() {
            return PollResponse::Failed {
                message: format!("unknown job: {id}"),
            };
        }

        job.last_polled_at = Utc::now();
        self.driver.step(&mut job).await;
        PollResponse::from(&*job)
    }

    /// Evict jobs not polled within the configured TTL and reclaim their
    /// staging directories
    ///
    /// Completed artifacts are kept; only registry entries and staging
    /// leftovers go. Returns the number of jobs evicted.
    pub async fn evict_expired(&self) -> usize {
        let evicted = self
            .registry
            .evict_expired(self.config.retention.job_ttl())
            .await;

        let count = evicted.len();
        for mut job in evicted {
            self.driver.discard_staging(&mut job).await;
        }
        count
    }

    /// Spawn the background eviction sweep
    ///
    /// Runs until the returned handle is aborted or the runtime shuts down.
    pub fn spawn_eviction_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let downloader = self.clone();
        let interval = downloader.config.retention.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh process
            // does not sweep at startup.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let evicted = downloader.evict_expired().await;
                if evicted > 0 {
                    warn!(evicted, "eviction sweep reclaimed abandoned jobs");
                }
            }
        })
    }

    /// Number of jobs currently tracked
    pub async fn job_count(&self) -> usize {
        self.registry.len().await
    }
}
