//! The job state machine
//!
//! Each invocation of [`JobDriver::step`] performs exactly one bounded unit of
//! work — the resolve call, one page download, or the packaging pass — and
//! records the resulting transition on the job. The host poll loop drives it;
//! nothing here spans more than one call.
//!
//! Transitions move forward only: Pending → Downloading → Packaging →
//! Completed, with Failed reachable from any non-terminal state. Terminal
//! states are no-ops so polling a finished job is idempotent and
//! side-effect-free.

use crate::archive::CbzWriter;
use crate::config::Config;
use crate::error::ResolveError;
use crate::fetch::{PageFetcher, page_filename};
use crate::source::SourceRegistry;
use crate::types::{Job, JobStatus};
use crate::utils::sanitize_id;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes one bounded unit of work per call against a job
pub struct JobDriver {
    sources: Arc<SourceRegistry>,
    fetcher: PageFetcher,
    config: Arc<Config>,
}

impl JobDriver {
    /// Create a driver over the given sources and fetcher
    pub fn new(sources: Arc<SourceRegistry>, fetcher: PageFetcher, config: Arc<Config>) -> Self {
        Self {
            sources,
            fetcher,
            config,
        }
    }

    /// Advance the job by exactly one unit of work
    ///
    /// Terminal jobs are returned unchanged. All failures are recorded on the
    /// job itself; this method never surfaces an error to the poll loop.
    pub async fn step(&self, job: &mut Job) {
        match job.status {
            JobStatus::Pending => self.resolve_step(job).await,
            JobStatus::Downloading => self.download_step(job).await,
            JobStatus::Packaging => self.package_step(job).await,
            JobStatus::Completed | JobStatus::Failed => {}
        }
    }

    /// Pending → Downloading (or Failed): resolve the chapter's page list
    async fn resolve_step(&self, job: &mut Job) {
        let source = match self.sources.get(&job.source_id) {
            Ok(source) => source,
            Err(e) => {
                warn!(job_id = %job.id, source_id = %job.source_id, "enqueued for unknown source");
                job.fail(e.to_string());
                return;
            }
        };

        // Sources are third-party trait impls; bound the call here so a poll
        // can never hang indefinitely.
        let timeout = self.config.download.resolve_timeout();
        let resolved =
            tokio::time::timeout(timeout, source.pages(&job.manga_id, &job.chapter_id)).await;

        let pages = match resolved {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                warn!(job_id = %job.id, error = %e, "page list resolution failed");
                job.fail(e.to_string());
                return;
            }
            Err(_) => {
                let e = ResolveError::Timeout {
                    seconds: self.config.download.resolve_timeout_secs,
                };
                warn!(job_id = %job.id, error = %e, "page list resolution timed out");
                job.fail(e.to_string());
                return;
            }
        };

        if pages.is_empty() {
            job.fail(format!("chapter {} has no pages", job.chapter_id));
            return;
        }

        let staging = self.staging_path_for(job);
        if let Err(e) = tokio::fs::create_dir_all(&staging).await {
            job.fail(format!("failed to create staging directory: {e}"));
            return;
        }

        info!(
            job_id = %job.id,
            pages = pages.len(),
            staging = %staging.display(),
            "page list resolved"
        );
        job.pages = pages;
        job.cursor = 0;
        job.staging_path = Some(staging);
        job.status = JobStatus::Downloading;
    }

    /// Downloading: fetch exactly one page, then advance the cursor
    ///
    /// A failed page is skipped and recorded as a warning so the job cannot
    /// stall forever on one unreachable page. When the cursor reaches the end
    /// the failure ratio decides between Packaging and Failed.
    async fn download_step(&self, job: &mut Job) {
        debug_assert!(job.cursor < job.pages.len(), "download step past the last page");

        let Some(staging) = job.staging_path.clone() else {
            job.fail("staging directory missing while downloading");
            return;
        };

        let page = job.pages[job.cursor].clone();
        let filename = page_filename(job.cursor + 1, &page.url);

        match self.fetcher.stage(&staging, &filename, &page.url).await {
            Ok(path) => {
                debug!(job_id = %job.id, page = page.index, file = %path.display(), "page downloaded");
                job.staged.push(path);
            }
            Err(e) => {
                warn!(job_id = %job.id, page = page.index, error = %e, "page download failed, skipping");
                job.warnings.push(format!("page {}: {e}", page.index));
                job.failed_pages += 1;
            }
        }

        job.cursor += 1;

        if job.cursor == job.pages.len() {
            let ratio = job.failed_pages as f64 / job.pages.len() as f64;
            if ratio > self.config.download.max_failure_ratio {
                self.discard_staging(job).await;
                job.fail(format!(
                    "{} of {} pages failed to download",
                    job.failed_pages,
                    job.pages.len()
                ));
            } else {
                job.status = JobStatus::Packaging;
            }
        }
    }

    /// Packaging → Completed (or Failed): archive the staged pages
    async fn package_step(&self, job: &mut Job) {
        let target = self
            .config
            .download
            .chapters_dir
            .join(sanitize_id(&job.manga_id))
            .join(format!("{}.cbz", sanitize_id(&job.chapter_id)));

        match CbzWriter::pack(job.staged.clone(), target.clone()).await {
            Ok(()) => {
                self.discard_staging(job).await;
                info!(job_id = %job.id, artifact = %target.display(), "job completed");
                job.artifact_path = Some(target);
                job.status = JobStatus::Completed;
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "packaging failed");
                self.discard_staging(job).await;
                job.fail(e.to_string());
            }
        }
    }

    /// Staging directory for a job, derived deterministically from its
    /// identifiers so cleanup tooling can reconstruct it
    fn staging_path_for(&self, job: &Job) -> PathBuf {
        self.config.download.staging_dir.join(format!(
            "{}_{}_{}",
            sanitize_id(&job.source_id),
            sanitize_id(&job.manga_id),
            sanitize_id(&job.chapter_id)
        ))
    }

    /// Remove the job's staging directory and contents, best effort
    pub(crate) async fn discard_staging(&self, job: &mut Job) {
        if let Some(staging) = job.staging_path.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(staging = %staging.display(), error = %e, "failed to remove staging directory");
                }
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::source::{ChapterSource, ChapterSummary, MangaSummary};
    use crate::types::{JobId, Page, PollResponse};
    use async_trait::async_trait;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STUB_SOURCE_ID: &str = "test.stub";

    /// What the stub source answers to a pages() call
    enum StubOutcome {
        Pages(Vec<Page>),
        NotFound,
        Empty,
        Hang,
    }

    struct StubSource {
        outcome: StubOutcome,
    }

    #[async_trait]
    impl ChapterSource for StubSource {
        fn id(&self) -> &str {
            STUB_SOURCE_ID
        }

        async fn search(&self, _: &str, _: u32) -> Result<Vec<MangaSummary>, ResolveError> {
            Ok(vec![])
        }

        async fn chapters(&self, _: &str) -> Result<Vec<ChapterSummary>, ResolveError> {
            Ok(vec![])
        }

        async fn pages(&self, _: &str, chapter_id: &str) -> Result<Vec<Page>, ResolveError> {
            match &self.outcome {
                StubOutcome::Pages(pages) => Ok(pages.clone()),
                StubOutcome::NotFound => Err(ResolveError::NotFound(chapter_id.to_string())),
                StubOutcome::Empty => Ok(vec![]),
                StubOutcome::Hang => {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
            }
        }
    }

    struct Harness {
        driver: JobDriver,
        config: Arc<Config>,
        _dirs: (TempDir, TempDir),
    }

    fn harness(outcome: StubOutcome) -> Harness {
        let staging = TempDir::new().unwrap();
        let chapters = TempDir::new().unwrap();

        let mut config = Config::default();
        config.download.staging_dir = staging.path().to_path_buf();
        config.download.chapters_dir = chapters.path().to_path_buf();
        config.download.fetch_timeout_secs = 5;
        config.download.resolve_timeout_secs = 5;
        let config = Arc::new(config);

        let mut sources = SourceRegistry::new();
        sources.register(Arc::new(StubSource { outcome }));

        let driver = JobDriver::new(
            Arc::new(sources),
            PageFetcher::new(config.download.fetch_timeout()).unwrap(),
            config.clone(),
        );

        Harness {
            driver,
            config,
            _dirs: (staging, chapters),
        }
    }

    fn new_job() -> Job {
        Job::new(JobId::new(), STUB_SOURCE_ID, "manga-1", "chapter-1")
    }

    async fn mount_page(server: &MockServer, name: &str, body: &[u8]) -> String {
        Mock::given(method("GET"))
            .and(path(format!("/pages/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
        format!("{}/pages/{name}", server.uri())
    }

    async fn mount_broken_page(server: &MockServer, name: &str) -> String {
        Mock::given(method("GET"))
            .and(path(format!("/pages/{name}")))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
        format!("{}/pages/{name}", server.uri())
    }

    fn archive_entry_names(artifact: &std::path::Path) -> Vec<String> {
        let file = std::fs::File::open(artifact).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    // Scenario A: three healthy pages complete in exactly resolve + 3
    // downloads + package = 5 steps, archived as 001..003 in source order.
    #[tokio::test]
    async fn three_page_chapter_completes_in_five_steps_with_ordered_entries() {
        let server = MockServer::start().await;
        let pages = vec![
            Page {
                index: 1,
                url: mount_page(&server, "a.jpg", b"page-a").await,
            },
            Page {
                index: 2,
                url: mount_page(&server, "b.jpg", b"page-b").await,
            },
            Page {
                index: 3,
                url: mount_page(&server, "c.jpg", b"page-c").await,
            },
        ];
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        let mut steps = 0;
        while !job.is_terminal() {
            h.driver.step(&mut job).await;
            steps += 1;
            assert!(steps <= 10, "job did not terminate");
        }

        assert_eq!(steps, 5);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.warnings.is_empty());

        let artifact = job.artifact_path.clone().unwrap();
        assert_eq!(
            archive_entry_names(&artifact),
            vec!["001.jpg", "002.jpg", "003.jpg"]
        );

        // Entry content follows source order, not URL order
        let file = std::fs::File::open(&artifact).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut first = Vec::new();
        std::io::Read::read_to_end(&mut archive.by_index(0).unwrap(), &mut first).unwrap();
        assert_eq!(first, b"page-a");
    }

    #[tokio::test]
    async fn each_step_advances_the_cursor_by_at_most_one() {
        let server = MockServer::start().await;
        let pages = vec![
            Page {
                index: 1,
                url: mount_page(&server, "a.jpg", b"a").await,
            },
            Page {
                index: 2,
                url: mount_page(&server, "b.jpg", b"b").await,
            },
        ];
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        while !job.is_terminal() {
            let before = job.cursor;
            h.driver.step(&mut job).await;
            assert!(job.cursor <= before + 1, "a single poll advanced more than one page");
        }
    }

    #[tokio::test]
    async fn completion_is_never_reached_before_n_plus_2_steps() {
        let server = MockServer::start().await;
        let pages = vec![
            Page {
                index: 1,
                url: mount_page(&server, "a.jpg", b"a").await,
            },
            Page {
                index: 2,
                url: mount_page(&server, "b.jpg", b"b").await,
            },
            Page {
                index: 3,
                url: mount_page(&server, "c.jpg", b"c").await,
            },
            Page {
                index: 4,
                url: mount_page(&server, "d.jpg", b"d").await,
            },
        ];
        let n = pages.len();
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        for _ in 0..(n + 1) {
            h.driver.step(&mut job).await;
            assert_ne!(job.status, JobStatus::Completed, "completed too early");
        }
        h.driver.step(&mut job).await;
        assert_eq!(job.status, JobStatus::Completed);
    }

    // Scenario B: resolver NotFound fails the job on the first step with no
    // staging directory created.
    #[tokio::test]
    async fn resolver_not_found_fails_immediately_without_staging() {
        let h = harness(StubOutcome::NotFound);
        let mut job = new_job();

        h.driver.step(&mut job).await;

        assert_eq!(job.status, JobStatus::Failed);
        let message = job.error.clone().unwrap();
        assert!(message.contains("not found"), "got: {message}");
        assert!(job.staging_path.is_none());

        let staged_dirs: Vec<_> = std::fs::read_dir(&h.config.download.staging_dir)
            .unwrap()
            .collect();
        assert!(staged_dirs.is_empty(), "no staging directory may exist");
    }

    // Scenario C: one of three pages fails; skip-and-continue still completes
    // with two archived entries and one warning, and the cursor passes the
    // broken page.
    #[tokio::test]
    async fn failed_page_is_skipped_and_job_still_completes() {
        let server = MockServer::start().await;
        let pages = vec![
            Page {
                index: 1,
                url: mount_page(&server, "a.jpg", b"a").await,
            },
            Page {
                index: 2,
                url: mount_broken_page(&server, "b.jpg").await,
            },
            Page {
                index: 3,
                url: mount_page(&server, "c.jpg", b"c").await,
            },
        ];
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        while !job.is_terminal() {
            h.driver.step(&mut job).await;
        }

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.cursor, 3);
        assert_eq!(job.warnings.len(), 1);
        assert!(job.warnings[0].starts_with("page 2:"), "got: {}", job.warnings[0]);

        let artifact = job.artifact_path.clone().unwrap();
        assert_eq!(archive_entry_names(&artifact), vec!["001.jpg", "003.jpg"]);
    }

    #[tokio::test]
    async fn exceeding_the_failure_ratio_fails_the_job_and_discards_staging() {
        let server = MockServer::start().await;
        let pages = vec![
            Page {
                index: 1,
                url: mount_broken_page(&server, "a.jpg").await,
            },
            Page {
                index: 2,
                url: mount_broken_page(&server, "b.jpg").await,
            },
            Page {
                index: 3,
                url: mount_page(&server, "c.jpg", b"c").await,
            },
        ];
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        while !job.is_terminal() {
            h.driver.step(&mut job).await;
        }

        // 2/3 failed > default 0.5 ratio
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.clone().unwrap().contains("2 of 3 pages failed"));
        assert!(job.artifact_path.is_none());

        let staged_dirs: Vec<_> = std::fs::read_dir(&h.config.download.staging_dir)
            .unwrap()
            .collect();
        assert!(staged_dirs.is_empty(), "staging must be reclaimed on failure");
    }

    #[tokio::test]
    async fn empty_page_list_fails_resolution() {
        let h = harness(StubOutcome::Empty);
        let mut job = new_job();

        h.driver.step(&mut job).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.clone().unwrap().contains("no pages"));
    }

    #[tokio::test]
    async fn unknown_source_fails_on_first_step() {
        let h = harness(StubOutcome::Empty);
        let mut job = Job::new(JobId::new(), "en.nowhere", "m", "c");

        h.driver.step(&mut job).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.clone().unwrap().contains("unknown source"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_resolver_is_bounded_by_the_timeout() {
        let h = harness(StubOutcome::Hang);
        let mut job = new_job();

        h.driver.step(&mut job).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.clone().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn terminal_jobs_are_returned_unchanged() {
        let server = MockServer::start().await;
        let pages = vec![Page {
            index: 1,
            url: mount_page(&server, "a.jpg", b"a").await,
        }];
        let h = harness(StubOutcome::Pages(pages));
        let mut job = new_job();

        while !job.is_terminal() {
            h.driver.step(&mut job).await;
        }

        let first = serde_json::to_string(&PollResponse::from(&job)).unwrap();
        for _ in 0..3 {
            h.driver.step(&mut job).await;
            let again = serde_json::to_string(&PollResponse::from(&job)).unwrap();
            assert_eq!(first, again, "terminal polls must be bit-identical");
        }
    }

    #[tokio::test]
    async fn packaging_zero_staged_files_fails_without_artifact() {
        // All pages fail but the ratio threshold is disabled, so the job
        // reaches packaging with nothing staged.
        let server = MockServer::start().await;
        let pages = vec![Page {
            index: 1,
            url: mount_broken_page(&server, "a.jpg").await,
        }];

        let staging = TempDir::new().unwrap();
        let chapters = TempDir::new().unwrap();
        let mut config = Config::default();
        config.download.staging_dir = staging.path().to_path_buf();
        config.download.chapters_dir = chapters.path().to_path_buf();
        config.download.max_failure_ratio = 1.0;
        let config = Arc::new(config);

        let mut sources = SourceRegistry::new();
        sources.register(Arc::new(StubSource {
            outcome: StubOutcome::Pages(pages),
        }));
        let driver = JobDriver::new(
            Arc::new(sources),
            PageFetcher::new(config.download.fetch_timeout()).unwrap(),
            config.clone(),
        );

        let mut job = new_job();
        while !job.is_terminal() {
            driver.step(&mut job).await;
        }

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.clone().unwrap().contains("no staged pages"));
        assert!(job.artifact_path.is_none());
    }
}
