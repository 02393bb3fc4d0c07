//! Configuration types for chapter-dl

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

/// Download behavior configuration (directories, timeouts, failure policy)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Output directory for completed chapter archives (default: "./chapters")
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: PathBuf,

    /// Staging directory for in-flight page files (default: "./staging")
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Per-page fetch timeout in seconds (default: 60)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Page list resolution timeout in seconds (default: 30)
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,

    /// Maximum page failure ratio before the job is failed (default: 0.5)
    ///
    /// Individual page failures are skipped and recorded as warnings. When the
    /// ratio of failed pages to total pages exceeds this threshold at the end
    /// of the download phase, the job is marked failed instead of packaged.
    #[serde(default = "default_max_failure_ratio")]
    pub max_failure_ratio: f64,
}

impl DownloadConfig {
    /// Per-page fetch timeout as a [`Duration`]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Resolution timeout as a [`Duration`]
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chapters_dir: default_chapters_dir(),
            staging_dir: default_staging_dir(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            resolve_timeout_secs: default_resolve_timeout_secs(),
            max_failure_ratio: default_max_failure_ratio(),
        }
    }
}

/// Retention policy for abandoned jobs
///
/// Jobs that stop being polled keep their registry entries and staging
/// directories until the TTL expires; the eviction sweep then reclaims both.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Seconds since the last poll before a job is evicted (default: 3600)
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// Interval between eviction sweeps in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    /// Job TTL as a [`Duration`]
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    /// Sweep interval as a [`Duration`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            job_ttl_secs: default_job_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// REST API configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address the API server binds to (default: 127.0.0.1:7070)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Whether CORS headers are emitted (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for [`ChapterDownloader`](crate::ChapterDownloader)
///
/// Fields are organized into logical sub-configs, flattened for a flat
/// JSON/TOML serialization format:
/// - [`download`](DownloadConfig) — directories, timeouts, failure policy
/// - [`retention`](RetentionConfig) — TTL eviction of abandoned jobs
/// - [`server`](ApiConfig) — REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Job retention settings
    #[serde(flatten)]
    pub retention: RetentionConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning a descriptive error for the
    /// first invalid setting found
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.download.max_failure_ratio) {
            return Err(crate::Error::Config {
                message: format!(
                    "max_failure_ratio must be between 0.0 and 1.0, got {}",
                    self.download.max_failure_ratio
                ),
                key: Some("max_failure_ratio".to_string()),
            });
        }
        if self.download.fetch_timeout_secs == 0 {
            return Err(crate::Error::Config {
                message: "fetch_timeout_secs must be greater than 0".to_string(),
                key: Some("fetch_timeout_secs".to_string()),
            });
        }
        if self.download.resolve_timeout_secs == 0 {
            return Err(crate::Error::Config {
                message: "resolve_timeout_secs must be greater than 0".to_string(),
                key: Some("resolve_timeout_secs".to_string()),
            });
        }
        Ok(())
    }
}

fn default_chapters_dir() -> PathBuf {
    PathBuf::from("./chapters")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./staging")
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_resolve_timeout_secs() -> u64 {
    30
}

fn default_max_failure_ratio() -> f64 {
    0.5
}

fn default_job_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_bind_address() -> SocketAddr {
    #[allow(clippy::unwrap_used)] // literal address always parses
    "127.0.0.1:7070".parse().unwrap()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
