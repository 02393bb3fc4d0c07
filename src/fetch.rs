//! Page fetching and staging
//!
//! Fetches one page image per call and writes it into the job's staging
//! directory. Writes go to a `.part` temp name first and are renamed into
//! place, so the archiver can never pick up a half-written page file.

use crate::error::FetchError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Filename extension used when the page URL does not reveal one
const DEFAULT_EXT: &str = "jpg";

/// HTTP fetcher for page images, with a bounded per-request timeout
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    /// Create a fetcher whose every request times out after `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch one page's bytes
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(body.to_vec())
    }

    /// Fetch one page and write it into `staging_dir` under `filename`
    ///
    /// The write is atomic with respect to readers of the staging directory:
    /// bytes land in `<filename>.part` first and are renamed on success.
    pub async fn stage(
        &self,
        staging_dir: &Path,
        filename: &str,
        url: &str,
    ) -> Result<PathBuf, FetchError> {
        let bytes = self.fetch(url).await?;

        let final_path = staging_dir.join(filename);
        let temp_path = staging_dir.join(format!("{filename}.part"));

        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &final_path).await?;

        debug!(url, path = %final_path.display(), bytes = bytes.len(), "staged page");
        Ok(final_path)
    }
}

/// Destination filename for the page at `seq` (1-based sequence number)
///
/// The name is a zero-padded sequence number, never derived from the source
/// URL, so archive entries sort identically to source order. Only the
/// extension is taken from the URL path, defaulting to "jpg".
pub(crate) fn page_filename(seq: usize, url: &str) -> String {
    let path_part = url.split(['?', '#']).next().unwrap_or(url);
    let ext = Path::new(path_part)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXT);

    format!("{seq:03}.{ext}")
}
