//! WeebCentral chapter source
//!
//! Scrapes weebcentral.com. Unlike MangaPill, the site serves search results
//! and chapter lists from dedicated HTML fragment endpoints, and the reader's
//! image URLs live on a separate `/images` endpoint per chapter.

use super::{ChapterSource, ChapterSummary, MangaSummary};
use crate::error::ResolveError;
use crate::types::Page;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://weebcentral.com";
const SOURCE_ID: &str = "en.weebcentral";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SEARCH_LIMIT: u32 = 24;

static SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(
        r#"(?s)<article[^>]*>.*?<img[^>]*src="([^"]*)"[^>]*>.*?<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>.*?</article>"#,
    )
    .unwrap()
});

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#"(?s)<a[^>]*href="([^"]*/chapters/[^"]*)"[^>]*>.*?<span[^>]*>([^<]*)</span>"#)
        .unwrap()
});

static PAGE_IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#"<img[^>]*src="([^"]*\.(?:jpe?g|png|webp))"[^>]*>"#).unwrap()
});

/// Source adapter for weebcentral.com
pub struct WeebCentral {
    client: reqwest::Client,
    base_url: String,
}

impl WeebCentral {
    /// Create a WeebCentral source with the given request timeout
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Create a WeebCentral source pointed at an alternate base URL
    ///
    /// Used by tests to scrape a local mock server instead of the live site.
    pub fn with_base_url(timeout: Duration, base_url: impl Into<String>) -> crate::Result<Self> {
        let mut source = Self::new(timeout)?;
        source.base_url = base_url.into();
        Ok(source)
    }

    async fn get_html(&self, url: &str) -> Result<String, ResolveError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Referer", &self.base_url)
            .send()
            .await
            .map_err(|e| ResolveError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ResolveError::NotFound(url.to_string()));
        }
        if status.as_u16() == 429 {
            return Err(ResolveError::RateLimited(format!("HTTP 429 from {url}")));
        }
        if !status.is_success() {
            return Err(ResolveError::Network(format!("HTTP {status} from {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| ResolveError::Network(format!("reading {url}: {e}")))
    }
}

#[async_trait]
impl ChapterSource for WeebCentral {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<MangaSummary>, ResolveError> {
        let offset = page.saturating_sub(1) * SEARCH_LIMIT;
        let url = if query.is_empty() {
            format!(
                "{}/search/data?limit={SEARCH_LIMIT}&offset={offset}&display_mode=Full%20Display&sort=Latest%20Updates&order=Descending",
                self.base_url
            )
        } else {
            format!(
                "{}/search/data?limit={SEARCH_LIMIT}&offset={offset}&display_mode=Full%20Display&text={}&sort=Relevance&order=Descending",
                self.base_url,
                urlencoding::encode(query)
            )
        };

        let html = self.get_html(&url).await?;
        let results = parse_search_results(&html, &self.base_url);
        debug!(query, page, count = results.len(), "weebcentral search");
        Ok(results)
    }

    async fn chapters(&self, manga_id: &str) -> Result<Vec<ChapterSummary>, ResolveError> {
        let url = format!(
            "{}{}/full-chapter-list",
            self.base_url,
            series_path(manga_id)
        );
        let html = self.get_html(&url).await?;

        let chapters = parse_chapters(&html, &self.base_url);
        if chapters.is_empty() {
            return Err(ResolveError::Parse(format!(
                "no chapters found for {manga_id}"
            )));
        }
        debug!(manga_id, count = chapters.len(), "weebcentral chapters");
        Ok(chapters)
    }

    async fn pages(&self, _manga_id: &str, chapter_id: &str) -> Result<Vec<Page>, ResolveError> {
        let url = format!(
            "{}{}/images?is_prev=False&reading_style=long_strip",
            self.base_url, chapter_id
        );
        let html = self.get_html(&url).await?;

        let pages = parse_pages(&html);
        if pages.is_empty() {
            return Err(ResolveError::Parse(format!(
                "no page images found for {chapter_id}"
            )));
        }
        debug!(chapter_id, count = pages.len(), "weebcentral pages");
        Ok(pages)
    }
}

/// The chapter list endpoint hangs off the series path without the trailing
/// title slug, e.g. `/series/ABC/some-title` lists at
/// `/series/ABC/full-chapter-list`.
fn series_path(manga_id: &str) -> &str {
    match manga_id.rfind('/') {
        Some(pos) if pos > 0 => &manga_id[..pos],
        _ => manga_id,
    }
}

fn parse_search_results(html: &str, base_url: &str) -> Vec<MangaSummary> {
    let mut results = Vec::new();

    for cap in SEARCH_RE.captures_iter(html) {
        let cover_url = cap.get(1).map(|m| m.as_str().to_string());
        let href = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
        let mut title = cap
            .get(3)
            .map(|m| decode_html_entities(m.as_str()))
            .unwrap_or_default();

        // The site prefixes licensed series with "Official "
        if let Some(stripped) = title.strip_prefix("Official ") {
            title = stripped.trim().to_string();
        }

        // Result links are absolute; ids are site-local paths
        let id = href.strip_prefix(base_url).unwrap_or(href).to_string();

        if !id.is_empty() && !title.is_empty() {
            results.push(MangaSummary {
                id,
                title,
                cover_url: cover_url.filter(|u| !u.is_empty()),
            });
        }
    }

    results
}

fn parse_chapters(html: &str, base_url: &str) -> Vec<ChapterSummary> {
    let mut chapters = Vec::new();

    for (position, cap) in CHAPTER_RE.captures_iter(html).enumerate() {
        let href = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let label = cap.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

        let id = href.strip_prefix(base_url).unwrap_or(href).to_string();
        if id.is_empty() {
            continue;
        }

        // Labels read "Chapter 123" or "Episode 4.5"; the number is the
        // trailing token. Unnumbered entries fall back to list position.
        let number = label
            .rsplit(' ')
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .unwrap_or(position as f64);

        chapters.push(ChapterSummary {
            id,
            number,
            title: if label.is_empty() {
                format!("Chapter {number}")
            } else {
                label.to_string()
            },
        });
    }

    // Newest first, matching the site's listing convention
    chapters.sort_by(|a, b| {
        b.number
            .partial_cmp(&a.number)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    chapters
}

fn parse_pages(html: &str) -> Vec<Page> {
    PAGE_IMG_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .enumerate()
        .map(|(i, url)| Page {
            index: i as u32 + 1,
            url: url.as_str().to_string(),
        })
        .collect()
}

fn decode_html_entities(input: &str) -> String {
    input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}
