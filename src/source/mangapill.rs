//! MangaPill chapter source
//!
//! Scrapes mangapill.com search, chapter, and page listings. Page order is
//! taken from document order of the reader's image tags.

use super::{ChapterSource, ChapterSummary, MangaSummary};
use crate::error::ResolveError;
use crate::types::Page;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.mangapill.com";
const SOURCE_ID: &str = "en.mangapill";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(
        r#"<a[^>]*href="(/manga/[^"]*)"[^>]*>.*?<img[^>]*src="([^"]*)"[^>]*>.*?<h3[^>]*>([^<]*)</h3>"#,
    )
    .unwrap()
});

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#"<a[^>]*href="(/chapters/[^"]*)"[^>]*>[^<]*Chapter\s*(\d+)\.?(\d*)"#).unwrap()
});

static PAGE_IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r#"data-src="([^"]*cdn[^"]*)"[^>]*>"#).unwrap()
});

/// Source adapter for mangapill.com
pub struct MangaPill {
    client: reqwest::Client,
    base_url: String,
}

impl MangaPill {
    /// Create a MangaPill source with the given request timeout
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Create a MangaPill source pointed at an alternate base URL
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
impl ChapterSource for MangaPill {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<MangaSummary>, ResolveError> {
        let url = if query.is_empty() {
            format!("{}/updates?page={}", self.base_url, page)
        } else {
            format!(
                "{}/search?q={}&page={}",
                self.base_url,
                urlencoding::encode(query),
                page
            )
        };

        let html = self.get_html(&url).await?;
        let results = parse_search_results(&html);
        debug!(query, page, count = results.len(), "mangapill search");
        Ok(results)
    }

    async fn chapters(&self, manga_id: &str) -> Result<Vec<ChapterSummary>, ResolveError> {
        let url = format!("{}{}", self.base_url, manga_id);
        let html = self.get_html(&url).await?;

        let chapters = parse_chapters(&html);
        if chapters.is_empty() {
            return Err(ResolveError::Parse(format!(
                "no chapters found for {manga_id}"
            )));
        }
        debug!(manga_id, count = chapters.len(), "mangapill chapters");
        Ok(chapters)
    }

    async fn pages(&self, _manga_id: &str, chapter_id: &str) -> Result<Vec<Page>, ResolveError> {
        let url = format!("{}{}", self.base_url, chapter_id);
        let html = self.get_html(&url).await?;

        let pages = parse_pages(&html);
        if pages.is_empty() {
            return Err(ResolveError::Parse(format!(
                "no page images found for {chapter_id}"
            )));
        }
        debug!(chapter_id, count = pages.len(), "mangapill pages");
        Ok(pages)
    }
}

fn parse_search_results(html: &str) -> Vec<MangaSummary> {
    let mut results = Vec::new();

    for cap in SEARCH_RE.captures_iter(html) {
        let id = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let cover_url = cap.get(2).map(|m| m.as_str().to_string());
        let title = cap
            .get(3)
            .map(|m| decode_html_entities(m.as_str()))
            .unwrap_or_default();

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

fn parse_chapters(html: &str) -> Vec<ChapterSummary> {
    let mut chapters = Vec::new();

    for cap in CHAPTER_RE.captures_iter(html) {
        let id = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let whole = cap.get(2).map(|m| m.as_str()).unwrap_or("0");
        let decimal = cap.get(3).map(|m| m.as_str()).unwrap_or("");

        let number_str = if decimal.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{decimal}")
        };
        let number = number_str.parse::<f64>().unwrap_or(0.0);

        if !id.is_empty() {
            chapters.push(ChapterSummary {
                id,
                number,
                title: format!("Chapter {number_str}"),
            });
        }
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

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const READER_HTML: &str = r#"
        <html><body>
        <img data-src="https://cdn.example/pages/0001.jpg" alt="page 1">
        <img data-src="https://cdn.example/pages/0002.jpg" alt="page 2">
        <img data-src="https://cdn.example/pages/0003.png" alt="page 3">
        </body></html>
    "#;

    const CHAPTER_LIST_HTML: &str = r#"
        <html><body>
        <a href="/chapters/9-10002000/demo-chapter-2">Chapter 2</a>
        <a href="/chapters/9-10001500/demo-chapter-1-5">Chapter 1.5</a>
        <a href="/chapters/9-10001000/demo-chapter-1">Chapter 1</a>
        </body></html>
    "#;

    #[test]
    fn parse_pages_preserves_document_order() {
        let pages = parse_pages(READER_HTML);

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].index, 1);
        assert_eq!(pages[0].url, "https://cdn.example/pages/0001.jpg");
        assert_eq!(pages[2].index, 3);
        assert_eq!(pages[2].url, "https://cdn.example/pages/0003.png");
    }

    #[test]
    fn parse_chapters_extracts_fractional_numbers_newest_first() {
        let chapters = parse_chapters(CHAPTER_LIST_HTML);

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].number, 2.0);
        assert_eq!(chapters[1].number, 1.5);
        assert_eq!(chapters[1].title, "Chapter 1.5");
        assert_eq!(chapters[2].id, "/chapters/9-10001000/demo-chapter-1");
    }

    #[test]
    fn parse_search_results_decodes_entities() {
        let html = r#"<a href="/manga/1/demo"><img src="https://cdn.example/c.jpg"><h3>Tom &amp; Jerry</h3></a>"#;
        let results = parse_search_results(html);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "/manga/1/demo");
        assert_eq!(results[0].title, "Tom & Jerry");
        assert_eq!(
            results[0].cover_url.as_deref(),
            Some("https://cdn.example/c.jpg")
        );
    }

    #[tokio::test]
    async fn pages_hits_the_chapter_url_and_parses_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chapters/9-10001000/demo-chapter-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(READER_HTML))
            .mount(&server)
            .await;

        let source =
            MangaPill::with_base_url(Duration::from_secs(5), server.uri()).unwrap();
        let pages = source
            .pages("/manga/9/demo", "/chapters/9-10001000/demo-chapter-1")
            .await
            .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].url, "https://cdn.example/pages/0002.jpg");
    }

    #[tokio::test]
    async fn missing_chapter_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source =
            MangaPill::with_base_url(Duration::from_secs(5), server.uri()).unwrap();
        let err = source.pages("/manga/9", "/chapters/missing").await.unwrap_err();

        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn throttled_response_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source =
            MangaPill::with_base_url(Duration::from_secs(5), server.uri()).unwrap();
        let err = source.pages("/manga/9", "/chapters/9-1").await.unwrap_err();

        assert!(matches!(err, ResolveError::RateLimited(_)));
    }

    #[tokio::test]
    async fn reader_page_without_images_maps_to_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nothing here</body></html>"))
            .mount(&server)
            .await;

        let source =
            MangaPill::with_base_url(Duration::from_secs(5), server.uri()).unwrap();
        let err = source.pages("/manga/9", "/chapters/9-1").await.unwrap_err();

        assert!(matches!(err, ResolveError::Parse(_)));
    }
}
