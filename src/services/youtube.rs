// YouTube page scraper
// No API key: titles come from the watch page's <title> element and channel
// names from the Open Graph title of a search results page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use super::lookup::MetadataSource;

const YOUTUBE_BASE: &str = "https://www.youtube.com";
const TITLE_SUFFIX: &str = " - YouTube";
const CLIENT_USER_AGENT: &str = concat!("tube-renamer/", env!("CARGO_PKG_VERSION"));

static SEL_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static SEL_OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

/// YouTube page client
pub struct YouTubeClient {
    client: Client,
    base_url: String,
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self::with_base_url(YOUTUBE_BASE)
    }

    /// Point the client at another host (mirrors, local test servers)
    pub fn with_base_url(base_url: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        // Keep titles in a predictable language
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .default_headers(headers)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!(
            "{}/watch?v={}",
            self.base_url,
            urlencoding::encode(video_id)
        )
    }

    pub fn search_url(&self, channel_id: &str) -> String {
        format!(
            "{}/results?search_query={}",
            self.base_url,
            urlencoding::encode(channel_id)
        )
    }

    /// GET a page, returning None for non-success statuses
    async fn get_page(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            tracing::debug!("YouTube request to {} returned {}", url, response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for YouTubeClient {
    async fn video_title(&self, video_id: &str) -> Result<Option<String>> {
        let url = self.watch_url(video_id);
        tracing::debug!("Fetching URL: {}", url);

        let Some(html) = self.get_page(&url).await? else {
            return Ok(None);
        };
        let title = extract_page_title(&html);
        tracing::debug!("Extracted title for {}: {:?}", video_id, title);
        Ok(title)
    }

    async fn channel_name(&self, channel_id: &str) -> Result<Option<String>> {
        let url = self.search_url(channel_id);
        tracing::debug!("Fetching channel page: {}", url);

        let Some(html) = self.get_page(&url).await? else {
            return Ok(None);
        };
        Ok(extract_og_title(&html))
    }
}

/// Text of the document's <title>, without the site suffix
///
/// Unavailable videos have a bare " - YouTube" title; that yields None.
pub fn extract_page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let raw: String = document.select(&SEL_TITLE).next()?.text().collect();
    let title = raw.trim();
    let title = title
        .strip_suffix(TITLE_SUFFIX.trim_start())
        .unwrap_or(title)
        .trim();

    if title.is_empty() || title == "YouTube" {
        None
    } else {
        Some(title.to_string())
    }
}

/// `content` of `<meta property="og:title">`
pub fn extract_og_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SEL_OG_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}
