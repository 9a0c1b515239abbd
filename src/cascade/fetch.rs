//! Raw HTML fetch stage: a plain GET with a browser User-Agent, a title
//! sniff, and a scanner pass over the body.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::Url;

use super::{Extraction, ExtractionStrategy, Payload};
use crate::scan;
use crate::{ExtractionError, Result};

/// Some hosts return empty or stub pages to obvious non-browser clients
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

pub struct RawHtmlStrategy {
    client: Client,
}

impl RawHtmlStrategy {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ExtractionStrategy for RawHtmlStrategy {
    fn name(&self) -> &'static str {
        "raw-html"
    }

    async fn run(&self, url: &str) -> Result<Extraction> {
        let base = Url::parse(url)?;

        tracing::debug!("fetching raw HTML from {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch page: HTTP {}", response.status());
        }

        let body = response.text().await?;

        let title = extract_title(&body).or_else(|| title_from_url(&base));
        let candidates = scan::scan_media_urls(&body, &base);

        let media_url = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::NoMedia(url.to_string()))?;

        Ok(Extraction {
            title,
            payload: Payload::MediaUrl(media_url),
        })
    }
}

/// First `<title>` tag in the document, trimmed
fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|capture| capture.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Derive a readable title from the URL's last path segment
fn title_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let name = segment
                .rfind('.')
                .map_or(segment, |dot| &segment[..dot]);
            urlencoding::decode(name)
                .unwrap_or_else(|_| name.into())
                .replace(['_', '-'], " ")
        })
        .filter(|title| !title.is_empty())
}
