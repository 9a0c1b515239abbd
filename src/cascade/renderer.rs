//! Rendered-page stage: load the URL in a headless browser so that
//! script-built players and lazily-attached sources become visible, then
//! harvest media URLs from the live DOM.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use url::Url;

use super::{Extraction, ExtractionStrategy, Payload};
use crate::scan;
use crate::{ExtractionError, Result};

/// In-page sweep for video element sources and common lazy-load hints.
/// Returns a JSON-encoded array of raw URL strings.
const COLLECT_SOURCES_JS: &str = r#"
(() => {
    const urls = [];
    for (const video of document.querySelectorAll('video')) {
        const src = video.getAttribute('src');
        if (src) urls.push(src);
        if (video.currentSrc) urls.push(video.currentSrc);
        for (const source of video.querySelectorAll('source')) {
            const s = source.getAttribute('src');
            if (s) urls.push(s);
        }
    }
    const hints = '[data-src],[data-video-src],[data-lazy-src],[data-video],[data-mp4]';
    for (const el of document.querySelectorAll(hints)) {
        for (const attr of el.attributes) {
            if (attr.name.startsWith('data-') && attr.value) urls.push(attr.value);
        }
    }
    return JSON.stringify(urls);
})()
"#;

pub struct RenderedPageStrategy {
    load_timeout: Duration,
    settle_delay: Duration,
}

impl RenderedPageStrategy {
    pub fn new(load_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            load_timeout,
            settle_delay,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for RenderedPageStrategy {
    fn name(&self) -> &'static str {
        "rendered-page"
    }

    async fn run(&self, url: &str) -> Result<Extraction> {
        // headless_chrome is synchronous; keep the browser off the
        // async worker threads
        let url = url.to_string();
        let load_timeout = self.load_timeout;
        let settle_delay = self.settle_delay;

        tokio::task::spawn_blocking(move || render_and_scan(&url, load_timeout, settle_delay))
            .await?
    }
}

/// One full browser lifecycle: launch, load, settle, harvest. The browser
/// is owned by this frame, so it closes on every exit path.
fn render_and_scan(url: &str, load_timeout: Duration, settle_delay: Duration) -> Result<Extraction> {
    let base = Url::parse(url)?;

    let browser = Browser::new(
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .build()
            .map_err(|e| anyhow!("Failed to configure browser: {}", e))?,
    )
    .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

    let tab = browser.new_tab().map_err(|e| anyhow!("Failed to open tab: {}", e))?;
    tab.set_default_timeout(load_timeout);

    tracing::debug!("rendering {}", url);
    if let Err(error) = tab.navigate_to(url).and_then(|tab| tab.wait_until_navigated()) {
        let text = error.to_string();
        if looks_like_timeout(&text) {
            return Err(ExtractionError::RenderTimeout(text).into());
        }
        anyhow::bail!("Failed to load page: {}", text);
    }

    // Give deferred players a moment to attach their sources
    std::thread::sleep(settle_delay);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for raw in evaluate_sources(&tab) {
        if let Some(absolute) = scan::resolve_candidate(&raw, &base) {
            if seen.insert(absolute.clone()) {
                candidates.push(absolute);
            }
        }
    }

    if let Ok(dom) = tab.get_content() {
        for absolute in scan::scan_media_urls(&dom, &base) {
            if seen.insert(absolute.clone()) {
                candidates.push(absolute);
            }
        }
    }

    let title = tab
        .get_title()
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let media_url = candidates
        .into_iter()
        .next()
        .ok_or_else(|| ExtractionError::NoMedia(url.to_string()))?;

    Ok(Extraction {
        title,
        payload: Payload::MediaUrl(media_url),
    })
}

/// Run the in-page sweep; a failed evaluation just contributes nothing
fn evaluate_sources(tab: &headless_chrome::Tab) -> Vec<String> {
    tab.evaluate(COLLECT_SOURCES_JS, false)
        .ok()
        .and_then(|remote| remote.value)
        .and_then(|value| value.as_str().map(String::from))
        .and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok())
        .unwrap_or_default()
}

fn looks_like_timeout(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("time") || lowered.contains("never came")
}
