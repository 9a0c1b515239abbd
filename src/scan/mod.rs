//! Tiered scan of raw HTML for candidate media URLs.
//!
//! Tier order is fixed: `<video src>`, then `<source src>`, then
//! `data-*src` attributes carrying a media-file value, then any quoted
//! absolute URL with a media extension. Matches resolve to absolute URLs
//! before first-seen de-duplication.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// File extensions the scanner treats as playable media
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi", "m3u8"];

static VIDEO_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<video\b[^>]*\ssrc\s*=\s*["']([^"']+)["']"#).unwrap());

static SOURCE_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<source\b[^>]*\ssrc\s*=\s*["']([^"']+)["']"#).unwrap());

static DATA_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdata-[a-z0-9_-]*src\s*=\s*["']([^"']+)["']"#).unwrap());

static QUOTED_MEDIA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["'](https?://[^"'\s]+\.(?:mp4|webm|ogg|mov|avi|m3u8))["']"#).unwrap()
});

/// Scan HTML for candidate media URLs, highest-confidence tier first.
/// Malformed markup never fails the scan; it just yields fewer matches.
pub fn scan_media_urls(html: &str, base: &Url) -> Vec<String> {
    let mut candidates: Vec<&str> = Vec::new();

    for capture in VIDEO_SRC_RE.captures_iter(html) {
        candidates.push(capture.get(1).map_or("", |m| m.as_str()));
    }
    for capture in SOURCE_SRC_RE.captures_iter(html) {
        candidates.push(capture.get(1).map_or("", |m| m.as_str()));
    }
    for capture in DATA_SRC_RE.captures_iter(html) {
        let value = capture.get(1).map_or("", |m| m.as_str());
        if has_media_extension(value) {
            candidates.push(value);
        }
    }
    for capture in QUOTED_MEDIA_URL_RE.captures_iter(html) {
        candidates.push(capture.get(1).map_or("", |m| m.as_str()));
    }

    dedup_resolved(candidates.into_iter(), base)
}

/// Resolve raw candidates against a base URL and drop duplicates,
/// preserving first-seen order.
pub fn dedup_resolved<'a>(
    candidates: impl Iterator<Item = &'a str>,
    base: &Url,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for candidate in candidates {
        if let Some(absolute) = resolve_candidate(candidate, base) {
            if seen.insert(absolute.clone()) {
                resolved.push(absolute);
            }
        }
    }

    resolved
}

/// Resolve a raw `src` value to an absolute URL. Already-absolute URLs
/// pass through unchanged; protocol-relative URLs get `https:`; everything
/// else resolves against the base (root-relative values against its
/// scheme and host, path-relative values against the full base).
pub fn resolve_candidate(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_absolute(raw) {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    base.join(raw).ok().map(|url| url.to_string())
}

fn is_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    (bytes.len() > 7 && bytes[..7].eq_ignore_ascii_case(b"http://"))
        || (bytes.len() > 8 && bytes[..8].eq_ignore_ascii_case(b"https://"))
}

fn has_media_extension(value: &str) -> bool {
    let lower = value.to_lowercase();
    MEDIA_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}
