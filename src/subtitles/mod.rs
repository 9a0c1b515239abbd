//! Subtitle track handling: WebVTT decoding and preference-ordered track
//! selection over whatever the metadata extractor reports.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Inline markup tags inside cue payload lines, e.g. `<c>`, `<00:00:01.000>`
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// One subtitle rendition for a given language, as reported by the
/// metadata extractor (`ext` is the markup format, e.g. "vtt" or "srv3").
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleTrack {
    pub ext: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Decode WebVTT markup into plain text.
///
/// Header lines, timestamp ranges, numeric cue identifiers and blank lines
/// are dropped; inline tags are stripped from payload lines; the surviving
/// text is joined with single spaces in cue order. Unparseable input
/// degrades to an empty or partial string, never an error.
pub fn decode_vtt(content: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("WEBVTT") || line.contains("-->") {
            continue;
        }
        // Cue identifiers are bare numbers on their own line
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let cleaned = TAG_RE.replace_all(line, "");
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            parts.push(cleaned.to_string());
        }
    }

    parts.join(" ")
}

/// Pick the best subtitle track from a language -> renditions mapping.
///
/// Languages are searched in the order given; within the first language
/// present, formats are searched in the order given. When none of the
/// preferred formats exist the first rendition in the provider's reported
/// order is used, so that a track in an unanticipated format still beats
/// no track at all.
pub fn select_track<'a>(
    tracks: &'a HashMap<String, Vec<SubtitleTrack>>,
    languages: &[String],
    formats: &[String],
) -> Option<&'a SubtitleTrack> {
    for language in languages {
        let Some(renditions) = tracks.get(language) else {
            continue;
        };
        if renditions.is_empty() {
            continue;
        }
        for format in formats {
            if let Some(track) = renditions.iter().find(|t| &t.ext == format) {
                return Some(track);
            }
        }
        return renditions.first();
    }
    None
}
