//! Metadata extractor stage backed by yt-dlp.
//!
//! Preference order: subtitle files yt-dlp already wrote to the scratch
//! directory, then URL-based track selection over the reported
//! subtitles/automatic-captions maps, then a direct media URL from the
//! format table.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::process::Command;

use super::{Extraction, ExtractionStrategy, Payload};
use crate::formats::{self, FormatDescriptor};
use crate::subtitles::{self, SubtitleTrack};
use crate::{ExtractionError, Result};

pub struct MetadataStrategy {
    yt_dlp_path: String,
    languages: Vec<String>,
    formats: Vec<String>,
    client: Client,
}

impl MetadataStrategy {
    pub fn new(
        yt_dlp_path: String,
        languages: Vec<String>,
        formats: Vec<String>,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(fetch_timeout).build()?;

        Ok(Self {
            yt_dlp_path,
            languages,
            formats,
            client,
        })
    }

    /// Probe the URL with yt-dlp. Subtitle files for the preferred
    /// languages are written into `scratch_dir` as a side effect.
    async fn probe(&self, url: &str, scratch_dir: &Path) -> Result<Value> {
        let output_template = scratch_dir.join("%(title)s.%(ext)s");
        let sub_langs = self.languages.join(",");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-json",
                "--no-simulate",
                "--skip-download",
                "--no-playlist",
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                &sub_langs,
                "--sub-format",
                "vtt",
                "--quiet",
                "--no-warnings",
                "--output",
                &output_template.to_string_lossy(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(json_str.trim())
            .map_err(|e| ExtractionError::ExtractorFailed(e.to_string()))?;

        Ok(info)
    }

    /// Pick up a subtitle file yt-dlp wrote for one of the preferred
    /// languages, already decoded to plain text
    fn read_downloaded_subtitles(&self, scratch_dir: &Path) -> Result<Option<String>> {
        for entry in fs_err::read_dir(scratch_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();

            let matches_language = self
                .languages
                .iter()
                .any(|lang| file_name.ends_with(&format!(".{}.vtt", lang)));

            if matches_language {
                tracing::debug!("using downloaded subtitle file {}", file_name);
                let content = fs_err::read_to_string(entry.path())?;
                return Ok(Some(subtitles::decode_vtt(&content)));
            }
        }

        Ok(None)
    }

    /// Merge the manual and automatic caption maps and select the best
    /// track. Automatic captions override manual ones for the same
    /// language, matching the behavior callers already depend on.
    fn pick_track(&self, info: &Value) -> Option<SubtitleTrack> {
        let mut merged: HashMap<String, Vec<SubtitleTrack>> = HashMap::new();

        for key in ["subtitles", "automatic_captions"] {
            let Some(map) = info.get(key).and_then(Value::as_object) else {
                continue;
            };
            for (language, tracks) in map {
                if let Ok(tracks) = serde_json::from_value::<Vec<SubtitleTrack>>(tracks.clone()) {
                    merged.insert(language.clone(), tracks);
                }
            }
        }

        subtitles::select_track(&merged, &self.languages, &self.formats).cloned()
    }

    async fn fetch_subtitle(&self, subtitle_url: &str) -> Result<String> {
        let response = self.client.get(subtitle_url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Unable to download subtitles: HTTP {}", response.status());
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ExtractionStrategy for MetadataStrategy {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn run(&self, url: &str) -> Result<Extraction> {
        let scratch = tempfile::tempdir()?;
        let info = self.probe(url, scratch.path()).await?;

        let title = info
            .get("title")
            .and_then(Value::as_str)
            .map(String::from);

        if let Some(transcript) = self.read_downloaded_subtitles(scratch.path())? {
            return Ok(Extraction {
                title,
                payload: Payload::Transcript(transcript),
            });
        }

        if let Some(track) = self.pick_track(&info) {
            let content = self.fetch_subtitle(&track.url).await?;
            let transcript = if track.ext == "vtt" {
                subtitles::decode_vtt(&content)
            } else {
                content
            };
            return Ok(Extraction {
                title,
                payload: Payload::Transcript(transcript),
            });
        }

        // No captions anywhere; a direct media URL still counts
        let descriptors: Vec<FormatDescriptor> = info
            .get("formats")
            .map(|formats| serde_json::from_value(formats.clone()).unwrap_or_default())
            .unwrap_or_default();

        if let Some(best) = formats::select_format(&descriptors) {
            if let Some(media_url) = &best.url {
                return Ok(Extraction {
                    title,
                    payload: Payload::MediaUrl(media_url.clone()),
                });
            }
        }

        Err(ExtractionError::NoContent.into())
    }
}

/// Report the yt-dlp version, or `None` when the executable is missing
/// or broken. Used by the status endpoint and the startup check.
pub async fn yt_dlp_version(yt_dlp_path: &str) -> Option<String> {
    let output = Command::new(yt_dlp_path)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|version| !version.is_empty())
}
