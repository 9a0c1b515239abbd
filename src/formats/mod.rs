//! Video format descriptors and best-format ranking.

use std::cmp::Ordering;

use serde::Deserialize;

/// One media rendition as reported by the metadata extractor. Field names
/// follow the extractor's JSON output; anything it omits deserializes to
/// `None` and ranks as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatDescriptor {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Video codec name; the literal "none" marks an audio-only rendition
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Total bitrate in kbit/s
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl FormatDescriptor {
    pub fn has_video(&self) -> bool {
        matches!(&self.vcodec, Some(codec) if codec != "none")
    }
}

/// Pick the best downloadable video rendition.
///
/// Audio-only entries and entries without a source URL are filtered out;
/// the rest rank by descending (height, bitrate, filesize) with absent
/// values treated as zero, ties keeping the earliest entry. When the
/// filter removes everything, the first entry of the original collection
/// that still has a URL is returned regardless of media type.
pub fn select_format(formats: &[FormatDescriptor]) -> Option<&FormatDescriptor> {
    let mut best: Option<&FormatDescriptor> = None;

    for format in formats {
        if !format.has_video() || format.url.is_none() {
            continue;
        }
        match best {
            Some(current) if compare(format, current) != Ordering::Greater => {}
            _ => best = Some(format),
        }
    }

    best.or_else(|| formats.iter().find(|f| f.url.is_some()))
}

fn compare(a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
    a.height
        .unwrap_or(0)
        .cmp(&b.height.unwrap_or(0))
        .then_with(|| {
            a.tbr
                .unwrap_or(0.0)
                .partial_cmp(&b.tbr.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.filesize.unwrap_or(0).cmp(&b.filesize.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(url: &str, height: u32) -> FormatDescriptor {
        FormatDescriptor {
            url: Some(url.to_string()),
            vcodec: Some("avc1".to_string()),
            height: Some(height),
            ..Default::default()
        }
    }

    fn audio_only(url: &str) -> FormatDescriptor {
        FormatDescriptor {
            url: Some(url.to_string()),
            vcodec: Some("none".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_highest_resolution() {
        let formats = vec![audio_only("a1"), video("u1", 480), video("u2", 1080)];
        let selected = select_format(&formats).unwrap();
        assert_eq!(selected.url.as_deref(), Some("u2"));
    }

    #[test]
    fn test_bitrate_breaks_height_ties() {
        let mut low = video("u1", 720);
        low.tbr = Some(800.0);
        let mut high = video("u2", 720);
        high.tbr = Some(2500.0);

        let formats = vec![low, high];
        let selected = select_format(&formats).unwrap();
        assert_eq!(selected.url.as_deref(), Some("u2"));
    }

    #[test]
    fn test_full_tie_keeps_earliest() {
        let formats = vec![video("u1", 720), video("u2", 720)];
        let selected = select_format(&formats).unwrap();
        assert_eq!(selected.url.as_deref(), Some("u1"));
    }

    #[test]
    fn test_audio_only_fallback() {
        let formats = vec![
            FormatDescriptor::default(), // no url at all
            audio_only("a1"),
            audio_only("a2"),
        ];
        let selected = select_format(&formats).unwrap();
        assert_eq!(selected.url.as_deref(), Some("a1"));
    }

    #[test]
    fn test_missing_vcodec_counts_as_audio_only() {
        let mut format = video("u1", 1080);
        format.vcodec = None;
        let formats = vec![format, video("u2", 360)];
        let selected = select_format(&formats).unwrap();
        assert_eq!(selected.url.as_deref(), Some("u2"));
    }

    #[test]
    fn test_nothing_usable() {
        assert!(select_format(&[]).is_none());
        assert!(select_format(&[FormatDescriptor::default()]).is_none());
    }
}
