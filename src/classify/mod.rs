//! Maps heterogeneous lower-level failure text onto a small set of stable
//! (status, message) pairs. First matching rule wins; the table order is
//! deliberate (access denial before the generic not-found and timeout
//! rules, timeout before the generic connection rule).

/// A classified terminal failure. `message` is the canonical outward
/// text; `raw` keeps the original cause for logs and the 500 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub status: u16,
    pub message: String,
    pub raw: String,
}

struct Rule {
    keywords: &'static [&'static str],
    status: u16,
    message: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["403", "forbidden"],
        status: 403,
        message: "Access denied: The video source rejected the request",
    },
    Rule {
        keywords: &["404", "not found", "does not exist"],
        status: 404,
        message: "Video not found: The requested video could not be found",
    },
    Rule {
        keywords: &["401", "unauthorized"],
        status: 401,
        message: "Unauthorized: Authentication is required to access this video",
    },
    Rule {
        keywords: &["timeout", "timed out", "took too long"],
        status: 408,
        message: "Request timeout: The video source took too long to respond",
    },
    Rule {
        keywords: &["connection", "network"],
        status: 503,
        message: "Service unavailable: Could not reach the video source",
    },
    Rule {
        keywords: &[
            "unsupported url",
            "no video formats found",
            "unable to extract",
            "unable to download",
        ],
        status: 400,
        message: "Bad request: unable to process URL",
    },
    Rule {
        keywords: &["no subtitles", "no captions", "no media", "no content"],
        status: 400,
        message: "No content available: No subtitles or media were found for this URL",
    },
];

/// Classify a raw failure description into a stable status and message.
pub fn classify(raw: &str) -> ClassifiedError {
    let lowered = raw.to_lowercase();

    for rule in RULES {
        if rule.keywords.iter().any(|k| lowered.contains(k)) {
            return ClassifiedError {
                status: rule.status,
                message: rule.message.to_string(),
                raw: raw.to_string(),
            };
        }
    }

    // Unanticipated failures keep the raw message so operators have
    // something to work with
    ClassifiedError {
        status: 500,
        message: format!("Internal error: {}", raw),
        raw: raw.to_string(),
    }
}
