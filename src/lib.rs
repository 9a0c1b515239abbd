//! Forkcast Backend - an HTTP service that turns an arbitrary webpage or
//! video-platform URL into either a plain-text caption transcription or a
//! resolved direct media URL.
//!
//! Extraction runs as an ordered cascade of strategies (rendered page, raw
//! HTML fetch, metadata extractor) that fall through on failure; terminal
//! failures are mapped to a stable HTTP status and message.

pub mod cascade;
pub mod classify;
pub mod cli;
pub mod config;
pub mod formats;
pub mod scan;
pub mod server;
pub mod subtitles;
pub mod utils;

pub use cascade::{CascadeController, Extraction, ExtractionStrategy, Payload};
pub use classify::ClassifiedError;
pub use config::Config;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Well-known extraction failure shapes. The display text of each variant
/// is what the error classifier ultimately matches against, so the wording
/// here is load-bearing.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("Page took too long to load: {0}")]
    RenderTimeout(String),

    #[error("No media found in page: {0}")]
    NoMedia(String),

    #[error("No subtitles or media found for this video")]
    NoContent,

    #[error("Unable to extract video information: {0}")]
    ExtractorFailed(String),
}
