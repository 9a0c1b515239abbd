//! The extraction cascade: an ordered list of strategies tried against a
//! URL until one produces a usable result. A failing strategy is logged
//! and control falls through; only when every strategy has failed is the
//! final error classified and surfaced.

use async_trait::async_trait;

use crate::classify::{self, ClassifiedError};
use crate::config::{Config, Stage};
use crate::Result;

pub mod fetch;
pub mod metadata;
pub mod renderer;

/// What a strategy managed to pull out of a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain-text transcription derived from a subtitle track
    Transcript(String),

    /// Resolved direct media URL
    MediaUrl(String),
}

/// Successful result of a single strategy attempt
#[derive(Debug, Clone)]
pub struct Extraction {
    pub title: Option<String>,
    pub payload: Payload,
}

/// Terminal result of the whole cascade
#[derive(Debug, Clone)]
pub struct ExtractionSuccess {
    pub title: String,
    pub payload: Payload,
}

/// One extraction approach. Strategies are stateless across requests and
/// must bound their own blocking work with timeouts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Attempt extraction for a single URL
    async fn run(&self, url: &str) -> Result<Extraction>;
}

/// Runs strategies in their configured order, short-circuiting on the
/// first success. Each strategy runs at most once per request.
pub struct CascadeController {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl CascadeController {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Build the cascade from the configured stage list
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut controller = Self::new();

        for stage in &config.cascade.stages {
            match stage {
                Stage::RenderedPage => {
                    controller.register(Box::new(renderer::RenderedPageStrategy::new(
                        config.render_timeout(),
                        config.settle_delay(),
                    )));
                }
                Stage::RawHtml => {
                    controller.register(Box::new(fetch::RawHtmlStrategy::new(
                        config.fetch_timeout(),
                    )?));
                }
                Stage::Metadata => {
                    controller.register(Box::new(metadata::MetadataStrategy::new(
                        config.extractor.yt_dlp_path.clone(),
                        config.subtitles.languages.clone(),
                        config.subtitles.formats.clone(),
                        config.fetch_timeout(),
                    )?));
                }
            }
        }

        Ok(controller)
    }

    /// Register a strategy at the end of the cascade
    pub fn register(&mut self, strategy: Box<dyn ExtractionStrategy>) {
        self.strategies.push(strategy);
    }

    /// Names of the configured strategies, in cascade order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the cascade for one URL.
    ///
    /// Stage failures are logged and swallowed here; the caller only ever
    /// sees the classified form of the LAST failure, and only when every
    /// stage has failed.
    pub async fn extract(
        &self,
        url: &str,
    ) -> std::result::Result<ExtractionSuccess, ClassifiedError> {
        let mut last_error: Option<anyhow::Error> = None;

        for strategy in &self.strategies {
            tracing::info!(strategy = strategy.name(), "attempting extraction");

            match strategy.run(url).await {
                Ok(extraction) => {
                    tracing::info!(strategy = strategy.name(), "extraction succeeded");
                    return Ok(ExtractionSuccess {
                        title: extraction.title.unwrap_or_else(|| "Unknown".to_string()),
                        payload: extraction.payload,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %error,
                        "strategy failed, falling through"
                    );
                    last_error = Some(error);
                }
            }
        }

        let raw = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no extraction strategies configured".to_string());

        Err(classify::classify(&raw))
    }
}

impl Default for CascadeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn success(title: Option<&str>, payload: Payload) -> Extraction {
        Extraction {
            title: title.map(String::from),
            payload,
        }
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let mut first = MockExtractionStrategy::new();
        first.expect_name().return_const("first");
        first
            .expect_run()
            .times(1)
            .returning(|_| Ok(success(Some("A Title"), Payload::MediaUrl("u".into()))));

        let mut second = MockExtractionStrategy::new();
        second.expect_name().return_const("second");
        second.expect_run().times(0);

        let mut controller = CascadeController::new();
        controller.register(Box::new(first));
        controller.register(Box::new(second));

        let result = controller.extract("https://example.test").await.unwrap();
        assert_eq!(result.title, "A Title");
        assert_eq!(result.payload, Payload::MediaUrl("u".into()));
    }

    #[tokio::test]
    async fn test_failure_falls_through_to_next_stage() {
        let mut first = MockExtractionStrategy::new();
        first.expect_name().return_const("first");
        first
            .expect_run()
            .times(1)
            .returning(|_| Err(anyhow!("renderer exploded")));

        let mut second = MockExtractionStrategy::new();
        second.expect_name().return_const("second");
        second
            .expect_run()
            .times(1)
            .returning(|_| Ok(success(None, Payload::Transcript("words".into()))));

        let mut controller = CascadeController::new();
        controller.register(Box::new(first));
        controller.register(Box::new(second));

        let result = controller.extract("https://example.test").await.unwrap();
        // Stage 1's failure never reaches the caller; missing titles
        // fall back to the literal "Unknown"
        assert_eq!(result.title, "Unknown");
        assert_eq!(result.payload, Payload::Transcript("words".into()));
    }

    #[tokio::test]
    async fn test_all_failures_classify_last_error() {
        let mut first = MockExtractionStrategy::new();
        first.expect_name().return_const("first");
        first
            .expect_run()
            .times(1)
            .returning(|_| Err(anyhow!("Connection timed out")));

        let mut second = MockExtractionStrategy::new();
        second.expect_name().return_const("second");
        second
            .expect_run()
            .times(1)
            .returning(|_| Err(anyhow!("ERROR: HTTP Error 404: Not Found")));

        let mut controller = CascadeController::new();
        controller.register(Box::new(first));
        controller.register(Box::new(second));

        let classified = controller.extract("https://example.test").await.unwrap_err();
        assert_eq!(classified.status, 404);
        assert_eq!(
            classified.message,
            "Video not found: The requested video could not be found"
        );
        assert_eq!(classified.raw, "ERROR: HTTP Error 404: Not Found");
    }

    #[tokio::test]
    async fn test_empty_cascade_is_internal_error() {
        let controller = CascadeController::new();
        let classified = controller.extract("https://example.test").await.unwrap_err();
        assert_eq!(classified.status, 500);
    }

    #[test]
    fn test_from_config_respects_stage_order() {
        let mut config = Config::default();
        config.cascade.stages = vec![Stage::Metadata, Stage::RawHtml];

        let controller = CascadeController::from_config(&config).unwrap();
        assert_eq!(controller.strategy_names(), vec!["metadata", "raw-html"]);
    }
}
