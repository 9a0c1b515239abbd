use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Extraction cascade settings
    pub cascade: CascadeConfig,

    /// Subtitle selection preferences
    pub subtitles: SubtitlePreferences,

    /// Metadata extractor settings
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to bind
    pub port: u16,
}

/// Extraction stages, in the order and composition a deployment wants.
/// Transcription-only deployments can drop the renderer; URL-resolution
/// deployments can drop whichever stages they cannot afford.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    RenderedPage,
    RawHtml,
    Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Enabled stages, attempted in this order
    pub stages: Vec<Stage>,

    /// Hard wall-clock limit on headless page load
    pub render_timeout_secs: u64,

    /// Wait after page load for lazily-loaded media elements
    pub settle_delay_ms: u64,

    /// Limit on the raw HTML fetch and subtitle downloads
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitlePreferences {
    /// Language tags, most preferred first
    pub languages: Vec<String>,

    /// Subtitle markup formats, most preferred first
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable
    pub yt_dlp_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            cascade: CascadeConfig {
                stages: vec![Stage::RenderedPage, Stage::RawHtml, Stage::Metadata],
                render_timeout_secs: 30,
                settle_delay_ms: 2000,
                fetch_timeout_secs: 15,
            },
            subtitles: SubtitlePreferences {
                languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
                formats: vec![
                    "vtt".to_string(),
                    "ttml".to_string(),
                    "srv3".to_string(),
                    "srv2".to_string(),
                    "srv1".to_string(),
                ],
            },
            extractor: ExtractorConfig {
                yt_dlp_path: "yt-dlp".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or fall back to the
    /// default search path
    pub async fn load_from(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs_err::read_to_string(path)
                    .context("Failed to read config file")?;
                let config: Config = serde_yaml::from_str(&content)
                    .context("Failed to parse config file")?;
                config.validate()?;
                Ok(config)
            }
            None => Self::load().await,
        }
    }

    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("forkcast").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cascade.stages.is_empty() {
            anyhow::bail!("At least one cascade stage must be enabled");
        }

        if self.subtitles.languages.is_empty() {
            anyhow::bail!("At least one subtitle language must be configured");
        }

        if self.cascade.render_timeout_secs == 0 || self.cascade.fetch_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be greater than zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Bind: {}:{}", self.server.host, self.server.port);
        println!("  Cascade stages: {:?}", self.cascade.stages);
        println!("  Render timeout: {}s", self.cascade.render_timeout_secs);
        println!("  Fetch timeout: {}s", self.cascade.fetch_timeout_secs);
        println!("  Subtitle languages: {}", self.subtitles.languages.join(", "));
        println!("  yt-dlp path: {}", self.extractor.yt_dlp_path);
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.cascade.render_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.cascade.settle_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.cascade.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_stages_rejected() {
        let mut config = Config::default();
        config.cascade.stages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stage_names_round_trip() {
        let yaml = "- rendered-page\n- raw-html\n- metadata\n";
        let stages: Vec<Stage> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            stages,
            vec![Stage::RenderedPage, Stage::RawHtml, Stage::Metadata]
        );
        assert_eq!(serde_yaml::to_string(&stages).unwrap(), yaml);
    }

    #[test]
    fn test_partial_stage_list() {
        let yaml = r#"
server: { host: "0.0.0.0", port: 9000 }
cascade:
  stages: [metadata]
  render_timeout_secs: 30
  settle_delay_ms: 2000
  fetch_timeout_secs: 15
subtitles:
  languages: [en]
  formats: [vtt]
extractor: { yt_dlp_path: yt-dlp }
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cascade.stages, vec![Stage::Metadata]);
        assert!(config.validate().is_ok());
    }
}
