use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{DashError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub player: PlayerConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections and fields fall back
    /// to their defaults. Without a path the defaults are returned as-is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                tracing::debug!(path = %path.display(), "loaded configuration file");
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url).map_err(|err| {
            DashError::Config(format!("api.base_url `{}`: {err}", self.api.base_url))
        })?;

        if self.api.timeout_ms == 0 {
            return Err(DashError::Config("api.timeout_ms must be positive".into()));
        }

        let program = self.player.command.first().map(|program| program.trim());
        if program.map_or(true, str::is_empty) {
            return Err(DashError::Config("player.command must start with a program".into()));
        }

        Ok(())
    }
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// MediaWiki API used to look up species thumbnails.
    pub image_lookup_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.160:7007/api".to_string(),
            timeout_ms: 15_000,
            image_lookup_url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

/// Where clips are played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerBackend {
    /// Decoded in-process and played on the default audio output.
    #[default]
    Sink,
    /// Handed to `command`, with the clip locator as the last argument.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub backend: PlayerBackend,
    pub command: Vec<String>,
    pub startup_grace_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: PlayerBackend::Sink,
            command: vec!["mpg123".to_string(), "-q".to_string()],
            startup_grace_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub recent_limit: u32,
    pub detections_limit: u32,
    pub default_image: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: 10,
            detections_limit: 1000,
            default_image: "/default_bird.webp".to_string(),
        }
    }
}
