// Application configuration - RON file under the user's config dir

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "NUMSLIDER_API_URL";

const CONFIG_DIR_NAME: &str = "numslider";
const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No config directory on this platform")]
    NoConfigDir,
}

/// Speech settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Multiplier of the engine's normal speaking rate
    pub rate: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    /// User the session runs for (set by the login flow)
    pub user_id: Option<String>,
    pub request_timeout_secs: u64,
    pub speech: SpeechConfig,
    /// Report completion as soon as the sequence finishes
    pub auto_report_completion: bool,
    pub notification_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000/api".to_string(),
            user_id: None,
            request_timeout_secs: 10,
            speech: SpeechConfig::default(),
            auto_report_completion: false,
            notification_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Default location: `<config dir>/numslider/config.ron`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: AppConfig = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Apply `NUMSLIDER_API_URL` when set and non-empty
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.apply_api_url(&url);
        }
        self
    }

    fn apply_api_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.api_base_url = url.to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be positive".to_string(),
            ));
        }

        if !(self.speech.rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "speech rate must be positive (got {})",
                self.speech.rate
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load(temp_dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.ron");

        let config = AppConfig {
            user_id: Some("u-12".to_string()),
            auto_report_completion: true,
            speech: SpeechConfig {
                enabled: false,
                rate: 1.5,
            },
            ..AppConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.ron");
        std::fs::write(&path, r#"(api_base_url: "https://example.org/api")"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://example.org/api");
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.speech.enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_timeout = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(ConfigError::Invalid(_))));

        let bad_rate = AppConfig {
            speech: SpeechConfig {
                enabled: true,
                rate: 0.0,
            },
            ..AppConfig::default()
        };
        assert!(bad_rate.validate().is_err());

        let empty_url = AppConfig {
            api_base_url: "  ".to_string(),
            ..AppConfig::default()
        };
        assert!(empty_url.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.ron");
        std::fs::write(&path, "(api_base_url: ").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_api_url_override_ignores_blank() {
        let mut config = AppConfig::default();
        config.apply_api_url("   ");
        assert_eq!(config.api_base_url, AppConfig::default().api_base_url);

        config.apply_api_url(" http://10.0.0.2/api ");
        assert_eq!(config.api_base_url, "http://10.0.0.2/api");
    }
}
