// Application configuration
// JSON settings with defaults for every field, validated before use

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acceptance::AcceptanceConfig;
use crate::audio::CueConfig;
use crate::currency::DetectionMode;
use crate::interaction::GestureThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to get config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub acceptance: AcceptanceConfig,

    pub gestures: GestureThresholds,

    /// Delay before the swipe prompt after an accepted detection
    pub prompt_delay_ms: u64,

    /// Number of ranked predictions kept per classification (at least 2)
    pub top_k: usize,

    /// Square input size of the models, in pixels
    pub input_size: u32,

    /// Base-currency units per unit of foreign currency
    pub exchange_rate: f64,

    pub initial_mode: DetectionMode,

    pub cues: CueConfig,

    /// Optional JSONL file receiving one decision record per scan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            acceptance: AcceptanceConfig::default(),
            gestures: GestureThresholds::default(),
            prompt_delay_ms: 1200,
            top_k: 7,
            input_size: 224,
            exchange_rate: 58.0,
            initial_mode: DetectionMode::Coins,
            cues: CueConfig::default(),
            trace_path: None,
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            AppConfig::load(path)
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f32| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, v)))
            }
        };

        unit("acceptance.min_margin", self.acceptance.min_margin)?;
        for mode in DetectionMode::ALL {
            unit(
                &format!("acceptance.min_confidence.{}", mode.as_str()),
                self.acceptance.min_confidence.get(mode),
            )?;
        }

        if self.top_k < 2 {
            return Err(ConfigError::Invalid(format!(
                "top_k must be at least 2, got {}",
                self.top_k
            )));
        }
        if self.input_size == 0 {
            return Err(ConfigError::Invalid("input_size must be positive".to_string()));
        }
        if !(self.exchange_rate.is_finite() && self.exchange_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "exchange_rate must be positive, got {}",
                self.exchange_rate
            )));
        }
        if self.gestures.tap_max_px >= self.gestures.swipe_px {
            return Err(ConfigError::Invalid(
                "gestures.tap_max_px must be smaller than gestures.swipe_px".to_string(),
            ));
        }

        Ok(())
    }
}

/// Platform config location, e.g. ~/.config/currency-lens/config.json
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("currency-lens").join("config.json"))
}
