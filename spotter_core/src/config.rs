//! Configuration file support for Spotter.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/spotter/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub body: BodyConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Live settings of a guided session
///
/// The session keeps its own copy and merges changes into it with
/// [`crate::session::SettingsPatch`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    #[serde(default = "default_true")]
    pub auto_start_timer: bool,

    /// Rest used when an exercise prescribes none
    #[serde(default = "default_rest_time")]
    pub default_rest_time: u32,

    /// Remaining seconds at which the rest countdown cue starts
    #[serde(default = "default_timer_warning_at")]
    pub timer_warning_at: u32,

    #[serde(default = "default_true")]
    pub keep_screen_on: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_start_timer: true,
            default_rest_time: default_rest_time(),
            timer_warning_at: default_timer_warning_at(),
            keep_screen_on: true,
        }
    }
}

/// Toggles for sound, vibration and voice cues
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    #[serde(default = "default_true")]
    pub vibration_enabled: bool,

    #[serde(default = "default_true")]
    pub voice_enabled: bool,

    /// 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            voice_enabled: true,
            volume: default_volume(),
        }
    }
}

/// Body measurements used by the calorie estimator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyConfig {
    #[serde(default = "default_weight_kg")]
    pub weight_kg: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            weight_kg: default_weight_kg(),
        }
    }
}

/// Speech program override
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    /// Program that speaks its first argument (e.g. "espeak").
    /// Detected from PATH when unset.
    #[serde(default)]
    pub command: Option<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("spotter")
}

fn default_true() -> bool {
    true
}

fn default_rest_time() -> u32 {
    90
}

fn default_timer_warning_at() -> u32 {
    5
}

fn default_volume() -> f32 {
    0.8
}

fn default_weight_kg() -> f64 {
    75.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("spotter").join("config.toml")
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.notifications.volume) {
            return Err(Error::Config(format!(
                "notifications.volume must be between 0 and 1, got {}",
                self.notifications.volume
            )));
        }
        if self.body.weight_kg <= 0.0 {
            return Err(Error::Config(format!(
                "body.weight_kg must be positive, got {}",
                self.body.weight_kg
            )));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
