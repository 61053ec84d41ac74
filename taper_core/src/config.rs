//! Configuration file support for Taper.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/taper/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub diary: DiaryConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub dev: DevConfig,
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

/// Diary behaviour configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiaryConfig {
    /// UTC hour (0-23) from which diary logging is open for the day
    #[serde(default = "default_unlock_hour")]
    pub unlock_hour: u32,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            unlock_hour: default_unlock_hour(),
        }
    }
}

/// Local user profile
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Development/test toggles
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevConfig {
    /// Environment name gating dev-only helpers (test, development, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("taper")
}

fn default_unlock_hour() -> u32 {
    18
}

fn default_environment() -> String {
    "development".into()
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
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("taper").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
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

    /// Whether dev-only helpers (seeding, resets) may run
    pub fn dev_helpers_allowed(&self) -> bool {
        let env = self.dev.environment.trim().to_lowercase();
        env == "test" || env == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.diary.unlock_hour, 18);
        assert_eq!(config.dev.environment, "development");
        assert!(config.profile.display_name.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.profile.display_name = Some("Sam".into());

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.diary.unlock_hour, parsed.diary.unlock_hour);
        assert_eq!(parsed.profile.display_name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[diary]
unlock_hour = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.diary.unlock_hour, 20);
        assert_eq!(config.dev.environment, "development"); // default
    }

    #[test]
    fn test_dev_helpers_gate() {
        let mut config = Config::default();
        assert!(config.dev_helpers_allowed());

        config.dev.environment = "Test ".into();
        assert!(config.dev_helpers_allowed());

        config.dev.environment = "production".into();
        assert!(!config.dev_helpers_allowed());
    }
}
