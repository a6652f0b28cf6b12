use super::{HistoryConfig, ObservabilityConfig, RenderConfig};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: lmsa_dir().join("config.toml"),
            render: RenderConfig::default(),
            history: HistoryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn lmsa_dir() -> PathBuf {
    let home = UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
    home.join(".lmsa")
}

impl Config {
    /// Load `~/.lmsa/config.toml`, writing defaults on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let lmsa_dir = home.join(".lmsa");
        let config_path = lmsa_dir.join("config.toml");

        if !lmsa_dir.exists() {
            fs::create_dir_all(&lmsa_dir).context("Failed to create .lmsa directory")?;
        }

        if config_path.exists() {
            let mut config = Self::load_from(&config_path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        } else {
            let mut config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load an explicit config file. Missing sections take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(e.to_string()))
            .context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_usize("LMSA_MAX_RESIDENT") {
            self.history.max_resident = value;
        }
        if let Some(value) = env_usize("LMSA_MAX_ACTIVE_CHATS") {
            self.history.max_active_chats = value;
        }
        if let Some(value) = env_usize("LMSA_PAGE_SIZE") {
            self.history.page_size = value;
        }
        if let Ok(compression) = std::env::var("LMSA_COMPRESSION") {
            if !compression.is_empty() {
                self.history.compression = compression;
            }
        }
        if let Ok(level) = std::env::var("LMSA_LOG_LEVEL") {
            if !level.is_empty() {
                self.observability.log_level = level;
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.history.max_resident == 0 {
            return Err(ConfigError::Validation(
                "history.max_resident must be greater than 0".into(),
            ));
        }
        if self.history.max_active_chats == 0 {
            return Err(ConfigError::Validation(
                "history.max_active_chats must be greater than 0".into(),
            ));
        }
        if self.history.page_size == 0 {
            return Err(ConfigError::Validation(
                "history.page_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw}: not a non-negative integer");
            None
        }
    }
}
