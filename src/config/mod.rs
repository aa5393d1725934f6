use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ipc::SessionConfig;
use crate::ipc::locator::{self, Locator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub ipc: IpcConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub artwork: ArtworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord application id the presence is shown under.
    pub client_id: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            client_id: "1457120161911013437".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Directory holding the Discord socket. Falls back to `$TMPDIR`, then `/tmp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    pub prefix: String,
    pub probe_timeout_ms: u64,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            prefix: locator::DEFAULT_PREFIX.to_string(),
            probe_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub app: String,
    pub poll_interval_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            app: "Music".to_string(),
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    pub enabled: bool,
    /// Discord asset key used when no cover art is found.
    pub fallback_key: String,
    pub size: u32,
    pub timeout_secs: u64,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_key: "music".to_string(),
            size: 512,
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("music-presence")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = Self::config_path();
        fs::write(&config_path, self.to_toml()?)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize config")
    }

    pub fn locator(&self) -> Locator {
        match &self.ipc.base_dir {
            Some(dir) => Locator::new(dir, self.ipc.prefix.clone()),
            None => Locator::from_env(self.ipc.prefix.clone()),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig::new(self.discord.client_id.clone(), self.locator());
        session.probe_timeout = Duration::from_millis(self.ipc.probe_timeout_ms);
        session
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.player.poll_interval_secs.max(1))
    }
}
