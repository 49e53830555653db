//! Configuration system for nostalgia-room

use crate::error::{Result, RoomError};
use crate::game::{builtin_games, Game, ViewMode, DEFAULT_BIOS_URL, DEFAULT_GAME_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub emulator: EmulatorConfig,
    pub storage: StorageConfig,
    pub decor: DecorConfig,
    pub debug: DebugConfig,
    pub games: Vec<Game>,
}

/// Initial session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_game_id: String,
    pub default_bios_url: String,
    pub view_mode: ViewMode,
}

/// Embedded emulator shell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Path of the page hosting the emulator
    pub shell_path: String,
    /// Origin prepended to site-relative ROM and BIOS paths
    pub origin: String,
    /// Route under which bundled local ROMs are served
    pub local_rom_route: String,
}

/// Session-scoped storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub external_files_prefix: String,
    /// Total bytes the storage accepts; unlimited when absent
    pub quota_bytes: Option<usize>,
}

/// Room decor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub config_path: PathBuf,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            emulator: EmulatorConfig::default(),
            storage: StorageConfig::default(),
            decor: DecorConfig::default(),
            debug: DebugConfig::default(),
            games: builtin_games(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_game_id: DEFAULT_GAME_ID.to_string(),
            default_bios_url: DEFAULT_BIOS_URL.to_string(),
            view_mode: ViewMode::default(),
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            shell_path: "/emulator-shell.html".to_string(),
            origin: "http://localhost:5173".to_string(),
            local_rom_route: "/__localrom__".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            external_files_prefix: "nostalgia:external-files:".to_string(),
            quota_bytes: None,
        }
    }
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("public/room-decor.json"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| RoomError::Config(e.to_string()))
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RoomError::Config(e.to_string()))
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nostalgia-room")
            .join("config.toml")
    }
}
