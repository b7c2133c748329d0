use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_TOML: &str = r#"[storage]
root_dir = "~/.promptdesk/data"

[chat]
max_message_length = 16000

[conversation]
model = "gpt-4"
temperature = 1.0
system_prompt = ""
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub chat: ChatConfig,
    pub conversation: ConversationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest message the input accepts, in characters. Zero disables the
    /// limit.
    pub max_message_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: "~/.promptdesk/data".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 16000,
        }
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 1.0,
            system_prompt: String::new(),
        }
    }
}

impl ConversationSettings {
    pub const MIN_TEMPERATURE: f32 = 0.0;
    pub const MAX_TEMPERATURE: f32 = 1.0;

    pub fn clamped_temperature(&self) -> f32 {
        if self.temperature.is_nan() {
            return Self::MAX_TEMPERATURE;
        }
        self.temperature
            .clamp(Self::MIN_TEMPERATURE, Self::MAX_TEMPERATURE)
    }

    pub fn summary(&self) -> String {
        format!("{} | temp {:.1}", self.model, self.clamped_temperature())
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })
    }

    pub fn root_dir(&self) -> Result<PathBuf, ConfigError> {
        expand_home(&self.storage.root_dir)
    }
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(home_dir()?.join(".promptdesk"))
}

/// Reads `~/.promptdesk/config.toml`, writing the defaults first if the file
/// does not exist yet.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config_dir = config_dir()?;
    fs::create_dir_all(&config_dir)?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        fs::write(&config_file, DEFAULT_CONFIG_TOML)?;
        tracing::info!(path = %config_file.display(), "wrote default config");
    }

    let text = fs::read_to_string(&config_file)?;
    AppConfig::from_toml_str(&text, &config_file)
}

pub fn expand_home(raw_path: &str) -> Result<PathBuf, ConfigError> {
    if raw_path == "~" {
        return home_dir();
    }
    if let Some(rest) = raw_path.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    Ok(PathBuf::from(raw_path))
}

fn home_dir() -> Result<PathBuf, ConfigError> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHome)
}
