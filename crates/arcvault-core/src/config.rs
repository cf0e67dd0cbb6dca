use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcvaultConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the strategy server, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-side timeout applied to every backend call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of user turns before the intake interview locks.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Period of the simulated loading progress.
    #[serde(default = "default_progress_tick")]
    pub progress_tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout() -> u64 {
    120
}
/// Intake interview length when the config does not say otherwise.
pub const DEFAULT_MAX_TURNS: u32 = 5;

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}
fn default_progress_tick() -> u64 {
    100
}
fn default_tick_rate() -> u64 {
    100
}

impl Default for ArcvaultConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            conversation: ConversationConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            progress_tick_ms: default_progress_tick(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl ArcvaultConfig {
    /// Load config from ~/.config/arcvault/config.toml, creating defaults if missing.
    pub fn load() -> crate::error::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(|e| {
                crate::error::ArcvaultError::Config(format!("Failed to read config: {e}"))
            })?;
            Self::from_toml(&contents)
        } else {
            let config = ArcvaultConfig::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Parse a config document. Missing sections and keys fall back to defaults.
    pub fn from_toml(contents: &str) -> crate::error::Result<Self> {
        toml::from_str(contents).map_err(|e| {
            crate::error::ArcvaultError::Config(format!("Failed to parse config: {e}"))
        })
    }

    /// Save config to disk.
    pub fn save(&self) -> crate::error::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            crate::error::ArcvaultError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> crate::error::Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            crate::error::ArcvaultError::Config("Could not determine config directory".into())
        })?;
        Ok(config_dir.join("arcvault").join("config.toml"))
    }

    /// Override the backend URL (e.g. from the command line).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ArcvaultConfig::from_toml("").unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.conversation.max_turns, 5);
        assert_eq!(config.conversation.progress_tick_ms, 100);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ArcvaultConfig::from_toml("[conversation]\nmax_turns = 3\n").unwrap();
        assert_eq!(config.conversation.max_turns, 3);
        assert_eq!(config.conversation.progress_tick_ms, 100);
        assert_eq!(config.ui.tick_rate_ms, 100);
    }

    #[test]
    fn invalid_document_is_a_config_error() {
        let err = ArcvaultConfig::from_toml("backend = 3").unwrap_err();
        assert!(matches!(err, crate::error::ArcvaultError::Config(_)));
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let config = ArcvaultConfig::default().with_base_url("http://localhost:9000/");
        assert_eq!(config.backend.base_url, "http://localhost:9000");
    }
}
