use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::DisplayMode;

/// Hard ceiling for `maxItems` of repeat groups.
pub const GLOBAL_MAX_ITEMS: u32 = 30;

/// Engine-wide configuration, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub placeholder: PlaceholderConfig,
    pub repeat: RepeatLimits,
    pub duplicate: DuplicateConfig,
    pub publish: PublishConfig,
}

/// Rendering options for `{{key[.field]}}` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Visible length of a rendered value before it is cut with an ellipsis; `0` disables.
    pub truncate_at: usize,
    /// Appended to raw option ids that have no matching option text.
    pub missing_option_marker: String,
    /// Rendered for object answers referenced without a field.
    pub object_marker: String,
    /// Rendered for keys that resolve to nothing.
    pub undefined_literal: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            truncate_at: 40,
            missing_option_marker: "(нет текста)".into(),
            object_marker: "—".into(),
            undefined_literal: "undefined".into(),
        }
    }
}

/// Defaults and bounds for parallel groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatLimits {
    pub global_max_items: u32,
    pub item_label: String,
    pub display_mode: DisplayMode,
    pub min_items: u32,
    pub max_items: u32,
}

impl Default for RepeatLimits {
    fn default() -> Self {
        Self {
            global_max_items: GLOBAL_MAX_ITEMS,
            item_label: "Элемент".into(),
            display_mode: DisplayMode::Tabs,
            min_items: 1,
            max_items: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    pub copy_suffix: String,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            copy_suffix: " (Копия)".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Attempts made by `publish_with_store` before giving up on revision conflicts.
    pub max_attempts: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("repeat.global_max_items must be at least 1")]
    ZeroCeiling,
    #[error("repeat.min_items ({min}) exceeds repeat.max_items ({max})")]
    InvertedBounds { min: u32, max: u32 },
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let repeat = &self.repeat;
        if repeat.global_max_items == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        if repeat.min_items > repeat.max_items {
            return Err(ConfigError::InvertedBounds {
                min: repeat.min_items,
                max: repeat.max_items,
            });
        }
        Ok(())
    }
}
