//! Editor configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stamp_gallery::{ExportNaming, GalleryConfig, GalleryError};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::editor::history::DEFAULT_MAX_STATES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots kept.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    #[serde(default)]
    pub gallery: GalleryConfig,

    #[serde(default)]
    pub export_naming: ExportNaming,
}

fn default_history_depth() -> usize {
    DEFAULT_MAX_STATES
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            gallery: GalleryConfig::default(),
            export_naming: ExportNaming::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let config = Self::from_json_str(&data)
            .with_context(|| format!("parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "editor config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            tracing::error!("history_depth must be at least 1");
            return Err(ConfigError::InvalidHistoryDepth {
                depth: self.history_depth,
            });
        }

        if self.history_depth > 500 {
            tracing::warn!(
                history_depth = self.history_depth,
                "unusually deep history; every entry holds a full scene"
            );
        }

        self.gallery.validate()?;
        self.export_naming.validate()?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history_depth must be at least 1 (got {depth})")]
    InvalidHistoryDepth { depth: usize },

    #[error("invalid gallery settings: {0}")]
    Gallery(#[from] GalleryError),

    #[error("config is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
}
