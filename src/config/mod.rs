// SPDX-License-Identifier: MIT

//! Settings management for Parlor
//!
//! Handles loading and saving settings from ~/.parlor/settings.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main settings structure, stored in ~/.parlor/settings.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory scanned for GGUF model files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Directory holding markdown chat transcripts
    #[serde(default = "default_chats_dir")]
    pub chats_dir: PathBuf,

    /// Generation parameters
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Generation parameters for the inference backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Context size (number of tokens) for the model context window
    #[serde(default = "default_context_size")]
    pub context_size: u32,

    /// Number of layers to offload to GPU (0 for CPU-only)
    #[serde(default)]
    pub gpu_layers: u32,

    /// Number of threads to use for inference (None = backend default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("MODELS")
}

fn default_chats_dir() -> PathBuf {
    PathBuf::from("Chat_Data")
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_context_size() -> u32 {
    4096
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            chats_dir: default_chats_dir(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            context_size: default_context_size(),
            gpu_layers: 0,
            threads: None,
        }
    }
}

impl Settings {
    /// Parlor's home directory (~/.parlor), created on demand
    pub fn parlor_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parlor")
    }

    /// Default settings file path
    pub fn default_path() -> PathBuf {
        Self::parlor_home().join("settings.json")
    }

    /// Load settings from the given path, or from the default path.
    ///
    /// A missing file yields the defaults; a malformed file is an error so
    /// a typo never silently resets the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file absent, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as pretty JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_tokens == 0 {
            return Err(crate::ParlorError::Config(
                "generation.max_tokens must be positive".to_string(),
            ));
        }
        if self.generation.context_size == 0 {
            return Err(crate::ParlorError::Config(
                "generation.context_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
