use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::DensityPreset;
use crate::subtitle::SubtitleFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// whisper.cpp CLI binary, resolved via PATH when not absolute
    pub binary: PathBuf,

    /// Directory holding ggml model files
    pub model_dir: Option<PathBuf>,

    /// Default model identifier
    pub default_model: String,

    /// Default language code
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Override for the per-user data directory holding the artifact catalog
    pub data_dir: Option<PathBuf>,

    /// Default subtitle output format
    pub default_format: SubtitleFormat,

    /// Default cue density
    pub default_density: DensityPreset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                binary: PathBuf::from("whisper-cli"),
                model_dir: None,
                default_model: "base".to_string(),
                default_language: "en".to_string(),
            },
            app: AppConfig {
                data_dir: None,
                default_format: SubtitleFormat::Srt,
                default_density: DensityPreset::Medium,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("subgen").join("config.yaml"))
    }

    /// Per-user data directory holding the artifact catalog
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.app.data_dir {
            return Ok(dir.clone());
        }

        let data_dir = dirs::data_dir()
            .context("Could not determine data directory")?;

        Ok(data_dir.join("subgen"))
    }

    /// Resolve a model identifier to a ggml model file path
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        let dir = self
            .engine
            .model_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("subgen").join("models")))
            .unwrap_or_else(|| PathBuf::from("models"));

        dir.join(format!("ggml-{}.bin", model_id))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Engine Binary: {}", self.engine.binary.display());
        if let Some(dir) = &self.engine.model_dir {
            println!("  Model Dir: {}", dir.display());
        }
        println!("  Default Model: {}", self.engine.default_model);
        println!("  Default Language: {}", self.engine.default_language);
        println!("  Default Format: {}", self.app.default_format);
    }
}
