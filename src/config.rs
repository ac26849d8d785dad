use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{GenerationParameters, Region};

pub const DEFAULT_BASE_URL: &str = "https://bekhruzbek.uz/api";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub region: Region,
    pub error_amount: u32,
    pub seed: u64,
    /// Rows from the end of the table at which the next page is requested.
    pub scroll_threshold: usize,
    pub export_path: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            region: Region::US,
            error_amount: 0,
            seed: 0,
            scroll_threshold: 5,
            export_path: PathBuf::from("users_data.csv"),
        }
    }
}

impl GeneratorConfig {
    pub fn initial_params(&self) -> GenerationParameters {
        GenerationParameters::new(self.region, self.error_amount, self.seed)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// ~/.config/rugen (Linux) or ~/Library/Application Support/rugen (macOS)
pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("rugen"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Config::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Config::default()
            }
        }
    }
}
