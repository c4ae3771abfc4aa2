use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "segsearch";
const CONFIG_FILE: &str = "config.json";

/// Engine configuration, optionally stored as JSON in the user config directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Auto-merge after ingestion while more than this many segments are open
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Tokenize ingestion batches on the rayon pool
    #[serde(default = "default_parallel_ingest")]
    pub parallel_ingest: bool,

    /// Number of results returned when a search does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// fsync segment files and the manifest before their commit rename
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_max_segments() -> usize {
    10
}

fn default_parallel_ingest() -> bool {
    true
}

fn default_k() -> usize {
    10
}

fn default_sync_writes() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_segments: default_max_segments(),
            parallel_ingest: default_parallel_ingest(),
            default_k: default_k(),
            sync_writes: default_sync_writes(),
        }
    }
}

impl EngineConfig {
    /// Load config from the user config directory, or return defaults if not found
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Location of the user config file (`<config_dir>/segsearch/config.json`)
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME).join(CONFIG_FILE))
}
