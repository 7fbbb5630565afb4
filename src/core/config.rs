use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::state::SceneUnit;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub unattended: bool,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub project: ProjectConfig,
}

/// Where the per-scene analysis service lives.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AggregationConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub scenes: Vec<SceneUnit>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            force: false,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_endpoint() -> String {
    "/api/scenes/characters".to_string()
}
fn default_concurrency() -> usize {
    1
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(CONFIG_FILE)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
