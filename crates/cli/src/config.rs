use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "studyhall.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Overrides the default data directory (`~/.local/share/studyhall`).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssistantConfig {
    /// Assistant endpoint URL; empty keeps the assistant local.
    #[serde(default)]
    pub endpoint: String,
}

impl CliConfig {
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(home_dir()?.join(".local").join("share").join("studyhall")),
        }
    }

    pub fn assistant_endpoint(&self) -> Option<String> {
        let endpoint = self.assistant.endpoint.trim();
        if endpoint.is_empty() {
            None
        } else {
            Some(endpoint.to_string())
        }
    }
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home))
}

/// Config directory path (`~/.config/studyhall/`).
pub fn config_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("studyhall"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load() -> Result<CliConfig> {
    let path = config_path()?;
    load_from(&path)
}

fn load_from(path: &Path) -> Result<CliConfig> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config at {}", path.display()))
}

fn save(config: &CliConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

pub fn show_config() -> Result<()> {
    let config = load()?;
    println!("config file: {}", config_path()?.display());
    println!("data dir:    {}", config.data_dir()?.display());
    match config.assistant_endpoint() {
        Some(endpoint) => println!("assistant:   {endpoint}"),
        None => println!("assistant:   (local replies only)"),
    }
    Ok(())
}

pub fn set_config(data_dir: Option<PathBuf>, assistant_endpoint: Option<String>) -> Result<()> {
    let mut config = load()?;
    if let Some(dir) = data_dir {
        config.storage.data_dir = Some(dir);
    }
    if let Some(endpoint) = assistant_endpoint {
        config.assistant.endpoint = endpoint;
    }
    save(&config)?;
    println!("Configuration updated.");
    Ok(())
}
