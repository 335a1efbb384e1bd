use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Endpoints and options for the document source and the entity-extraction
/// service.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Base URL of the file-listing API.
    #[serde(default = "default_drive_base")]
    pub drive_base_url: String,
    /// Base URL of the document-content API.
    #[serde(default = "default_docs_base")]
    pub docs_base_url: String,
    /// Base URL of the entity-extraction API.
    #[serde(default = "default_nlp_base")]
    pub nlp_base_url: String,
    /// Bearer token sent with every request, if set. Token acquisition is
    /// out of scope; supply one obtained elsewhere.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_drive_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}
fn default_docs_base() -> String {
    "https://docs.googleapis.com/v1".to_string()
}
fn default_nlp_base() -> String {
    "https://language.googleapis.com/v1".to_string()
}
fn default_page_size() -> i64 {
    100
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            drive_base_url: default_drive_base(),
            docs_base_url: default_docs_base(),
            nlp_base_url: default_nlp_base(),
            api_token: None,
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.source.page_size < 1 {
        anyhow::bail!("source.page_size must be >= 1");
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must be set");
    }

    Ok(config)
}
