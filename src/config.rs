use crate::consistency::CheckerConfig;
use crate::nlp::NlpConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DATA_DIR: &str = ".storyteller";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorytellerConfig {
    pub database: Option<String>,
    pub server: ServerConfig,
    pub checker: CheckerConfig,
    pub nlp: NlpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `["*"]` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl StorytellerConfig {
    /// Starter config written by `storyteller init`
    pub fn starter() -> Self {
        Self {
            database: Some(default_database_path_in(Path::new("")).display().to_string()),
            ..Default::default()
        }
    }

    /// Database path: explicit flag, then config, then the default location
    pub fn database_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| default_database_path_in(Path::new("")))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("storyteller.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR).join("storyteller.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StorytellerConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StorytellerConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StorytellerConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Add the data directory to `.gitignore` once.
pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = format!("{}/", DATA_DIR);

    let mut content = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };
    if content.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
