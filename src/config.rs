use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `taxtree.toml`. Every key is optional; command-line flags win.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TaxtreeConfig {
    pub database: Option<String>,
    pub dump_dir: Option<String>,
}

impl TaxtreeConfig {
    /// Database path: flag, then config, then `taxtree.db`
    pub fn database_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path)
    }

    /// Dump directory: flag, then config, then the working directory
    pub fn dump_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.dump_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("taxtree.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("taxtree.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TaxtreeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TaxtreeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TaxtreeConfig, force: bool) -> anyhow::Result<()> {
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
