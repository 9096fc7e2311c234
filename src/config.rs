use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DEFAULT_DATABASE: &str = "DataBase";
pub const DEFAULT_TABLE: &str = "DataBaseStore";
pub const DEFAULT_INDEX: &str = "second_id_key";
pub const DEFAULT_VERSION: u32 = 1;

/// Names and version of the store, fixed for the lifetime of a `RecordStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: String,
    pub table: String,
    pub index: String,
    pub version: u32,
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            index: DEFAULT_INDEX.to_string(),
            version: DEFAULT_VERSION,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// Config rooted at `data_dir`, everything else default
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("database", &self.database),
            ("table", &self.table),
            ("index", &self.index),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} name must not be empty", field)));
            }
        }
        if self.database.contains(['/', '\\']) || self.database == ".." {
            return Err(Error::Config(format!(
                "database name {:?} must not contain path separators",
                self.database
            )));
        }
        if self.version == 0 {
            return Err(Error::Config("version must be at least 1".to_string()));
        }
        Ok(())
    }

    /// File backing the database inside `data_dir`
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.sqlite3", self.database))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("recordstore.toml")
}

pub fn default_data_dir_in(base: &Path) -> PathBuf {
    base.join(".recordstore")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".recordstore/";

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
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
