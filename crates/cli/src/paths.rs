//! Resolution of the config file and database locations.
//!
//! Explicit flags win. Otherwise the config lives in the platform config
//! directory and the database in the platform data directory, as reported
//! by `directories`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const CONFIG_FILE: &str = "cashwise.toml";
const DB_FILE: &str = "cashwise.db";

#[derive(Debug, Clone, PartialEq)]
pub struct CashwisePaths {
    pub config_file: PathBuf,
    pub db_file: PathBuf,
}

impl CashwisePaths {
    pub fn resolve(config: Option<PathBuf>, db: Option<PathBuf>) -> Result<Self> {
        if let (Some(config_file), Some(db_file)) = (config.clone(), db.clone()) {
            return Ok(Self {
                config_file,
                db_file,
            });
        }

        let dirs = directories::ProjectDirs::from("com", "cashwise", "Cashwise")
            .context("could not determine a home directory; pass --config and --db")?;
        Ok(Self::with_defaults(
            config,
            db,
            dirs.config_dir(),
            dirs.data_dir(),
        ))
    }

    fn with_defaults(
        config: Option<PathBuf>,
        db: Option<PathBuf>,
        config_dir: &Path,
        data_dir: &Path,
    ) -> Self {
        Self {
            config_file: config.unwrap_or_else(|| config_dir.join(CONFIG_FILE)),
            db_file: db.unwrap_or_else(|| data_dir.join(DB_FILE)),
        }
    }

    /// Creates the database's parent directory.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        Ok(())
    }
}
