use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::store;

const DEFAULT_TITLE: &str = "Polipone";
const DEFAULT_EXPORT: &str = "polipone.xlsx";

/// Runtime settings from the environment (`.env.local` and `.env` are loaded first).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub export_path: PathBuf,
    pub title: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, so tests need not touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty("POLIPONE_DB")
            .map(PathBuf::from)
            .or_else(store::default_db_path)
            .context("unable to resolve sqlite path (set POLIPONE_DB)")?;
        let export_path = non_empty("POLIPONE_EXPORT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT));
        let title = non_empty("POLIPONE_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Ok(Self {
            db_path,
            export_path,
            title,
        })
    }

    /// Applies `--db`/`--out` style overrides from the command line.
    pub fn with_overrides(mut self, db: Option<PathBuf>, out: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if let Some(out) = out {
            self.export_path = out;
        }
        self
    }
}
