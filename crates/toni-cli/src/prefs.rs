// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toni_app::prefs::UiPreferences;
use tracing::warn;

const PREFS_FILE_NAME: &str = "ui_prefs.json";

/// Table preferences stored as JSON next to the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefsFile {
    path: PathBuf,
}

impl PrefsFile {
    pub fn beside(config_path: &Path) -> Self {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self {
            path: dir.join(PREFS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load(&self) -> UiPreferences {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return UiPreferences::default();
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "read preferences; using defaults");
                return UiPreferences::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "corrupt preferences; using defaults");
                UiPreferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &UiPreferences) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("create preferences directory {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(prefs).context("encode preferences")?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, body)
            .with_context(|| format!("write preferences {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replace preferences {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PrefsFile;
    use anyhow::Result;
    use toni_app::prefs::{TablePrefs, UiPreferences};

    #[test]
    fn prefs_live_next_to_the_config_file() {
        let file = PrefsFile::beside(std::path::Path::new("/etc/toni/config.toml"));
        assert_eq!(file.path(), std::path::Path::new("/etc/toni/ui_prefs.json"));
    }

    #[test]
    fn missing_file_loads_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = PrefsFile::beside(&temp.path().join("config.toml"));
        assert_eq!(file.load(), UiPreferences::default());
        Ok(())
    }

    #[test]
    fn corrupt_file_loads_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = PrefsFile::beside(&temp.path().join("config.toml"));
        std::fs::write(file.path(), "{\"visits\": [")?;
        assert_eq!(file.load(), UiPreferences::default());
        Ok(())
    }

    #[test]
    fn saved_prefs_load_back() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = PrefsFile::beside(&temp.path().join("nested").join("config.toml"));

        let mut prefs = UiPreferences::default();
        prefs.visits = TablePrefs {
            sort_key: Some("rating".to_owned()),
            sort_desc: true,
            hidden_columns: ["notes".to_owned()].into_iter().collect(),
            active_column: Some("name".to_owned()),
        };
        file.save(&prefs)?;

        assert_eq!(file.load(), prefs);
        assert!(!file.path().with_extension("json.tmp").exists());
        Ok(())
    }

    #[test]
    fn partial_file_fills_missing_lists_with_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = PrefsFile::beside(&temp.path().join("config.toml"));
        std::fs::write(
            file.path(),
            r#"{"restaurants":{"sort_key":"name","hidden_columns":["city"]}}"#,
        )?;

        let prefs = file.load();
        assert_eq!(prefs.restaurants.sort_key.as_deref(), Some("name"));
        assert!(prefs.restaurants.hidden_columns.contains("city"));
        assert_eq!(prefs.visits, TablePrefs::default());
        Ok(())
    }
}
