// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_DEBOUNCE: &str = "300ms";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub places: Places,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            places: Places::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub half_page: Option<HalfPage>,
}

/// `"auto"` or a row count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HalfPage {
    Rows(i64),
    Named(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Places {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub location: Option<String>,
    pub timeout: Option<String>,
    pub debounce: Option<String>,
}

impl Default for Places {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            api_key: None,
            base_url: Some(toni_places::DEFAULT_BASE_URL.to_owned()),
            location: Some(toni_places::DEFAULT_LOCATION.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            debounce: Some(DEFAULT_DEBOUNCE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TONI_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TONI_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(toni_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            toni_db::validate_db_path(db_path)?;
        }

        match &self.ui.half_page {
            Some(HalfPage::Rows(rows)) if *rows <= 0 => bail!(
                "ui.half_page in {} must be positive, got {}",
                path.display(),
                rows
            ),
            Some(HalfPage::Named(name)) if name != "auto" => bail!(
                "ui.half_page in {} must be \"auto\" or a row count, got {:?}",
                path.display(),
                name
            ),
            _ => {}
        }

        for (key, raw) in [
            ("places.timeout", &self.places.timeout),
            ("places.debounce", &self.places.debounce),
        ] {
            if let Some(raw) = raw
                && parse_duration(raw)? <= Duration::ZERO
            {
                bail!(
                    "{key} in {} must be positive, got {}",
                    path.display(),
                    raw
                );
            }
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => toni_db::default_db_path(),
        }
    }

    pub fn half_page(&self) -> Option<usize> {
        match self.ui.half_page {
            Some(HalfPage::Rows(rows)) => usize::try_from(rows).ok().filter(|rows| *rows > 0),
            _ => None,
        }
    }

    pub fn places_enabled(&self) -> bool {
        self.places.enabled.unwrap_or(true)
    }

    /// Config value first, then `TONI_PLACES_API_KEY`, then `YELP_API_KEY`.
    pub fn places_api_key(&self) -> Option<String> {
        let configured = self
            .places
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_owned);
        configured.or_else(|| {
            ["TONI_PLACES_API_KEY", "YELP_API_KEY"]
                .into_iter()
                .filter_map(|name| env::var(name).ok())
                .map(|key| key.trim().to_owned())
                .find(|key| !key.is_empty())
        })
    }

    pub fn places_base_url(&self) -> &str {
        self.places
            .base_url
            .as_deref()
            .unwrap_or(toni_places::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn places_location(&self) -> &str {
        self.places
            .location
            .as_deref()
            .unwrap_or(toni_places::DEFAULT_LOCATION)
    }

    pub fn places_timeout(&self) -> Result<Duration> {
        parse_duration(self.places.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        parse_duration(self.places.debounce.as_deref().unwrap_or(DEFAULT_DEBOUNCE))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to a writable path")
        })?;
        Ok(data_root.join(toni_db::APP_NAME).join("toni.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# toni config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/toni/toni.db)\n# db_path = \"/absolute/path/to/toni.db\"\n\n[ui]\n# \"auto\" scrolls half the visible rows; an integer fixes the row count\nhalf_page = \"auto\"\n\n[places]\nenabled = true\n# Or set TONI_PLACES_API_KEY / YELP_API_KEY\napi_key = \"\"\nbase_url = \"{}\"\nlocation = \"{}\"\ntimeout = \"{}\"\ndebounce = \"{}\"\n\n[log]\n# TONI_LOG overrides this (EnvFilter syntax)\nlevel = \"{}\"\n# file = \"/absolute/path/to/toni.log\"\n",
            path.display(),
            toni_places::DEFAULT_BASE_URL,
            toni_places::DEFAULT_LOCATION,
            DEFAULT_TIMEOUT,
            DEFAULT_DEBOUNCE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 5s)")
}
