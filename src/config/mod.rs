// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for songcast.
//!
//! Settings are read from a YAML or TOML file; every field has a default so
//! a partial (or missing) file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::store::SESSION_KEY;
use crate::session::FileSessionStore;
use crate::song::HeadingPolicy;
use crate::sync::CHANNEL_NAME;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding the persisted session
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Key (file stem) of the persisted session
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// Name of the sync channel
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    /// Treatment of `## ` headings that name no part type
    #[serde(default)]
    pub unrecognized_headings: HeadingPolicy,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Debounce for the store watcher in milliseconds
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".songcast")
}
fn default_session_key() -> String {
    SESSION_KEY.to_string()
}
fn default_channel_name() -> String {
    CHANNEL_NAME.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_watch_debounce_ms() -> u64 {
    250
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            session_key: default_session_key(),
            channel_name: default_channel_name(),
            unrecognized_headings: HeadingPolicy::default(),
            log_level: default_log_level(),
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl Config {
    /// Load settings from a `.toml` file, or YAML for any other extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Load settings if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse settings from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse settings from TOML
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save settings as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Session store described by these settings
    pub fn store(&self) -> FileSessionStore {
        FileSessionStore::new(&self.store_dir, &self.session_key)
    }

    /// Parsed log level, falling back to info
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
