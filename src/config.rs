// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional TOML configuration, usually at `~/.config/podsync/config.toml`.
//!
//! A missing file yields `Config::default()`. Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sync::SyncOptions;

const MAX_REFRESH_INTERVAL_MINUTES: u64 = 60 * 24 * 365;

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the library file. Defaults to `~/.local/share/podsync/library.json`.
    pub library_path: Option<PathBuf>,

    /// Minutes between scheduled update cycles
    pub refresh_interval_minutes: u64,

    /// Podcasts checked at once. 0 = unlimited.
    pub max_concurrent: usize,

    /// Seconds before a feed fetch is abandoned. 0 = never.
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: None,
            refresh_interval_minutes: 60,
            max_concurrent: 4,
            fetch_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Interval between scheduled update cycles, between one minute and one year
    pub fn refresh_interval(&self) -> Duration {
        let minutes = self
            .refresh_interval_minutes
            .clamp(1, MAX_REFRESH_INTERVAL_MINUTES);
        Duration::from_secs(minutes * 60)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            max_concurrent: Some(self.max_concurrent).filter(|n| *n > 0),
            fetch_timeout: Some(self.fetch_timeout_secs)
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Default config directory (~/.config/podsync/)
pub fn default_config_dir(home: &Path) -> PathBuf {
    home.join(".config").join("podsync")
}

/// Default library file (~/.local/share/podsync/library.json)
pub fn default_library_path(home: &Path) -> PathBuf {
    home.join(".local")
        .join("share")
        .join("podsync")
        .join("library.json")
}
