// SPDX-License-Identifier: MPL-2.0

//! Shared configuration types for backdrop.
//!
//! The daemon and `backdrop-ctl` both read [`Config`] from
//! `$XDG_CONFIG_HOME/backdrop/config.ron`. Every field carries a default, so a
//! missing file or a partial file is valid.

mod theme;

pub use theme::Theme;

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "backdrop";
pub const CONFIG_FILE: &str = "config.ron";
pub const PREFERENCES_FILE: &str = "preferences.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown theme {0:?}, expected \"dark\" or \"light\"")]
    UnknownTheme(String),

    #[error("no platform configuration directory available")]
    NoConfigDir,

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] ron::Error),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct Config {
    /// Base URL of the backend serving the wallpaper list.
    #[setters(into)]
    pub endpoint: String,
    /// Path of the wallpaper list relative to `endpoint`.
    #[setters(into)]
    pub wallpaper_path: String,
    pub rotation_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Warm the image cache after every successful fetch.
    pub preload: bool,
    /// Upper bound on concurrent preload downloads.
    pub preload_concurrency: usize,
    pub cache_max_entries: usize,
    /// 0 = unlimited
    pub cache_max_size_mb: usize,
    /// Overrides the default preferences file location.
    #[setters(strip_option)]
    pub preferences_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_owned(),
            wallpaper_path: "/api/wallpaper".to_owned(),
            rotation_interval_ms: 30_000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            preload: true,
            preload_concurrency: 4,
            cache_max_entries: 16,
            cache_max_size_mb: 256,
            preferences_path: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(why) if why.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Full URL of the wallpaper list.
    pub fn wallpaper_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.wallpaper_path.trim_start_matches('/')
        )
    }

    /// Where the persisted preferences live.
    pub fn preferences_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join(PREFERENCES_FILE)),
        }
    }
}

/// `$XDG_CONFIG_HOME/backdrop`
pub fn app_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dir()?.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "backdrop-config-{}-{name}",
            std::process::id()
        ))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rotation_interval(), Duration::from_secs(30));
        assert_eq!(config.wallpaper_url(), "http://127.0.0.1:8000/api/wallpaper");
        assert!(config.preload);
    }

    #[test]
    fn test_wallpaper_url_normalizes_slashes() {
        let config = Config::default()
            .with_endpoint("https://example.org/")
            .with_wallpaper_path("api/wallpaper");
        assert_eq!(config.wallpaper_url(), "https://example.org/api/wallpaper");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = scratch("missing").join("config.ron");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = scratch("partial");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ron");
        fs::write(&path, "(rotation_interval_ms: 5000, preload: false)").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.rotation_interval_ms, 5000);
        assert!(!config.preload);
        assert_eq!(config.endpoint, Config::default().endpoint);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch("save");
        let path = dir.join("nested").join("config.ron");
        let config = Config::default()
            .with_endpoint("http://10.0.0.2:9000")
            .with_preload_concurrency(2)
            .with_preferences_path(dir.join("prefs.ron"));

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
        assert_eq!(config.preferences_file().unwrap(), dir.join("prefs.ron"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = scratch("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ron");
        fs::write(&path, "(rotation_interval_ms: \"soon\")").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
