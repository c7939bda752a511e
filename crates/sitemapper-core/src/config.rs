//! Configuration for sitemap generation runs.
//!
//! Configuration is stored in TOML and layered as: built-in defaults, then the
//! config file, then `SITEMAPPER_*` environment variables. The CLI applies its
//! flags on top.
//!
//! ## File Location
//!
//! - Linux: `~/.config/sitemapper/config.toml`
//! - macOS: `~/Library/Application Support/dev.outfitter.sitemapper/config.toml`
//! - Windows: `%APPDATA%\outfitter\sitemapper\config\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [output]
//! folder = "public/sitemaps"
//! base_url = "https://example.com/sitemaps/"
//! index_name = "sitemap_index.xml.gz"
//!
//! [limits]
//! max_entries = 50000
//! max_bytes = 10485760
//!
//! [flush]
//! max_in_flight = 4
//!
//! [ping]
//! enabled = true
//! endpoints = ["http://www.google.com/ping"]
//! timeout_secs = 10
//! ```
//!
//! ```rust,no_run
//! use sitemapper_core::{Config, Result};
//!
//! let mut config = Config::load()?;
//! config.apply_env_overrides();
//! config.validate()?;
//! println!("Writing into {}", config.output.folder.display());
//! # Ok::<(), sitemapper_core::Error>(())
//! ```

use crate::codec::{Limits, MAX_BYTES, MAX_ENTRIES};
use crate::group::{DEFAULT_MAX_IN_FLIGHT, GroupOptions};
use crate::ping::{DEFAULT_PING_ENDPOINTS, DEFAULT_PING_TIMEOUT_SECS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `output.folder`.
pub const ENV_FOLDER: &str = "SITEMAPPER_FOLDER";
/// Environment variable overriding `output.base_url`.
pub const ENV_BASE_URL: &str = "SITEMAPPER_BASE_URL";
/// Environment variable overriding `output.index_name`.
pub const ENV_INDEX_NAME: &str = "SITEMAPPER_INDEX_NAME";
/// Environment variable overriding `flush.max_in_flight`.
pub const ENV_MAX_IN_FLIGHT: &str = "SITEMAPPER_MAX_IN_FLIGHT";
/// Environment variable overriding `ping.enabled`.
pub const ENV_PING: &str = "SITEMAPPER_PING";

/// Settings for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where files go and how they are addressed.
    pub output: OutputConfig,
    /// Per-document limits.
    pub limits: Limits,
    /// Flush concurrency.
    pub flush: FlushConfig,
    /// Search-engine notification.
    pub ping: PingConfig,
}

/// Output location settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder receiving produced files.
    pub folder: PathBuf,
    /// Public URL prefix of the folder, used for index locations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// File name of the index document.
    pub index_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("sitemaps"),
            base_url: None,
            index_name: "sitemap_index.xml.gz".to_string(),
        }
    }
}

/// Flush concurrency settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Concurrent encode+persist jobs per group.
    pub max_in_flight: usize,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Search-engine ping settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    /// Ping after writing an index.
    pub enabled: bool,
    /// Endpoints receiving `?sitemap=<index url>`.
    pub endpoints: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: DEFAULT_PING_ENDPOINTS.iter().map(ToString::to_string).collect(),
            timeout_secs: DEFAULT_PING_TIMEOUT_SECS,
        }
    }
}

impl PingConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load the configuration from the platform config directory.
    ///
    /// Returns defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Default config file location, if the platform has a config directory.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "outfitter", "sitemapper")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply `SITEMAPPER_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(folder) = lookup(ENV_FOLDER).filter(|v| !v.is_empty()) {
            self.output.folder = PathBuf::from(folder);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.output.base_url = Some(base_url);
        }
        if let Some(index_name) = lookup(ENV_INDEX_NAME).filter(|v| !v.is_empty()) {
            self.output.index_name = index_name;
        }
        if let Some(max_in_flight) = lookup(ENV_MAX_IN_FLIGHT).and_then(|v| v.trim().parse().ok())
        {
            self.flush.max_in_flight = max_in_flight;
        }
        if let Some(ping) = lookup(ENV_PING) {
            self.ping.enabled = matches!(ping.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero or above-protocol limits, a zero
    /// flush bound, an index name without the `.xml.gz` suffix, or an invalid
    /// base URL.
    pub fn validate(&self) -> Result<()> {
        let Limits {
            max_entries,
            max_bytes,
        } = self.limits;
        if max_entries == 0 || max_entries > MAX_ENTRIES {
            return Err(Error::Config(format!(
                "limits.max_entries must be between 1 and {MAX_ENTRIES}, got {max_entries}"
            )));
        }
        if max_bytes == 0 || max_bytes > MAX_BYTES {
            return Err(Error::Config(format!(
                "limits.max_bytes must be between 1 and {MAX_BYTES}, got {max_bytes}"
            )));
        }
        if self.flush.max_in_flight == 0 {
            return Err(Error::Config("flush.max_in_flight must be at least 1".into()));
        }
        if !self.output.index_name.ends_with(crate::group::FILE_SUFFIX) {
            return Err(Error::Config(format!(
                "output.index_name '{}' must end with {}",
                self.output.index_name,
                crate::group::FILE_SUFFIX
            )));
        }
        if let Some(base_url) = &self.output.base_url {
            url::Url::parse(base_url)
                .map_err(|e| Error::Config(format!("output.base_url '{base_url}': {e}")))?;
        }
        Ok(())
    }

    /// Group options derived from the limits and flush settings.
    #[must_use]
    pub const fn group_options(&self) -> GroupOptions {
        GroupOptions {
            limits: self.limits,
            mobile: false,
            max_in_flight: self.flush.max_in_flight,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.output.folder, PathBuf::from("sitemaps"));
        assert_eq!(config.output.index_name, "sitemap_index.xml.gz");
        assert!(config.output.base_url.is_none());
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.flush.max_in_flight, 4);
        assert!(!config.ping.enabled);
        assert_eq!(config.ping.endpoints.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load_roundtrip() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.output.base_url = Some("https://example.com/".into());
        config.limits = Limits::new(1000, 1024 * 1024);
        config.ping.enabled = true;

        config.save(&path)?;
        let loaded = Config::load_from(&path)?;

        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\nfolder = \"public\"\n\n[limits]\nmax_entries = 10\n").unwrap();

        let config = Config::load_from(&path)?;
        assert_eq!(config.output.folder, PathBuf::from("public"));
        assert_eq!(config.output.index_name, "sitemap_index.xml.gz");
        assert_eq!(config.limits.max_entries, 10);
        assert_eq!(config.limits.max_bytes, MAX_BYTES);
        assert_eq!(config.flush.max_in_flight, 4);
        Ok(())
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Failed to read")));
    }

    #[test]
    fn test_config_parse_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[limits\nmax_entries = ").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Failed to parse")));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            (ENV_FOLDER, "/srv/sitemaps"),
            (ENV_BASE_URL, "https://cdn.example.com/"),
            (ENV_INDEX_NAME, "index.xml.gz"),
            (ENV_MAX_IN_FLIGHT, "8"),
            (ENV_PING, "true"),
        ]));

        assert_eq!(config.output.folder, PathBuf::from("/srv/sitemaps"));
        assert_eq!(
            config.output.base_url.as_deref(),
            Some("https://cdn.example.com/")
        );
        assert_eq!(config.output.index_name, "index.xml.gz");
        assert_eq!(config.flush.max_in_flight, 8);
        assert!(config.ping.enabled);
    }

    #[test]
    fn test_unparseable_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[(ENV_MAX_IN_FLIGHT, "many"), (ENV_FOLDER, "")]));
        assert_eq!(config.flush.max_in_flight, 4);
        assert_eq!(config.output.folder, PathBuf::from("sitemaps"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let cases: Vec<Box<dyn Fn(&mut Config)>> = vec![
            Box::new(|c: &mut Config| c.limits.max_entries = 0),
            Box::new(|c: &mut Config| c.limits.max_entries = MAX_ENTRIES + 1),
            Box::new(|c: &mut Config| c.limits.max_bytes = MAX_BYTES + 1),
            Box::new(|c: &mut Config| c.flush.max_in_flight = 0),
            Box::new(|c: &mut Config| c.output.index_name = "index.xml".into()),
            Box::new(|c: &mut Config| c.output.base_url = Some("not a url".into())),
        ];

        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_group_options_follow_config() {
        let mut config = Config::default();
        config.limits = Limits::new(10, 2048);
        config.flush.max_in_flight = 2;

        let options = config.group_options();
        assert_eq!(options.limits, Limits::new(10, 2048));
        assert_eq!(options.max_in_flight, 2);
        assert!(!options.mobile);
    }

    proptest! {
        #[test]
        fn test_config_limits_roundtrip(
            max_entries in 1usize..=MAX_ENTRIES,
            max_bytes in 1usize..=MAX_BYTES,
        ) {
            let mut config = Config::default();
            config.limits = Limits::new(max_entries, max_bytes);
            let encoded = toml::to_string_pretty(&config).unwrap();
            let decoded: Config = toml::from_str(&encoded).unwrap();
            prop_assert_eq!(decoded.limits, config.limits);
            prop_assert!(decoded.validate().is_ok());
        }
    }
}
