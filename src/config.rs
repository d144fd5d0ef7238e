//! Configuration management for docusync using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platform::Transport;
use crate::sync::{FieldUpdate, WatchOptions};
use crate::table::{DEFAULT_DATE_FORMAT, DEFAULT_PAGE_SIZE};

/// Default relay bind address.
pub const DEFAULT_RELAY_HOST: &str = "0.0.0.0";
pub const DEFAULT_RELAY_PORT: u16 = 3001;

/// Folder watcher settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct SyncConfig {
    /// Seconds between scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    /// Seconds without an eligible file before the watch stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    /// Field written after each successful upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_value: Option<String>,
}

impl SyncConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Local relay settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct RelayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
}

impl RelayConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Platform URL used by `login` when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_url: Option<String>,
    /// Route platform requests through a local relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Upload/download timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    /// chrono format string for date cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "SyncConfig::is_default")]
    #[prefer(default)]
    pub sync: SyncConfig,
    #[serde(default, skip_serializing_if = "RelayConfig::is_default")]
    #[prefer(default)]
    pub relay: RelayConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    pub async fn load() -> Self {
        match prefer::load("docusync").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if loaded from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref url) = self.platform_url {
            settings.platform_url = Some(url.clone());
        }
        if let Some(ref url) = self.relay_url {
            settings.relay_url = Some(url.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(timeout) = self.transfer_timeout {
            settings.transfer_timeout = timeout;
        }
        if let Some(size) = self.page_size.filter(|s| *s > 0) {
            settings.page_size = size as usize;
        }
        if let Some(ref format) = self.date_format {
            settings.date_format = format.clone();
        }

        let watch = &mut settings.watch;
        if let Some(secs) = self.sync.interval_secs.filter(|s| *s > 0) {
            watch.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.sync.idle_timeout_secs {
            watch.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.sync.max_attempts.filter(|a| *a > 0) {
            watch.max_attempts = u32::try_from(attempts).unwrap_or(u32::MAX);
        }
        if let (Some(field), Some(value)) = (&self.sync.update_field, &self.sync.update_value) {
            watch.update = Some(FieldUpdate {
                field: field.clone(),
                value: value.clone(),
            });
        }

        if let Some(ref host) = self.relay.host {
            settings.relay_host = host.clone();
        }
        if let Some(port) = self.relay.port.and_then(|p| u16::try_from(p).ok()) {
            settings.relay_port = port;
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Holds the session and the control/status store.
    pub data_dir: PathBuf,
    pub platform_url: Option<String>,
    pub relay_url: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Upload/download timeout in seconds.
    pub transfer_timeout: u64,
    pub page_size: usize,
    pub date_format: String,
    pub watch: WatchOptions,
    pub relay_host: String,
    pub relay_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        // Local data dir -> Home dir -> Current dir
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docusync");

        Self {
            data_dir,
            platform_url: None,
            relay_url: None,
            request_timeout: 30,
            transfer_timeout: 120,
            page_size: DEFAULT_PAGE_SIZE,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            watch: WatchOptions::default(),
            relay_host: DEFAULT_RELAY_HOST.to_string(),
            relay_port: DEFAULT_RELAY_PORT,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// HTTP transport configured from these settings.
    pub fn transport(&self) -> Transport {
        Transport::new(
            Duration::from_secs(self.request_timeout),
            Duration::from_secs(self.transfer_timeout),
            self.relay_url.clone(),
        )
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (--config flag).
    pub config_path: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Config::default()
        }),
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    // DOCUSYNC_RELAY_URL takes precedence over config
    if let Some(relay) = std::env::var("DOCUSYNC_RELAY_URL")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using DOCUSYNC_RELAY_URL from environment: {}", relay);
        settings.relay_url = Some(relay);
    }

    (settings, config)
}
