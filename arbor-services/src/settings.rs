// SPDX-License-Identifier: LGPL-3.0-only
//! Layered TOML configuration.

use crate::filesystem::AccessorBackend;
use anyhow::Result;
use serde::Deserialize;
use smol::fs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default address of the assistant service.
pub const DEFAULT_ASSISTANT_URL: &str = "http://localhost:8321";
/// Default request timeout for the assistant service, in seconds.
pub const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 120;
/// Default summary length passed to the summarizer.
pub const DEFAULT_SUMMARY_MAX_LENGTH: u32 = 500;
/// Default chunk overlap passed to the summarizer.
pub const DEFAULT_SUMMARY_OVERLAP: u32 = 100;

const CONFIG_FILE: &str = "config.toml";

/// The main configuration structure for the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General application settings
    #[serde(default)]
    pub general: GeneralSettings,
    /// Explorer behaviour
    #[serde(default)]
    pub explorer: ExplorerSettings,
    /// Assistant service connection
    #[serde(default)]
    pub assistant: AssistantSettings,
    /// Any other sections are captured here
    #[serde(flatten)]
    pub other: HashMap<String, toml::Value>,
}

impl Config {
    /// Built-in defaults, before any file is read.
    pub fn defaults() -> Self {
        Self {
            general: GeneralSettings {
                debug: Some(false),
                log_level: None,
            },
            explorer: ExplorerSettings {
                backend: Some(AccessorBackend::Auto),
                show_hidden: Some(false),
                start_path: None,
                excluded_directories: Some(Vec::new()),
                watch: Some(true),
            },
            assistant: AssistantSettings {
                base_url: Some(DEFAULT_ASSISTANT_URL.to_string()),
                timeout_secs: Some(DEFAULT_ASSISTANT_TIMEOUT_SECS),
                summary_max_length: Some(DEFAULT_SUMMARY_MAX_LENGTH),
                summary_overlap: Some(DEFAULT_SUMMARY_OVERLAP),
            },
            other: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralSettings {
    pub debug: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplorerSettings {
    /// `auto`, `native` or `memory`.
    pub backend: Option<AccessorBackend>,
    pub show_hidden: Option<bool>,
    /// Directory opened at startup instead of home.
    pub start_path: Option<PathBuf>,
    /// Directories never shown in the tree.
    pub excluded_directories: Option<Vec<PathBuf>>,
    /// Reload loaded directories when they change on disk.
    pub watch: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantSettings {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub summary_max_length: Option<u32>,
    pub summary_overlap: Option<u32>,
}

/// Registry for managing application settings.
pub struct SettingsRegistry {
    config: Config,
}

impl SettingsRegistry {
    /// Create a new SettingsRegistry and load configuration from standard locations.
    pub async fn new() -> Result<Self> {
        let mut registry = Self::with_defaults();
        registry.load().await?;
        Ok(registry)
    }

    /// A registry holding only the built-in defaults.
    pub fn with_defaults() -> Self {
        Self {
            config: Config::defaults(),
        }
    }

    /// Load configuration from standard locations in precedence order.
    ///
    /// Order (later overrides earlier):
    /// 1. System Data: /usr/share/arbor/config.toml (and XDG_DATA_DIRS)
    /// 2. System Config: /etc/xdg/arbor/config.toml (and XDG_CONFIG_DIRS)
    /// 3. User Config: ~/.config/arbor/config.toml (XDG_CONFIG_HOME)
    #[cfg(unix)]
    pub async fn load(&mut self) -> Result<()> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("arbor")?;

        for path in xdg_dirs.find_data_files(CONFIG_FILE).rev() {
            self.load_file(&path).await;
        }

        for path in xdg_dirs.find_config_files(CONFIG_FILE).rev() {
            self.load_file(&path).await;
        }

        let user_config_path = xdg_dirs.get_config_home().join(CONFIG_FILE);
        if user_config_path.exists() {
            self.load_file(&user_config_path).await;
        }

        Ok(())
    }

    /// Load the per-user configuration file from the platform config directory.
    #[cfg(not(unix))]
    pub async fn load(&mut self) -> Result<()> {
        if let Some(dirs) = directories::ProjectDirs::from("", "", "arbor") {
            let path = dirs.config_dir().join(CONFIG_FILE);
            if path.exists() {
                self.load_file(&path).await;
            }
        }
        Ok(())
    }

    async fn load_file(&mut self, path: &Path) {
        log::info!("Loading config from: {:?}", path);
        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(loaded_config) => {
                    self.merge(loaded_config);
                },
                Err(e) => {
                    log::error!("Failed to parse config file {:?}: {}", path, e);
                },
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
            },
        }
    }

    /// Merge a loaded config into the current config.
    fn merge(&mut self, other: Config) {
        let general = &mut self.config.general;
        if let Some(debug) = other.general.debug {
            general.debug = Some(debug);
        }
        if other.general.log_level.is_some() {
            general.log_level = other.general.log_level;
        }

        let explorer = &mut self.config.explorer;
        if other.explorer.backend.is_some() {
            explorer.backend = other.explorer.backend;
        }
        if let Some(show_hidden) = other.explorer.show_hidden {
            explorer.show_hidden = Some(show_hidden);
        }
        if other.explorer.start_path.is_some() {
            explorer.start_path = other.explorer.start_path;
        }
        if other.explorer.excluded_directories.is_some() {
            explorer.excluded_directories = other.explorer.excluded_directories;
        }
        if let Some(watch) = other.explorer.watch {
            explorer.watch = Some(watch);
        }

        let assistant = &mut self.config.assistant;
        if other.assistant.base_url.is_some() {
            assistant.base_url = other.assistant.base_url;
        }
        if other.assistant.timeout_secs.is_some() {
            assistant.timeout_secs = other.assistant.timeout_secs;
        }
        if other.assistant.summary_max_length.is_some() {
            assistant.summary_max_length = other.assistant.summary_max_length;
        }
        if other.assistant.summary_overlap.is_some() {
            assistant.summary_overlap = other.assistant.summary_overlap;
        }

        self.config.other.extend(other.other);
    }

    /// Get the current configuration.
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Load configuration from multiple custom paths asynchronously.
    pub async fn load_from_paths_async(&mut self, paths: Vec<PathBuf>) -> Vec<anyhow::Result<()>> {
        let mut results = Vec::new();

        for path in paths {
            let result = async {
                let content = fs::read_to_string(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;

                let loaded_config: Config = toml::from_str(&content)
                    .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", path, e))?;

                self.merge(loaded_config);
                Ok(())
            }
            .await;

            results.push(result);
        }

        results
    }
}
