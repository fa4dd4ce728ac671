//! Configuration management for the pattern engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (calm.toml)
//! - Environment variables (CALM__*)
//!
//! ## Example config file (calm.toml):
//! ```toml
//! [schemas]
//! directory = "./calm/release"
//! extensions = ["json", "yaml"]
//!
//! [generate]
//! instantiate_all = false
//!
//! [logging]
//! filter = "calm_engine=debug"
//! format = "compact"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::LoadConfig;

/// Main configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schema loading settings
    #[serde(default)]
    pub schemas: SchemaSettings,

    /// Generate flow settings
    #[serde(default)]
    pub generate: GenerateSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where schemas are loaded from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Directory bulk-loaded before generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// File extensions treated as schema documents
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Relative path prefixes skipped during loading
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

/// Generate flow settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateSettings {
    /// Emit optional properties as well as required ones
    #[serde(default)]
    pub instantiate_all: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

// Default value functions
fn default_extensions() -> Vec<String> {
    LoadConfig::default().extensions
}

fn default_skip_prefixes() -> Vec<String> {
    LoadConfig::default().skip_prefixes
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            directory: None,
            extensions: default_extensions(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

impl SchemaSettings {
    /// Loader settings for [`crate::schema::FileSystemLoader`]
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            extensions: self.extensions.clone(),
            skip_prefixes: self.skip_prefixes.clone(),
        }
    }

    /// Schema directory resolved against the current directory
    pub fn directory_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["calm.toml", ".calm.toml", "config/calm.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("org", "finos", "calm") {
            let xdg_config = config_dir.config_dir().join("calm.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // CALM__SCHEMAS__DIRECTORY, CALM__GENERATE__INSTANTIATE_ALL, ...
        builder = builder.add_source(
            Environment::with_prefix("CALM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
