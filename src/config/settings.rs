//! TOML-based configuration for erdm.
//!
//! Supports a config file (erdm.toml) with environment variable expansion
//! in paths.
//!
//! Example configuration:
//! ```toml
//! [source]
//! kind = "sqlite"
//! path = "${APP_DB}"
//!
//! [naming]
//! convention = "lower"
//!
//! [output]
//! format = "json"
//! path = "./erd/graph.json"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::naming::NamingConvention;
use crate::store::SqliteGraphStore;

const DEFAULT_JSON_OUTPUT: &str = "erd.json";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where rows come from.
    pub source: SourceSettings,

    /// Identifier normalization.
    pub naming: NamingSettings,

    /// Where the graph goes.
    pub output: OutputSettings,
}

/// Kind of row source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON array of metadata rows
    #[default]
    Json,
    /// SQLite database to introspect
    Sqlite,
}

/// Row source configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,

    /// Source path (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl SourceSettings {
    /// The source path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| SettingsError::InvalidConfig("source.path is not set".to_string()))?;
        Ok(PathBuf::from(expand_env_vars(path)?))
    }
}

/// Naming configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingSettings {
    pub convention: NamingConvention,
}

/// Graph output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Sqlite,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,

    /// Output path (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl OutputSettings {
    /// The output path with environment variables expanded.
    ///
    /// Without a path, JSON goes to `./erd.json` and SQLite to
    /// [`SqliteGraphStore::default_path`].
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        match (&self.path, self.format) {
            (Some(path), _) => Ok(PathBuf::from(expand_env_vars(path)?)),
            (None, OutputFormat::Json) => Ok(PathBuf::from(DEFAULT_JSON_OUTPUT)),
            (None, OutputFormat::Sqlite) => SqliteGraphStore::default_path().ok_or_else(|| {
                SettingsError::InvalidConfig(
                    "output.path is not set and no data directory is available".to_string(),
                )
            }),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ERDM_CONFIG`
    /// 2. `./erdm.toml`
    /// 3. `~/.config/erdm/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("ERDM_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("erdm.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("erdm").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
