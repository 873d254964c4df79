//! Configuration module for erdm.
//!
//! Handles the TOML config file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, NamingSettings, OutputFormat, OutputSettings, Settings, SettingsError,
    SourceKind, SourceSettings,
};
