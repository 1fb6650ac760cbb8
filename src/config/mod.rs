// Server and endpoint settings
//
// Resolved from four layers, highest priority first: command line,
// environment (both through clap), the settings file, built-in defaults.

pub mod merger;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use merger::{PartialSettings, SettingsMerger};

pub const DEFAULT_IDEA_ENDPOINT: &str = "http://115.190.109.17:5678/webhook/set";
pub const DEFAULT_CONTENT_ENDPOINT: &str = "http://115.190.109.17:5678/webhook/content1";
pub const DEFAULT_PORT: u16 = 3420;
pub const DEFAULT_BIND: &str = "127.0.0.1";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Effective settings after all layers are merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Idea-generation service
    pub idea_endpoint: String,
    /// Content-generation services, tried in order
    pub content_endpoints: Vec<String>,
    pub port: u16,
    pub bind: String,
    /// Allowed browser origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idea_endpoint: DEFAULT_IDEA_ENDPOINT.to_string(),
            content_endpoints: vec![DEFAULT_CONTENT_ENDPOINT.to_string()],
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// Reject settings the workflow cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.idea_endpoint.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "idea endpoint must not be empty".to_string(),
            ));
        }
        if self.content_endpoints.is_empty() {
            return Err(SettingsError::Invalid(
                "at least one content endpoint is required".to_string(),
            ));
        }
        if let Some(blank) = self
            .content_endpoints
            .iter()
            .position(|e| e.trim().is_empty())
        {
            return Err(SettingsError::Invalid(format!(
                "content endpoint #{} is empty",
                blank + 1
            )));
        }
        Ok(())
    }
}

/// Default settings file location
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("idea-forge").join("settings.toml"))
}

/// Load a settings file; a missing file yields `None`
pub fn load_settings_file(path: &Path) -> Result<Option<PartialSettings>, SettingsError> {
    if !path.exists() {
        log::debug!("No settings file at {}", path.display());
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let partial: PartialSettings =
        toml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    log::info!("Loaded settings from {}", path.display());
    Ok(Some(partial))
}

/// Resolve the effective settings.
///
/// `file` overrides the default settings path; `overrides` carries the
/// command-line and environment values.
pub fn resolve_settings(
    file: Option<&Path>,
    overrides: PartialSettings,
) -> Result<Settings, SettingsError> {
    let file_layer = match file.map(Path::to_path_buf).or_else(default_settings_path) {
        Some(path) => load_settings_file(&path)?,
        None => None,
    };

    let settings = SettingsMerger::new()
        .with_file(file_layer)
        .with_overrides(Some(overrides))
        .merge();
    settings.validate()?;
    Ok(settings)
}
