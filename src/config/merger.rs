// Settings merging with priority

use super::Settings;
use serde::{Deserialize, Serialize};

/// Partial settings for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PartialSettings {
    #[serde(default)]
    pub idea_endpoint: Option<String>,
    #[serde(default)]
    pub content_endpoints: Option<Vec<String>>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
}

/// Settings merger
/// Priority order: overrides (CLI / env) -> file -> defaults
pub struct SettingsMerger {
    defaults: Settings,
    file: Option<PartialSettings>,
    overrides: Option<PartialSettings>,
}

impl SettingsMerger {
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
            file: None,
            overrides: None,
        }
    }

    pub fn with_file(mut self, file: Option<PartialSettings>) -> Self {
        self.file = file;
        self
    }

    pub fn with_overrides(mut self, overrides: Option<PartialSettings>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Merge all layers with priority
    pub fn merge(&self) -> Settings {
        let mut result = self.defaults.clone();

        if let Some(ref file) = self.file {
            result = Self::merge_partial(&result, file);
        }

        // Command line and environment win over everything
        if let Some(ref overrides) = self.overrides {
            result = Self::merge_partial(&result, overrides);
        }

        result
    }

    fn merge_partial(base: &Settings, partial: &PartialSettings) -> Settings {
        Settings {
            idea_endpoint: partial
                .idea_endpoint
                .clone()
                .unwrap_or_else(|| base.idea_endpoint.clone()),
            content_endpoints: partial
                .content_endpoints
                .clone()
                .unwrap_or_else(|| base.content_endpoints.clone()),
            port: partial.port.unwrap_or(base.port),
            bind: partial.bind.clone().unwrap_or_else(|| base.bind.clone()),
            cors_origins: partial
                .cors_origins
                .clone()
                .unwrap_or_else(|| base.cors_origins.clone()),
        }
    }
}

impl Default for SettingsMerger {
    fn default() -> Self {
        Self::new()
    }
}
