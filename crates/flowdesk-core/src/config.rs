//! FlowDesk configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FlowdeskError, Result};

/// Environment variable that overrides `webhook.url`.
pub const WEBHOOK_URL_ENV: &str = "FLOWDESK_WEBHOOK_URL";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowdeskConfig {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl FlowdeskConfig {
    /// Load config from the default path (~/.flowdesk/config.toml).
    /// Falls back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowdeskError::Configuration(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FlowdeskError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            FlowdeskError::Configuration(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the FlowDesk home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flowdesk")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(WEBHOOK_URL_ENV).filter(|u| !u.trim().is_empty()) {
            tracing::debug!("🔧 webhook.url overridden by {WEBHOOK_URL_ENV}");
            self.webhook.url = url.trim().to_string();
        }
    }

    /// Check values that would make the pipeline unusable.
    pub fn validate(&self) -> Result<()> {
        if self.automation.lead_poll_secs == 0 {
            return Err(FlowdeskError::Configuration(
                "automation.lead_poll_secs must be greater than 0".into(),
            ));
        }
        if self.automation.shipment_poll_secs == 0 {
            return Err(FlowdeskError::Configuration(
                "automation.shipment_poll_secs must be greater than 0".into(),
            ));
        }
        if self.webhook.timeout_secs == 0 {
            return Err(FlowdeskError::Configuration(
                "webhook.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.webhook.max_attempts == 0 {
            return Err(FlowdeskError::Configuration(
                "webhook.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Outbound webhook sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Sink URL. One URL for every event kind.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total POST attempts per dispatch. 1 = no retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 { 10 }
fn default_max_attempts() -> u32 { 1 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms() -> u64 { 8_000 }

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Polling configuration for the automation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_lead_poll_secs")]
    pub lead_poll_secs: u64,
    #[serde(default = "default_shipment_poll_secs")]
    pub shipment_poll_secs: u64,
}

fn bool_true() -> bool { true }
fn default_lead_poll_secs() -> u64 { 300 }
fn default_shipment_poll_secs() -> u64 { 600 }

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_poll_secs: default_lead_poll_secs(),
            shipment_poll_secs: default_shipment_poll_secs(),
        }
    }
}

/// Snapshot size limits for the built-in sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_lead_snapshot_limit")]
    pub lead_snapshot_limit: usize,
    #[serde(default = "default_shipment_snapshot_limit")]
    pub shipment_snapshot_limit: usize,
}

fn default_lead_snapshot_limit() -> usize { 10 }
fn default_shipment_snapshot_limit() -> usize { 20 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            lead_snapshot_limit: default_lead_snapshot_limit(),
            shipment_snapshot_limit: default_shipment_snapshot_limit(),
        }
    }
}
