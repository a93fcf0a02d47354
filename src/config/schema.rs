//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the tracker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hosted backend connection settings.
    pub backend: BackendConfig,

    /// Router and layout settings.
    pub router: RouterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which backend implementation the handle builds on first use.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hosted backend over HTTP.
    #[default]
    Rest,
    /// In-process store seeded with demo data.
    Memory,
}

/// Hosted backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,

    /// Project base URL (e.g., "https://project.example.co").
    pub url: String,

    /// Public anonymous API key sent with every request.
    pub anon_key: String,

    /// Storage bucket holding strategy attachments.
    pub storage_bucket: String,

    /// Lifetime of signed attachment URLs in seconds.
    pub signed_url_ttl_secs: u64,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Rest,
            url: String::new(),
            anon_key: String::new(),
            storage_bucket: "strategy-attachments".to_string(),
            signed_url_ttl_secs: 3600,
            timeout_secs: 10,
        }
    }
}

/// Router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Id of the element the layout is mounted into.
    pub mount_id: String,

    /// Redirect hops followed by the headless driver before giving up.
    pub max_redirects: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mount_id: "app".to_string(),
            max_redirects: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
