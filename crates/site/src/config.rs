//! Site configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the root domain.
pub const ROOT_DOMAIN_ENV: &str = "LITEMARK_ROOT_DOMAIN";

/// Dashboard host used when none is configured.
pub const DEFAULT_DASHBOARD_HOST: &str = "app.localhost";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be read.
    #[error("invalid site configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Hosts the router needs to tell the dashboard apart from tenant sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Apex domain; tenants live on its subdomains. May carry a port.
    #[serde(default)]
    pub root_domain: Option<String>,
    /// Host serving the dashboard.
    #[serde(default = "default_dashboard_host")]
    pub dashboard_host: String,
}

fn default_dashboard_host() -> String {
    DEFAULT_DASHBOARD_HOST.to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_domain: None,
            dashboard_host: default_dashboard_host(),
        }
    }
}

impl SiteConfig {
    /// Reads configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the root domain from [`ROOT_DOMAIN_ENV`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SiteConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            root_domain: lookup(ROOT_DOMAIN_ENV).filter(|value| !value.trim().is_empty()),
            ..Self::default()
        }
    }

    /// The root domain without its port.
    pub fn root_host(&self) -> Option<&str> {
        self.root_domain.as_deref().map(strip_port)
    }
}

pub(crate) fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}
