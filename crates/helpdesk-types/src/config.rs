use serde::{Deserialize, Serialize};

use crate::{HelpdeskError, Result};

/// Storage key of the persisted client configuration
pub const CONFIG_STORAGE_KEY: &str = "helpdesk:config";
/// Storage key of the persisted chat transcript
pub const TRANSCRIPT_STORAGE_KEY: &str = "helpdesk:chat";

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin; empty means same origin as the page
    pub backend_url: String,
    pub identity: IdentityConfig,
    pub page_size: u32,
    pub ticket_poll_interval_ms: u32,
    /// Seconds before credential expiry at which a silent refresh fires
    pub refresh_lead_secs: i64,
    pub query: QueryConfig,
    pub storage: StorageConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            identity: IdentityConfig::default(),
            page_size: 10,
            ticket_poll_interval_ms: 5000,
            refresh_lead_secs: 60,
            query: QueryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: ClientConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(HelpdeskError::Config("page_size must be positive".to_string()));
        }
        if self.ticket_poll_interval_ms == 0 {
            return Err(HelpdeskError::Config(
                "ticket_poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.refresh_lead_secs < 0 {
            return Err(HelpdeskError::Config(
                "refresh_lead_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute URL for an API path, joined onto `backend_url`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), path)
    }
}

/// Identity-provider registration (OIDC public client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub client_id: String,
    pub authority: String,
    pub scopes: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            authority: String::new(),
            scopes: vec!["openid".to_string()],
        }
    }
}

/// Query-layer policy: retries and staleness windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Extra attempts after the first failure (queries only)
    pub retries: u32,
    pub retry_base_delay_ms: u32,
    pub list_stale_secs: i64,
    pub detail_stale_secs: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            retry_base_delay_ms: 1000,
            list_stale_secs: 120,
            detail_stale_secs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    #[default]
    Auto,
    LocalStorage,
    Memory,
}
