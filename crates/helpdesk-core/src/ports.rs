//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `helpdesk-core` (pure Rust).
//! Implementations live in `helpdesk-platform` (browser adapters).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use helpdesk_types::{session::Credential, Result};

// ─── HTTP Port ───────────────────────────────────────────────

/// JSON transport to the helpdesk backend.
///
/// `path` is relative to the configured backend origin. An empty response
/// body decodes to `Value::Null`.
#[async_trait(?Send)]
pub trait HttpPort {
    async fn get(&self, path: &str, bearer: &str) -> Result<Value>;

    async fn post(&self, path: &str, bearer: &str, body: &Value) -> Result<Value>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Identity Port ───────────────────────────────────────────

/// The external OAuth/OIDC token issuer.
#[async_trait(?Send)]
pub trait IdentityPort {
    /// Interactive sign-in (popup or redirect)
    async fn sign_in_interactive(&self) -> Result<Credential>;

    /// Re-acquire a credential without user interaction.
    /// Fails with `HelpdeskError::InteractionRequired` when the provider
    /// needs the user back.
    async fn acquire_token_silent(&self) -> Result<Credential>;

    /// Drop the provider's cached account
    async fn sign_out(&self) -> Result<()>;
}

// ─── Timer Port ──────────────────────────────────────────────

/// Wall clock and non-blocking sleep.
#[async_trait(?Send)]
pub trait TimerPort {
    async fn sleep_ms(&self, ms: u64);

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
