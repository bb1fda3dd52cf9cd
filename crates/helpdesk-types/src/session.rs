use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role group of the signed-in identity.
/// Wire names are the backend's group names (`users`, `technicians`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Group {
    #[serde(rename = "users")]
    User,
    #[serde(rename = "technicians")]
    Technician,
    #[default]
    #[serde(rename = "none")]
    None,
}

impl From<String> for Group {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "users" | "user" => Group::User,
            "technicians" | "technician" => Group::Technician,
            _ => Group::None,
        }
    }
}

impl Group {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Group::User => "users",
            Group::Technician => "technicians",
            Group::None => "none",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Group::User => "User",
            Group::Technician => "Technician",
            Group::None => "None",
        }
    }
}

/// The signed-in person, as reported by `GET /api/users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub group: Group,
}

impl Identity {
    pub fn is_technician(&self) -> bool {
        self.group == Group::Technician
    }
}

/// Bearer token issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Instant at which a silent refresh should fire.
    pub fn refresh_at(&self, lead: Duration) -> DateTime<Utc> {
        self.expires_at - lead
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identity and credential, always held together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub credential: Credential,
}
