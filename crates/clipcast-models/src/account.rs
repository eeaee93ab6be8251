//! Social platform and account models.
//!
//! Social accounts are created and refreshed by the surrounding product; the
//! publishing orchestrator consumes them read-only to validate targets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A publishing target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
    Twitter,
    Linkedin,
    Facebook,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection state of a social account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Expired,
}

/// A connected social account for a company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SocialAccount {
    pub id: String,
    pub company_id: String,
    pub platform: Platform,
    pub status: ConnectionStatus,
    /// Platform-side handle or channel name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl SocialAccount {
    pub fn new(company_id: impl Into<String>, platform: Platform, status: ConnectionStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            platform,
            status,
            handle: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
