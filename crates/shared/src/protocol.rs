use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Operator, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Ok,
    Warning,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSubject {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Monitoring alert raised for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAlert {
    pub id: String,
    pub name: String,
    /// Untrimmed alert name, filled in client side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub level: AlertLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<AlertSubject>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueType {
    Offline,
    FailedLastUpdate,
    Monitoring,
    AuthRequests,
}

impl IssueType {
    pub const ALL: [IssueType; 4] = [
        IssueType::Offline,
        IssueType::FailedLastUpdate,
        IssueType::Monitoring,
        IssueType::AuthRequests,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::FailedLastUpdate => "failedLastUpdate",
            Self::Monitoring => "monitoring",
            Self::AuthRequests => "authRequests",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|issue| issue.key() == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub filtered: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    #[default]
    Email,
}

impl AlertChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertChannelStatus {
    pub enabled: bool,
}

/// One filter term of a device search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub scope: Scope,
    pub attribute: String,
    #[serde(rename = "type")]
    pub operator: Operator,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAttribute {
    pub scope: Scope,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSearchRequest {
    pub page: u32,
    pub per_page: u32,
    pub filters: Vec<SearchTerm>,
    pub attributes: Vec<SearchAttribute>,
}
