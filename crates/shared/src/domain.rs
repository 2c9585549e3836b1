use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseDomainError;

macro_rules! str_enum {
    ($name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseDomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseDomainError::new($what, other)),
                }
            }
        }
    };
}

/// Namespace a filter or sort attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Identity,
    Inventory,
    Monitor,
    Tags,
    System,
}

str_enum!(Scope, "scope" {
    Identity => "identity",
    Inventory => "inventory",
    Monitor => "monitor",
    Tags => "tags",
    System => "system",
});

impl Scope {
    /// Scopes used as query parameter keys, in encoding order.
    pub const QUERY_SCOPES: [Scope; 5] = [
        Scope::Identity,
        Scope::Inventory,
        Scope::Monitor,
        Scope::Tags,
        Scope::System,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$nin")]
    Nin,
    #[serde(rename = "$exists")]
    Exists,
    #[serde(rename = "$nexists")]
    NotExists,
    #[serde(rename = "$regex")]
    Regex,
}

str_enum!(Operator, "operator" {
    Eq => "$eq",
    Ne => "$ne",
    Gt => "$gt",
    Gte => "$gte",
    Lt => "$lt",
    Lte => "$lte",
    In => "$in",
    Nin => "$nin",
    Exists => "$exists",
    NotExists => "$nexists",
    Regex => "$regex",
});

impl Operator {
    /// Operator key without the leading `$` marker, as written into URLs.
    pub fn short_key(&self) -> &'static str {
        &self.as_str()[1..]
    }

    pub fn from_short_key(value: &str) -> Result<Self, ParseDomainError> {
        format!("${value}").parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub scope: Scope,
    pub key: String,
    pub operator: Operator,
    pub value: String,
}

impl Filter {
    pub fn new(
        scope: Scope,
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(scope: Scope, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(scope, key, Operator::Eq, value)
    }

    pub fn is_group_selection(&self) -> bool {
        self.key == "group" && self.operator == Operator::Eq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

str_enum!(SortDirection, "sort direction" {
    Asc => "asc",
    Desc => "desc",
});

/// Sort order of a list page. Every part is optional since URLs may carry
/// partial specs such as `name:desc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
}

impl SortSpec {
    pub fn new(scope: Scope, key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            scope: Some(scope),
            key: Some(key.into()),
            direction: Some(direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Group id selecting devices that belong to no group.
pub const UNGROUPED_GROUP_ID: &str = "*|=ungrouped=|*";
pub const UNGROUPED_GROUP_NAME: &str = "Unassigned";

/// Device authorization states that have their own list route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceListState {
    #[default]
    All,
    Accepted,
    Pending,
    Preauthorized,
    Rejected,
}

str_enum!(DeviceListState, "device state" {
    All => "all",
    Accepted => "accepted",
    Pending => "pending",
    Preauthorized => "preauthorized",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentsTab {
    Active,
    Scheduled,
    Finished,
}

str_enum!(DeploymentsTab, "deployments tab" {
    Active => "active",
    Scheduled => "scheduled",
    Finished => "finished",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentType {
    Software,
    Configuration,
}

str_enum!(DeploymentType, "deployment type" {
    Software => "software",
    Configuration => "configuration",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogType {
    pub title: &'static str,
    pub query_parameter: &'static str,
    pub value: &'static str,
}

pub static AUDIT_LOG_TYPES: [AuditLogType; 3] = [
    AuditLogType {
        title: "Deployment",
        query_parameter: "object_deployment_name",
        value: "deployment",
    },
    AuditLogType {
        title: "User",
        query_parameter: "object_id",
        value: "user",
    },
    AuditLogType {
        title: "Device",
        query_parameter: "object_id",
        value: "device",
    },
];

impl AuditLogType {
    pub fn find(value: &str) -> Option<&'static AuditLogType> {
        AUDIT_LOG_TYPES.iter().find(|entry| entry.value == value)
    }
}
