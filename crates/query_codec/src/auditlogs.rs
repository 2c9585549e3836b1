use serde::Serialize;
use shared::domain::{AuditLogType, DateRange};

use crate::{
    dates::{format_dates, parse_date_params, DateBoundaries},
    params::SearchParams,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogsState {
    /// Id of the object the entries refer to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub log_type: Option<&'static AuditLogType>,
    #[serde(flatten)]
    pub date_range: DateRange,
}

impl AuditLogsState {
    pub fn new(dates: &DateBoundaries) -> Self {
        Self {
            detail: None,
            user_id: None,
            log_type: None,
            date_range: dates.default_range(),
        }
    }
}

pub fn parse_auditlogs_query(params: &SearchParams, dates: &DateBoundaries) -> AuditLogsState {
    AuditLogsState {
        detail: params.get_non_empty("objectId").map(str::to_string),
        user_id: params.get_non_empty("userId").map(str::to_string),
        log_type: params.get("objectType").and_then(AuditLogType::find),
        date_range: parse_date_params(params, dates),
    }
}

pub fn format_auditlogs(state: &AuditLogsState, dates: &DateBoundaries) -> String {
    let mut params = SearchParams::new();
    for (key, value) in [("objectId", &state.detail), ("userId", &state.user_id)] {
        if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
            params.set(key, value);
        }
    }
    if let Some(log_type) = state.log_type {
        params.set("objectType", log_type.value);
    }
    format_dates(&mut params, &state.date_range, dates);
    params.to_query_string()
}
