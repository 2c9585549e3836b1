use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use shared::{
    domain::{Filter, Operator, Scope, UNGROUPED_GROUP_ID},
    protocol::{IssueType, SearchTerm},
};

/// Device attribute condition selecting devices affected by an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFilterRule {
    pub scope: Scope,
    pub attribute: &'static str,
    pub operator: Operator,
    pub value: Value,
}

impl IssueFilterRule {
    fn matches(&self, filter: &Filter) -> bool {
        self.scope == filter.scope && self.attribute == filter.key
    }

    fn to_term(&self) -> SearchTerm {
        SearchTerm {
            scope: self.scope,
            attribute: self.attribute.to_string(),
            operator: self.operator,
            value: self.value.clone(),
        }
    }
}

/// `offline_cutoff` is the last check-in time before a device counts as offline.
pub fn issue_filter_rule(issue: IssueType, offline_cutoff: DateTime<Utc>) -> IssueFilterRule {
    match issue {
        IssueType::Offline => IssueFilterRule {
            scope: Scope::System,
            attribute: "check_in_time",
            operator: Operator::Lt,
            value: Value::String(offline_cutoff.to_rfc3339_opts(SecondsFormat::Millis, true)),
        },
        IssueType::FailedLastUpdate => IssueFilterRule {
            scope: Scope::Monitor,
            attribute: "failed_last_update",
            operator: Operator::Eq,
            value: Value::Bool(true),
        },
        IssueType::Monitoring => IssueFilterRule {
            scope: Scope::Monitor,
            attribute: "alerts",
            operator: Operator::Eq,
            value: Value::Bool(true),
        },
        IssueType::AuthRequests => IssueFilterRule {
            scope: Scope::Monitor,
            attribute: "auth_requests",
            operator: Operator::Gt,
            value: Value::from(1),
        },
    }
}

fn filter_to_term(filter: &Filter) -> SearchTerm {
    let value = match filter.operator {
        Operator::Exists | Operator::NotExists => Value::Bool(true),
        _ => Value::String(filter.value.clone()),
    };
    SearchTerm {
        scope: filter.scope,
        attribute: filter.key.clone(),
        operator: filter.operator,
        value,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceListSelection<'a> {
    pub filters: &'a [Filter],
    pub group: Option<&'a str>,
    pub selected_issues: &'a [IssueType],
    pub status: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSearchFilters {
    /// User-visible filters, excluding those that only restate an issue rule.
    pub applicable_filters: Vec<Filter>,
    pub filter_terms: Vec<SearchTerm>,
}

/// Translates the device list selection into search terms for the backend.
pub fn convert_device_list_state_to_filters(
    selection: &DeviceListSelection<'_>,
    offline_cutoff: DateTime<Utc>,
) -> DeviceSearchFilters {
    let mut applicable = selection.filters.to_vec();
    match selection.group {
        Some(UNGROUPED_GROUP_ID) => {
            applicable.push(Filter::new(Scope::System, "group", Operator::NotExists, ""));
        }
        Some(group) if !group.is_empty() => {
            applicable.push(Filter::equals(Scope::System, "group", group));
        }
        _ => {}
    }

    let issue_rules: Vec<IssueFilterRule> = IssueType::ALL
        .iter()
        .map(|issue| issue_filter_rule(*issue, offline_cutoff))
        .collect();
    let applicable_filters = applicable
        .iter()
        .filter(|filter| !issue_rules.iter().any(|rule| rule.matches(filter)))
        .cloned()
        .collect();

    let mut filter_terms: Vec<SearchTerm> = applicable.iter().map(filter_to_term).collect();
    filter_terms.extend(
        selection
            .selected_issues
            .iter()
            .map(|issue| issue_filter_rule(*issue, offline_cutoff).to_term()),
    );
    if let Some(status) = selection.status.filter(|status| !status.is_empty()) {
        filter_terms.push(filter_to_term(&Filter::equals(Scope::Identity, "status", status)));
    }

    DeviceSearchFilters {
        applicable_filters,
        filter_terms,
    }
}
