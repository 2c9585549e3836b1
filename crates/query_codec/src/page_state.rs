use std::collections::BTreeMap;

use serde::Serialize;
use shared::domain::{Scope, SortDirection, SortSpec};
use tracing::warn;

use crate::{
    config::CodecConfig,
    params::{encode_component, join_query, SearchParams},
    SEPARATOR,
};

/// How a declared page-state field is read from the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Positive integer, first value wins.
    Number,
    Text,
    Flag,
    /// Every value of the repeated key, kept unparsed.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(key: &'static str, kind: FieldKind) -> Self {
        Self { key, kind }
    }
}

pub const COMMON_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("page", FieldKind::Number),
    FieldSpec::new("perPage", FieldKind::Number),
    FieldSpec::new("id", FieldKind::Text),
    FieldSpec::new("issues", FieldKind::List),
    FieldSpec::new("open", FieldKind::Flag),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u32),
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl FieldValue {
    fn parse(kind: FieldKind, values: &[&str]) -> Result<Self, String> {
        let first = values.first().copied().unwrap_or_default();
        match kind {
            FieldKind::Number => match first.trim().parse::<u32>() {
                Ok(0) => Err("expected a positive number".into()),
                Ok(number) => Ok(Self::Number(number)),
                Err(err) => Err(err.to_string()),
            },
            FieldKind::Text => Ok(Self::Text(first.to_string())),
            // Unlike a plain truthiness check, "false" and "0" read as off.
            FieldKind::Flag => Ok(Self::Flag(!matches!(first, "" | "false" | "0"))),
            FieldKind::List => Ok(Self::List(values.iter().map(|v| v.to_string()).collect())),
        }
    }

    fn to_pairs(&self, key: &str) -> Vec<String> {
        match self {
            Self::Number(0) | Self::Flag(false) => Vec::new(),
            Self::Number(number) => vec![format!("{key}={number}")],
            Self::Text(text) if text.is_empty() => Vec::new(),
            Self::Text(text) => vec![format!("{key}={}", encode_component(text))],
            Self::Flag(true) => vec![format!("{key}=true")],
            Self::List(items) => items
                .iter()
                .map(|item| format!("{key}={}", encode_component(item)))
                .collect(),
        }
    }
}

/// Pagination, selection and dialog state shared by every list page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Caller-declared fields beyond the common ones.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, FieldValue>,
}

impl PageState {
    fn assign(&mut self, key: &str, value: FieldValue) {
        match (key, value) {
            ("page", FieldValue::Number(number)) => self.page = Some(number),
            ("perPage", FieldValue::Number(number)) => self.per_page = Some(number),
            ("id", FieldValue::Text(text)) => self.selected_id = Some(text),
            ("issues", FieldValue::List(items)) => self.selected_issues = items,
            ("open", FieldValue::Flag(flag)) => self.open = Some(flag),
            (key, value) => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }
}

/// Page state decoded from a query plus whatever parameters it did not consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonQuery {
    pub page_state: PageState,
    pub params: SearchParams,
}

pub fn parse_common(params: &SearchParams, extra_fields: &[FieldSpec]) -> CommonQuery {
    let mut remaining = params.clone();
    let mut page_state = PageState::default();

    for field in COMMON_FIELDS.iter().chain(extra_fields) {
        let values = params.get_all(field.key);
        remaining.delete(field.key);
        if values.is_empty() {
            continue;
        }
        match FieldValue::parse(field.kind, &values) {
            Ok(value) => page_state.assign(field.key, value),
            Err(reason) => warn!(
                param = field.key,
                value = values[0],
                %reason,
                "encountered faulty url param, continuing"
            ),
        }
    }

    page_state.sort = parse_sort(params);
    remaining.delete("sort");

    CommonQuery {
        page_state,
        params: remaining,
    }
}

/// Folds every `sort` value into one spec; parts are read right to left as
/// direction, key and scope.
pub fn parse_sort(params: &SearchParams) -> Option<SortSpec> {
    let values = params.get_all("sort");
    if values.is_empty() {
        return None;
    }
    let mut sort = SortSpec::default();
    for value in values {
        let parts: Vec<&str> = value.split(SEPARATOR).collect();
        let mut parts = parts.into_iter().rev();
        if let Some(direction) = parts.next().filter(|part| !part.is_empty()) {
            match direction.parse::<SortDirection>() {
                Ok(direction) => sort.direction = Some(direction),
                Err(err) => warn!(%err, "ignoring sort direction"),
            }
        }
        if let Some(key) = parts.next().filter(|part| !part.is_empty()) {
            sort.key = Some(key.to_string());
        }
        if let Some(scope) = parts.next().filter(|part| !part.is_empty()) {
            match scope.parse::<Scope>() {
                Ok(scope) => sort.scope = Some(scope),
                Err(err) => warn!(%err, "ignoring sort scope"),
            }
        }
    }
    Some(sort)
}

pub fn format_sorting(sort: Option<&SortSpec>, default: Option<&SortSpec>) -> String {
    let Some(sort) = sort else {
        return String::new();
    };
    if Some(sort) == default {
        return String::new();
    }
    let parts: Vec<&str> = [
        sort.scope.as_ref().map(Scope::as_str),
        sort.key.as_deref(),
        sort.direction.as_ref().map(SortDirection::as_str),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect();
    if parts.is_empty() {
        return String::new();
    }
    format!("sort={}", parts.join(SEPARATOR))
}

pub fn format_page_state(state: &PageState, config: &CodecConfig) -> String {
    let defaults = config.page_defaults;
    let mut pairs = vec![format_sorting(state.sort.as_ref(), config.sort_default.as_ref())];

    let page = state.page.filter(|page| *page != defaults.page);
    let per_page = state.per_page.filter(|per_page| *per_page != defaults.per_page);
    let fields = [
        ("page", page.map(FieldValue::Number)),
        ("perPage", per_page.map(FieldValue::Number)),
        ("id", state.selected_id.clone().map(FieldValue::Text)),
        ("issues", Some(FieldValue::List(state.selected_issues.clone()))),
        (
            "open",
            state
                .selected_id
                .as_ref()
                .filter(|id| !id.is_empty())
                .map(|_| FieldValue::Flag(true)),
        ),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            pairs.extend(value.to_pairs(key));
        }
    }
    for (key, value) in &state.extra {
        pairs.extend(value.to_pairs(key));
    }
    join_query(pairs)
}

#[cfg(test)]
#[path = "tests/page_state_tests.rs"]
mod tests;
