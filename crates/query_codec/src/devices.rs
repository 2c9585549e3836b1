use serde::Serialize;
use shared::domain::{DeviceListState, Filter, Operator, Scope};
use tracing::{debug, warn};

use crate::{
    config::{CodecConfig, FilteringAttributes},
    page_state::{format_page_state, PageState},
    params::{encode_component, join_query, SearchParams},
    SEPARATOR,
};

/// Filters decoded from a device list query, with the group selection pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// Filters bucketed per query scope, kept in the fixed scope order.
struct ScopedFilters {
    buckets: Vec<(Scope, Vec<Filter>)>,
}

impl ScopedFilters {
    fn new() -> Self {
        Self {
            buckets: Scope::QUERY_SCOPES
                .iter()
                .map(|scope| (*scope, Vec::new()))
                .collect(),
        }
    }

    fn bucket_mut(&mut self, scope: Scope) -> &mut Vec<Filter> {
        let index = self
            .buckets
            .iter()
            .position(|(bucket_scope, _)| *bucket_scope == scope)
            .unwrap_or_else(|| {
                self.buckets.push((scope, Vec::new()));
                self.buckets.len() - 1
            });
        &mut self.buckets[index].1
    }

    fn push(&mut self, filter: Filter) {
        self.bucket_mut(filter.scope).push(filter);
    }

    /// Removes the first inventory `group $eq` filter and returns its value.
    fn take_group_selection(&mut self) -> Option<String> {
        let inventory = self.bucket_mut(Scope::Inventory);
        let index = inventory.iter().position(Filter::is_group_selection)?;
        Some(inventory.remove(index).value)
    }

    fn into_filters(self) -> Vec<Filter> {
        self.buckets
            .into_iter()
            .flat_map(|(_, filters)| filters)
            .collect()
    }
}

/// True when the query uses bare attribute names as keys and no scoped keys.
pub fn is_legacy_query(params: &SearchParams, attributes: &FilteringAttributes) -> bool {
    let refers_old_style_attributes = attributes
        .attribute_names()
        .any(|name| params.get_non_empty(name).is_some());
    let has_scoped_keys = Scope::QUERY_SCOPES
        .iter()
        .any(|scope| params.get_non_empty(scope.as_str()).is_some());
    refers_old_style_attributes && !has_scoped_keys
}

fn legacy_filter_parse(params: &SearchParams, attributes: &FilteringAttributes) -> ScopedFilters {
    let mut filters = ScopedFilters::new();
    for key in params.keys() {
        let scope = attributes.scope_of(key).unwrap_or(Scope::Inventory);
        for value in params.get_all(key) {
            filters.push(Filter::equals(scope, key, value));
        }
    }
    filters
}

fn parse_scoped_filter(scope: Scope, raw: &str) -> Option<Filter> {
    let mut items = raw.splitn(3, SEPARATOR);
    let key = items.next().filter(|key| !key.is_empty())?;
    let operator = match Operator::from_short_key(items.next().unwrap_or_default()) {
        Ok(operator) => operator,
        Err(err) => {
            warn!(%scope, filter = raw, %err, "dropping filter");
            return None;
        }
    };
    let value = items.next().unwrap_or_default();
    Some(Filter::new(scope, key, operator, value))
}

fn scoped_filter_parse(params: &SearchParams) -> ScopedFilters {
    let mut filters = ScopedFilters::new();
    for scope in Scope::QUERY_SCOPES {
        for raw in params.get_all(scope.as_str()) {
            match parse_scoped_filter(scope, raw) {
                Some(filter) => filters.push(filter),
                None => debug!(%scope, filter = raw, "skipped unparseable filter"),
            }
        }
    }
    filters
}

/// Decodes device filters and the selected group from `params`.
///
/// `params` should already be stripped of page-state fields (see
/// [`crate::page_state::parse_common`]); in legacy mode every remaining key is
/// read as an attribute name.
pub fn parse_device_query(
    params: &SearchParams,
    attributes: &FilteringAttributes,
) -> DeviceQuery {
    let mut scoped = if is_legacy_query(params, attributes) {
        legacy_filter_parse(params, attributes)
    } else {
        scoped_filter_parse(params)
    };
    let group_name = scoped.take_group_selection();
    DeviceQuery {
        filters: scoped.into_filters(),
        group_name,
    }
}

/// Keys containing the separator cannot be decoded again and are left out.
fn format_filters(filters: &[Filter]) -> Vec<String> {
    let mut grouped: Vec<(Scope, Vec<String>)> = Scope::QUERY_SCOPES
        .iter()
        .map(|scope| (*scope, Vec::new()))
        .collect();
    for filter in filters {
        if filter.key.contains(SEPARATOR) {
            warn!(scope = %filter.scope, key = %filter.key, "skipping filter with unencodable key");
            continue;
        }
        let entry = format!(
            "{}={}{SEPARATOR}{}{SEPARATOR}{}",
            filter.scope,
            encode_component(&filter.key),
            filter.operator.short_key(),
            encode_component(&filter.value),
        );
        if let Some((_, entries)) = grouped.iter_mut().find(|(scope, _)| *scope == filter.scope) {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }
    grouped.into_iter().flat_map(|(_, entries)| entries).collect()
}

/// Encodes device filters, injecting the selected group as an inventory filter.
pub fn format_device_search(
    filters: &[Filter],
    selected_group: Option<&str>,
    config: &CodecConfig,
) -> String {
    let mut active_filters = filters.to_vec();
    if let Some(selected_group) = selected_group.filter(|group| !group.is_empty()) {
        let is_ungrouped = selected_group == config.ungrouped.id;
        if is_ungrouped {
            active_filters.retain(|filter| {
                !(filter.key == "group"
                    && filter.scope == Scope::System
                    && filter.operator == Operator::Nin)
            });
        }
        let group_name = if is_ungrouped {
            config.ungrouped.name.as_str()
        } else {
            selected_group
        };
        active_filters.push(Filter::equals(Scope::Inventory, "group", group_name));
    }
    join_query(format_filters(&active_filters))
}

/// Full device list query: page state first, then filters.
pub fn format_device_location(
    page_state: &PageState,
    filters: &[Filter],
    selected_group: Option<&str>,
    config: &CodecConfig,
) -> String {
    join_query([
        format_page_state(page_state, config),
        format_device_search(filters, selected_group, config),
    ])
}

pub fn generate_device_path(state: DeviceListState) -> String {
    match state {
        DeviceListState::All => "/devices".to_string(),
        other => format!("/devices/{other}"),
    }
}

#[cfg(test)]
#[path = "tests/devices_tests.rs"]
mod tests;
