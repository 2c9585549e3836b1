use super::*;
use crate::config::UNGROUPED_GROUP_ID;
use shared::domain::{SortDirection, SortSpec};

fn attributes() -> FilteringAttributes {
    FilteringAttributes::new()
        .with_scope(Scope::Identity, ["mac", "id_attr"])
        .with_scope(Scope::Inventory, ["status", "device_type"])
        .with_scope(Scope::Tags, ["location"])
}

#[test]
fn scoped_query_decodes_in_fixed_scope_order() {
    let params = SearchParams::parse(concat!(
        "tags=location:eq:berlin&identity=mac:ne:00%3A11",
        "&inventory=device_type:in:pi4&monitor=alerts:eq:true",
    ));
    let query = parse_device_query(&params, &attributes());
    assert_eq!(
        query.filters,
        vec![
            Filter::new(Scope::Identity, "mac", Operator::Ne, "00:11"),
            Filter::new(Scope::Inventory, "device_type", Operator::In, "pi4"),
            Filter::new(Scope::Monitor, "alerts", Operator::Eq, "true"),
            Filter::new(Scope::Tags, "location", Operator::Eq, "berlin"),
        ]
    );
    assert_eq!(query.group_name, None);
}

#[test]
fn group_equality_filter_is_surfaced_as_group_name() {
    let params = SearchParams::parse("inventory=group:eq:prod&inventory=group:ne:test");
    let query = parse_device_query(&params, &attributes());
    assert_eq!(query.group_name.as_deref(), Some("prod"));
    assert_eq!(
        query.filters,
        vec![Filter::new(Scope::Inventory, "group", Operator::Ne, "test")]
    );
}

#[test]
fn legacy_query_uses_mapping_and_defaults_to_inventory() {
    let params = SearchParams::parse("status=accepted");
    let status_only = FilteringAttributes::new().with_scope(Scope::Inventory, ["status"]);
    let query = parse_device_query(&params, &status_only);
    assert_eq!(
        query.filters,
        vec![Filter::equals(Scope::Inventory, "status", "accepted")]
    );

    let params = SearchParams::parse("mac=aa&mac=bb&hostname=x");
    let query = parse_device_query(&params, &attributes());
    assert_eq!(
        query.filters,
        vec![
            Filter::equals(Scope::Identity, "mac", "aa"),
            Filter::equals(Scope::Identity, "mac", "bb"),
            Filter::equals(Scope::Inventory, "hostname", "x"),
        ]
    );
}

#[test]
fn scoped_keys_disable_legacy_detection() {
    let params = SearchParams::parse("status=accepted&identity=mac:eq:aa");
    assert!(!is_legacy_query(&params, &attributes()));
    let query = parse_device_query(&params, &attributes());
    assert_eq!(query.filters, vec![Filter::equals(Scope::Identity, "mac", "aa")]);
}

#[test]
fn legacy_group_filter_is_extracted() {
    let attributes = FilteringAttributes::new().with_scope(Scope::Inventory, ["group"]);
    let query = parse_device_query(&SearchParams::parse("group=prod"), &attributes);
    assert!(query.filters.is_empty());
    assert_eq!(query.group_name.as_deref(), Some("prod"));
}

#[test]
fn malformed_scoped_filters_are_dropped() {
    let params = SearchParams::parse("identity=mac:like:aa&identity=:eq:x&inventory=name:eq");
    let query = parse_device_query(&params, &attributes());
    assert_eq!(query.filters, vec![Filter::equals(Scope::Inventory, "name", "")]);
}

#[test]
fn values_may_contain_the_separator() {
    let filters = vec![Filter::equals(Scope::Identity, "mac", "00:11:22")];
    let encoded = format_device_search(&filters, None, &CodecConfig::default());
    assert_eq!(encoded, "identity=mac:eq:00%3A11%3A22");
    let query = parse_device_query(&SearchParams::parse(&encoded), &attributes());
    assert_eq!(query.filters, filters);
}

#[test]
fn keys_containing_the_separator_are_not_encoded() {
    let filters = vec![
        Filter::equals(Scope::Tags, "site:zone", "a"),
        Filter::equals(Scope::Tags, "site", "b"),
    ];
    let encoded = format_device_search(&filters, None, &CodecConfig::default());
    assert_eq!(encoded, "tags=site:eq:b");
    let query = parse_device_query(&SearchParams::parse(&encoded), &attributes());
    assert_eq!(query.filters, vec![Filter::equals(Scope::Tags, "site", "b")]);
}

#[test]
fn encoding_groups_by_scope_and_strips_operator_marker() {
    let filters = vec![
        Filter::new(Scope::Tags, "location", Operator::Eq, "a b"),
        Filter::new(Scope::Identity, "status", Operator::Nin, "rejected"),
        Filter::new(Scope::Tags, "location", Operator::Eq, "a b"),
    ];
    assert_eq!(
        format_device_search(&filters, None, &CodecConfig::default()),
        "identity=status:nin:rejected&tags=location:eq:a+b"
    );
}

#[test]
fn selected_group_is_not_duplicated() {
    let filters = vec![Filter::equals(Scope::Inventory, "group", "g1")];
    assert_eq!(
        format_device_search(&filters, Some("g1"), &CodecConfig::default()),
        "inventory=group:eq:g1"
    );
}

#[test]
fn ungrouped_selection_uses_display_name_and_drops_system_exclusion() {
    let filters = vec![
        Filter::new(Scope::System, "group", Operator::Nin, "prod"),
        Filter::equals(Scope::Identity, "status", "accepted"),
    ];
    assert_eq!(
        format_device_search(&filters, Some(UNGROUPED_GROUP_ID), &CodecConfig::default()),
        "identity=status:eq:accepted&inventory=group:eq:Unassigned"
    );
}

#[test]
fn device_location_joins_page_state_and_filters() {
    let page_state = PageState {
        page: Some(2),
        sort: Some(SortSpec::new(Scope::Inventory, "name", SortDirection::Asc)),
        ..PageState::default()
    };
    let filters = vec![Filter::equals(Scope::Identity, "status", "accepted")];
    assert_eq!(
        format_device_location(&page_state, &filters, Some("prod"), &CodecConfig::default()),
        "sort=inventory:name:asc&page=2&identity=status:eq:accepted&inventory=group:eq:prod"
    );
    assert_eq!(
        format_device_location(&PageState::default(), &[], None, &CodecConfig::default()),
        ""
    );
}

#[test]
fn device_paths_skip_the_all_state() {
    assert_eq!(generate_device_path(DeviceListState::All), "/devices");
    assert_eq!(generate_device_path(DeviceListState::Pending), "/devices/pending");
}
