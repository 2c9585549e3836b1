use super::*;
use chrono::NaiveDate;

fn dates() -> DateBoundaries {
    DateBoundaries::for_day(NaiveDate::from_ymd_opt(2026, 10, 16).expect("date"))
}

fn context(pathname: &str) -> DeploymentsContext<'_> {
    DeploymentsContext {
        pathname,
        previous_tab: None,
        dates: dates(),
    }
}

#[test]
fn active_path_without_query_has_no_overrides() {
    let state = parse_deployments_query(&SearchParams::new(), &context("/deployments/active"));
    assert_eq!(state, DeploymentsState::new(DeploymentsTab::Active));
    assert_eq!(format_deployments(&state, &CodecConfig::default(), &dates()), "");
}

fn tab(ctx: &DeploymentsContext<'_>) -> DeploymentsTab {
    parse_deployments_query(&SearchParams::new(), ctx).general.state
}

#[test]
fn tab_falls_back_to_previous_then_active() {
    let mut ctx = context("/deployments");
    assert_eq!(tab(&ctx), DeploymentsTab::Active);
    ctx.previous_tab = Some(DeploymentsTab::Scheduled);
    assert_eq!(tab(&ctx), DeploymentsTab::Scheduled);
    ctx.pathname = "/deployments/finished";
    assert_eq!(tab(&ctx), DeploymentsTab::Finished);
    ctx.pathname = "/deployments/unknown";
    assert_eq!(tab(&ctx), DeploymentsTab::Scheduled);
}

#[test]
fn active_sub_states_decode_compact_pagination() {
    let params = SearchParams::parse("inprogress=2:30&pending=3&sort=x");
    let state = parse_deployments_query(&params, &context("/deployments/active"));
    assert_eq!(
        state.in_progress,
        Some(PageWindow {
            page: Some(2),
            per_page: Some(30)
        })
    );
    assert_eq!(
        state.pending,
        Some(PageWindow {
            page: Some(3),
            per_page: None
        })
    );
}

#[test]
fn malformed_active_pagination_is_dropped() {
    let params = SearchParams::parse("inprogress=two:30");
    let state = parse_deployments_query(&params, &context("/deployments/active"));
    assert_eq!(
        state.in_progress,
        Some(PageWindow {
            page: None,
            per_page: Some(30)
        })
    );
}

#[test]
fn active_encoding_omits_defaults_and_backfills_page() {
    let mut state = DeploymentsState::new(DeploymentsTab::Active);
    state.in_progress = Some(PageWindow {
        page: None,
        per_page: Some(30),
    });
    state.pending = Some(PageWindow {
        page: Some(4),
        per_page: Some(10),
    });
    assert_eq!(
        format_deployments(&state, &CodecConfig::default(), &dates()),
        "inprogress=1:30&pending=4"
    );
}

#[test]
fn open_flag_selects_creation_or_report_dialog() {
    let state = parse_deployments_query(
        &SearchParams::parse("open=true&release=rel-1&device=d1"),
        &context("/deployments/active"),
    );
    assert!(state.general.show_creation_dialog);
    assert!(!state.general.show_report_dialog);
    assert_eq!(state.deployment_object.release.as_deref(), Some("rel-1"));
    assert_eq!(
        format_deployments(&state, &CodecConfig::default(), &dates()),
        "open=true&release=rel-1&device=d1"
    );

    let state = parse_deployments_query(
        &SearchParams::parse("open=true&id=dep-9"),
        &context("/deployments/finished"),
    );
    assert!(!state.general.show_creation_dialog);
    assert!(state.general.show_report_dialog);
    assert_eq!(state.general.report_id.as_deref(), Some("dep-9"));
}

#[test]
fn empty_id_opens_the_creation_dialog() {
    let state = parse_deployments_query(
        &SearchParams::parse("open=true&id="),
        &context("/deployments/active"),
    );
    assert!(state.general.show_creation_dialog);
    assert!(!state.general.show_report_dialog);
    assert_eq!(state.general.report_id, None);
    assert_eq!(format_deployments(&state, &CodecConfig::default(), &dates()), "open=true");
}

#[test]
fn finished_tab_round_trips_dates_search_and_type() {
    let params = SearchParams::parse(
        "page=2&startDate=2026-10-01&search=fleet+rollout&type=configuration&endDate=2026-10-10",
    );
    let state = parse_deployments_query(&params, &context("/deployments/finished"));
    let finished = state.finished.as_ref().expect("finished state");
    assert_eq!(finished.page_state.page, Some(2));
    assert_eq!(finished.search, "fleet rollout");
    assert_eq!(finished.deployment_type, Some(DeploymentType::Configuration));
    assert_eq!(finished.date_range.start_date.to_rfc3339(), "2026-10-01T00:00:00+00:00");

    assert_eq!(
        format_deployments(&state, &CodecConfig::default(), &dates()),
        "page=2&endDate=2026-10-10&startDate=2026-10-01&search=fleet+rollout&type=configuration"
    );
}

#[test]
fn finished_tab_defaults_dates_and_ignores_unknown_type() {
    let state = parse_deployments_query(
        &SearchParams::parse("type=firmware"),
        &context("/deployments/finished"),
    );
    let finished = state.finished.expect("finished state");
    assert_eq!(finished.date_range, dates().default_range());
    assert_eq!(finished.deployment_type, None);
    assert_eq!(finished.search, "");
}

#[test]
fn scheduled_tab_uses_list_page_state() {
    let state = parse_deployments_query(
        &SearchParams::parse("perPage=50"),
        &context("/deployments/scheduled"),
    );
    assert_eq!(state.scheduled.as_ref().and_then(|s| s.per_page), Some(50));
    assert_eq!(format_deployments(&state, &CodecConfig::default(), &dates()), "perPage=50");
    assert_eq!(generate_deployments_path(&state.general), "/deployments/scheduled");
}
