use serde::Serialize;
use shared::domain::{DateRange, DeploymentType, DeploymentsTab, Pagination};
use tracing::warn;

use crate::{
    config::CodecConfig,
    dates::{format_dates, parse_date_params, DateBoundaries},
    page_state::{format_page_state, parse_common, PageState},
    params::{join_query, SearchParams},
    SEPARATOR,
};

const DEPLOYMENTS_PATH: &str = "deployments/";
const IN_PROGRESS_KEY: &str = "inprogress";
const PENDING_KEY: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentsGeneral {
    pub state: DeploymentsTab,
    pub show_creation_dialog: bool,
    pub show_report_dialog: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

impl DeploymentsGeneral {
    pub fn new(state: DeploymentsTab) -> Self {
        Self {
            state,
            show_creation_dialog: false,
            show_report_dialog: false,
            report_id: None,
        }
    }
}

/// Prefill of the deployment creation dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Pagination of one active sub-list; absent parts fall back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedDeployments {
    #[serde(flatten)]
    pub page_state: PageState,
    #[serde(flatten)]
    pub date_range: DateRange,
    pub search: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<DeploymentType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentsState {
    pub general: DeploymentsGeneral,
    pub deployment_object: DeploymentObject,
    #[serde(rename = "inprogress", skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<PageWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PageWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<PageState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<FinishedDeployments>,
}

impl DeploymentsState {
    pub fn new(tab: DeploymentsTab) -> Self {
        Self {
            general: DeploymentsGeneral::new(tab),
            deployment_object: DeploymentObject::default(),
            in_progress: None,
            pending: None,
            scheduled: None,
            finished: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeploymentsContext<'a> {
    pub pathname: &'a str,
    /// Tab recorded in the current page state, used when the path names none.
    pub previous_tab: Option<DeploymentsTab>,
    pub dates: DateBoundaries,
}

pub fn parse_deployments_path(pathname: &str) -> Option<DeploymentsTab> {
    pathname
        .split(DEPLOYMENTS_PATH)
        .nth(1)
        .and_then(|segment| segment.parse().ok())
}

fn parse_window(key: &str, raw: &str) -> PageWindow {
    let mut window = PageWindow::default();
    let mut items = raw.split(SEPARATOR);
    for slot in [&mut window.page, &mut window.per_page] {
        let Some(item) = items.next().filter(|item| !item.is_empty()) else {
            continue;
        };
        match item.parse::<u32>() {
            Ok(value) if value > 0 => *slot = Some(value),
            _ => warn!(param = key, value = item, "encountered faulty url param, continuing"),
        }
    }
    window
}

pub fn parse_deployments_query(
    params: &SearchParams,
    context: &DeploymentsContext<'_>,
) -> DeploymentsState {
    let common = parse_common(params, &[]);
    let mut page_state = common.page_state;
    // `id=` counts as no id, so `open=true&id=` still means creation.
    let id = page_state.selected_id.take().filter(|id| !id.is_empty());
    let open = page_state.open.take().unwrap_or_default();

    let tab = parse_deployments_path(context.pathname)
        .or(context.previous_tab)
        .unwrap_or(DeploymentsTab::Active);

    let mut state = DeploymentsState::new(tab);
    state.general.show_creation_dialog = open && id.is_none();
    state.general.show_report_dialog = open && id.is_some();
    state.general.report_id = id.filter(|_| open);
    state.deployment_object = DeploymentObject {
        release: params.get("release").map(str::to_string),
        device: params.get("device").map(str::to_string),
    };

    match tab {
        DeploymentsTab::Finished => {
            let deployment_type = params.get_non_empty("type").and_then(|raw| match raw.parse() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    warn!(%err, "ignoring deployment type");
                    None
                }
            });
            state.finished = Some(FinishedDeployments {
                page_state,
                date_range: parse_date_params(params, &context.dates),
                search: params.get("search").unwrap_or_default().to_string(),
                deployment_type,
            });
        }
        DeploymentsTab::Scheduled => state.scheduled = Some(page_state),
        DeploymentsTab::Active => {
            state.in_progress = params
                .get(IN_PROGRESS_KEY)
                .map(|raw| parse_window(IN_PROGRESS_KEY, raw));
            state.pending = params.get(PENDING_KEY).map(|raw| parse_window(PENDING_KEY, raw));
        }
    }
    state
}

/// `page:perPage`, dropping trailing parts equal to their default and
/// back-filling skipped leading parts.
fn format_window(window: &PageWindow, defaults: Pagination) -> Option<String> {
    let mut items: Vec<u32> = Vec::new();
    for (value, default) in [(window.per_page, defaults.per_page), (window.page, defaults.page)] {
        if value.is_some_and(|value| value != default) || !items.is_empty() {
            items.insert(0, value.unwrap_or(default));
        }
    }
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(SEPARATOR),
    )
}

fn format_active_deployments(state: &DeploymentsState, config: &CodecConfig) -> String {
    let defaults = &config.deployments;
    let windows = [
        (IN_PROGRESS_KEY, state.in_progress, defaults.in_progress),
        (PENDING_KEY, state.pending, defaults.pending),
    ];
    join_query(windows.into_iter().filter_map(|(key, window, defaults)| {
        format_window(&window.unwrap_or_default(), defaults).map(|items| format!("{key}={items}"))
    }))
}

pub fn format_deployments(
    state: &DeploymentsState,
    config: &CodecConfig,
    dates: &DateBoundaries,
) -> String {
    let general = &state.general;
    let mut params = SearchParams::new();
    if general.show_creation_dialog {
        params.set("open", "true");
        if let Some(release) = &state.deployment_object.release {
            params.set("release", release.as_str());
        }
        if let Some(device) = &state.deployment_object.device {
            params.set("device", device.as_str());
        }
    } else if general.show_report_dialog {
        if let Some(id) = &general.report_id {
            params.set("open", "true");
            params.set("id", id.as_str());
        }
    }

    let list_config = CodecConfig {
        page_defaults: config.deployments.list,
        ..config.clone()
    };
    let page_state_query = match general.state {
        DeploymentsTab::Finished => match &state.finished {
            Some(finished) => {
                format_dates(&mut params, &finished.date_range, dates);
                if !finished.search.is_empty() {
                    params.set("search", finished.search.as_str());
                }
                if let Some(kind) = finished.deployment_type {
                    params.set("type", kind.as_str());
                }
                format_page_state(&finished.page_state, &list_config)
            }
            None => String::new(),
        },
        DeploymentsTab::Scheduled => state
            .scheduled
            .as_ref()
            .map(|page_state| format_page_state(page_state, &list_config))
            .unwrap_or_default(),
        DeploymentsTab::Active => format_active_deployments(state, config),
    };
    join_query([page_state_query, params.to_query_string()])
}

pub fn generate_deployments_path(general: &DeploymentsGeneral) -> String {
    format!("/deployments/{}", general.state)
}

#[cfg(test)]
#[path = "tests/deployments_tests.rs"]
mod tests;
