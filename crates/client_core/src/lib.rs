use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::Filter,
    error::ApiError,
    protocol::{
        AlertChannel, AlertChannelStatus, DeviceAlert, DeviceSearchRequest, IssueCounts,
        IssueType, SearchAttribute,
    },
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error};

pub mod error;
pub mod search;

pub use error::{ClientError, ClientResult};
use search::{convert_device_list_state_to_filters, DeviceListSelection};

pub const MONITOR_API_URL_V1: &str = "/api/management/v1/devicemonitor";
const REPORTING_SEARCH_PATH: &str = "/api/management/v1/reporting/devices/search";
const INVENTORY_SEARCH_PATH: &str = "/api/management/v2/inventory/filters/search";
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 20;
const LATEST_ALERTS_PER_PAGE: u32 = 10;
const CUTOFF_LENGTH: usize = 75;
const ELLIPSIS: &str = "...";
const SUCCESS_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub api_token: Option<String>,
    /// Search through the reporting service instead of inventory.
    pub has_reporting: bool,
    pub offline_threshold: TimeDelta,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            has_reporting: false,
            offline_threshold: TimeDelta::hours(24),
        }
    }

    fn search_endpoint(&self) -> String {
        let path = if self.has_reporting {
            REPORTING_SEARCH_PATH
        } else {
            INVENTORY_SEARCH_PATH
        };
        format!("{}{path}", self.server_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    DeviceAlertsReceived {
        device_id: String,
        alerts: Vec<DeviceAlert>,
    },
    LatestDeviceAlertsReceived {
        device_id: String,
        alerts: Vec<DeviceAlert>,
    },
    DeviceIssueCountsReceived {
        issue_type: IssueType,
        counts: IssueCounts,
    },
    AlertChannelChanged {
        channel: AlertChannel,
        enabled: bool,
    },
    /// User-facing message; `None` keeps it until dismissed.
    Notification {
        message: String,
        duration: Option<Duration>,
    },
    Error(ApiError),
}

#[derive(Debug, Clone)]
pub struct AlertQuery {
    pub page: u32,
    pub per_page: u32,
    pub issued_after: Option<DateTime<Utc>>,
    pub issued_before: Option<DateTime<Utc>>,
    pub sort_ascending: bool,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            issued_after: None,
            issued_before: None,
            sort_ascending: false,
        }
    }
}

#[derive(Serialize)]
struct AlertsHttpQuery {
    page: u32,
    per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_before: Option<String>,
    sort_ascending: bool,
}

impl From<&AlertQuery> for AlertsHttpQuery {
    fn from(query: &AlertQuery) -> Self {
        let timestamp = |value: &DateTime<Utc>| value.to_rfc3339_opts(SecondsFormat::Secs, true);
        Self {
            page: query.page,
            per_page: query.per_page,
            issued_after: query.issued_after.as_ref().map(timestamp),
            issued_before: query.issued_before.as_ref().map(timestamp),
            sort_ascending: query.sort_ascending,
        }
    }
}

#[derive(Serialize)]
struct PageQuery {
    page: u32,
    per_page: u32,
}

#[derive(Debug, Clone, Default)]
pub struct IssueCountOptions {
    /// Falls back to the filters last recorded with `set_device_filters`.
    pub filters: Option<Vec<Filter>>,
    pub group: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
pub trait MonitorActions: Send + Sync {
    async fn get_device_alerts(
        &self,
        device_id: &str,
        query: AlertQuery,
    ) -> ClientResult<Vec<DeviceAlert>>;
    async fn get_latest_device_alerts(
        &self,
        device_id: &str,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> ClientResult<Vec<DeviceAlert>>;
    async fn get_issue_counts_by_type(
        &self,
        issue_type: IssueType,
        options: IssueCountOptions,
    ) -> ClientResult<IssueCounts>;
    async fn change_notification_setting(
        &self,
        enabled: bool,
        channel: AlertChannel,
    ) -> ClientResult<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

#[derive(Default)]
struct MonitorState {
    device_filters: Vec<Filter>,
    alerts: HashMap<String, Vec<DeviceAlert>>,
    latest_alerts: HashMap<String, Vec<DeviceAlert>>,
    issue_counts: HashMap<IssueType, IssueCounts>,
    alert_channels: HashMap<AlertChannel, bool>,
}

pub struct MonitorClient {
    http: Client,
    config: ClientConfig,
    inner: Mutex<MonitorState>,
    events: broadcast::Sender<ClientEvent>,
}

impl MonitorClient {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            http: Client::new(),
            config,
            inner: Mutex::new(MonitorState::default()),
            events,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Records the filters of the device list, used by issue counting.
    pub async fn set_device_filters(&self, filters: Vec<Filter>) {
        self.inner.lock().await.device_filters = filters;
    }

    pub async fn issue_counts(&self, issue_type: IssueType) -> Option<IssueCounts> {
        self.inner.lock().await.issue_counts.get(&issue_type).copied()
    }

    pub async fn device_alerts(&self, device_id: &str) -> Vec<DeviceAlert> {
        self.inner
            .lock()
            .await
            .alerts
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn alert_channel_enabled(&self, channel: AlertChannel) -> Option<bool> {
        self.inner.lock().await.alert_channels.get(&channel).copied()
    }

    fn monitor_url(&self, path: &str) -> String {
        format!("{}{MONITOR_API_URL_V1}{path}", self.config.server_url)
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Reports a failed action to subscribers and hands the error back.
    fn common_error_handler(&self, err: ClientError, context: &str) -> ClientError {
        let api_error = err.to_api_error();
        let message = format!("{context} {}", api_error.message);
        error!(%message, code = ?api_error.code, "monitor request failed");
        self.emit(ClientEvent::Notification {
            message: message.clone(),
            duration: None,
        });
        self.emit(ClientEvent::Error(ApiError::new(api_error.code, message)));
        err
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let request = match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status, &body))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        Ok(self.execute(request).await?.json().await?)
    }

    async fn search_total(&self, request: &DeviceSearchRequest) -> ClientResult<u64> {
        let response = self
            .execute(self.http.post(self.config.search_endpoint()).json(request))
            .await?;
        response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .ok_or(ClientError::MissingTotalCount)
    }
}

#[async_trait]
impl MonitorActions for MonitorClient {
    async fn get_device_alerts(
        &self,
        device_id: &str,
        query: AlertQuery,
    ) -> ClientResult<Vec<DeviceAlert>> {
        let request = self
            .http
            .get(self.monitor_url(&format!("/devices/{device_id}/alerts")))
            .query(&AlertsHttpQuery::from(&query));
        let alerts: Vec<DeviceAlert> = self.fetch_json(request).await.map_err(|err| {
            let context = format!("Retrieving device alerts for device {device_id} failed:");
            self.common_error_handler(err, &context)
        })?;
        let alerts = sanitize_device_alerts(alerts);
        debug!(device_id, count = alerts.len(), "received device alerts");

        self.inner
            .lock()
            .await
            .alerts
            .insert(device_id.to_string(), alerts.clone());
        self.emit(ClientEvent::DeviceAlertsReceived {
            device_id: device_id.to_string(),
            alerts: alerts.clone(),
        });
        Ok(alerts)
    }

    async fn get_latest_device_alerts(
        &self,
        device_id: &str,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> ClientResult<Vec<DeviceAlert>> {
        let request = self
            .http
            .get(self.monitor_url(&format!("/devices/{device_id}/alerts/latest")))
            .query(&PageQuery {
                page: page.unwrap_or(DEFAULT_PAGE),
                per_page: per_page.unwrap_or(LATEST_ALERTS_PER_PAGE),
            });
        let alerts: Vec<DeviceAlert> = self.fetch_json(request).await.map_err(|err| {
            let context = format!("Retrieving device alerts for device {device_id} failed:");
            self.common_error_handler(err, &context)
        })?;
        let alerts = sanitize_device_alerts(alerts);

        self.inner
            .lock()
            .await
            .latest_alerts
            .insert(device_id.to_string(), alerts.clone());
        self.emit(ClientEvent::LatestDeviceAlertsReceived {
            device_id: device_id.to_string(),
            alerts: alerts.clone(),
        });
        Ok(alerts)
    }

    async fn get_issue_counts_by_type(
        &self,
        issue_type: IssueType,
        options: IssueCountOptions,
    ) -> ClientResult<IssueCounts> {
        let (filters, previous) = {
            let guard = self.inner.lock().await;
            (
                options
                    .filters
                    .unwrap_or_else(|| guard.device_filters.clone()),
                guard.issue_counts.get(&issue_type).copied().unwrap_or_default(),
            )
        };
        let selected_issues = [issue_type];
        let converted = convert_device_list_state_to_filters(
            &DeviceListSelection {
                filters: &filters,
                group: options.group.as_deref(),
                selected_issues: &selected_issues,
                status: options.status.as_deref(),
            },
            Utc::now() - self.config.offline_threshold,
        );
        let request = DeviceSearchRequest {
            page: 1,
            per_page: 1,
            filters: converted.filter_terms,
            attributes: vec![SearchAttribute {
                scope: shared::domain::Scope::Identity,
                attribute: "status".into(),
            }],
        };
        let found = self
            .search_total(&request)
            .await
            .map_err(|err| self.common_error_handler(err, "Retrieving issue counts failed:"))?;

        let counts = if converted.applicable_filters.is_empty() {
            IssueCounts {
                filtered: found,
                total: found,
            }
        } else {
            IssueCounts {
                filtered: found,
                total: previous.total,
            }
        };
        self.inner
            .lock()
            .await
            .issue_counts
            .insert(issue_type, counts);
        self.emit(ClientEvent::DeviceIssueCountsReceived { issue_type, counts });
        Ok(counts)
    }

    async fn change_notification_setting(
        &self,
        enabled: bool,
        channel: AlertChannel,
    ) -> ClientResult<()> {
        let channel_name = channel.as_str();
        let request = self
            .http
            .put(self.monitor_url(&format!(
                "/settings/global/channel/alerts/{channel_name}/status"
            )))
            .json(&AlertChannelStatus { enabled });
        let (prefix, verb) = if enabled { ("En", "en") } else { ("Dis", "dis") };
        self.execute(request).await.map_err(|err| {
            self.common_error_handler(err, &format!("{prefix}abling {channel_name} alerts failed:"))
        })?;

        self.inner
            .lock()
            .await
            .alert_channels
            .insert(channel, enabled);
        self.emit(ClientEvent::AlertChannelChanged { channel, enabled });
        self.emit(ClientEvent::Notification {
            message: format!("Successfully {verb}abled {channel_name} alerts"),
            duration: Some(SUCCESS_NOTIFICATION_DURATION),
        });
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

fn long_text_trimmer(text: &str) -> String {
    let limit = CUTOFF_LENGTH + ELLIPSIS.len();
    if text.chars().count() >= limit {
        format!("{}{ELLIPSIS}", text.chars().take(limit).collect::<String>())
    } else {
        text.to_string()
    }
}

fn sanitize_device_alerts(alerts: Vec<DeviceAlert>) -> Vec<DeviceAlert> {
    alerts
        .into_iter()
        .map(|alert| DeviceAlert {
            full_name: Some(alert.name.clone()),
            name: long_text_trimmer(&alert.name),
            ..alert
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
