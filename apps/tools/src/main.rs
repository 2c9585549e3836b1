use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{AlertQuery, IssueCountOptions, MonitorActions, MonitorClient};
use query_codec::{
    format_device_location, format_deployments, parse_auditlogs_query, parse_common,
    parse_deployments_query, parse_device_query, DateBoundaries, DeploymentsContext,
    FilteringAttributes, PageState, SearchParams,
};
use serde::Serialize;
use shared::{
    domain::{DeploymentsTab, Filter, Operator, Scope},
    protocol::{AlertChannel, IssueType},
};
use tracing::info;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "fleet-tools", about = "Fleet console query and monitor utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a device list query into page state and filters.
    DecodeDevices {
        query: String,
        /// Attribute placement for legacy queries, as `scope=name,name`.
        #[arg(long = "attribute")]
        attributes: Vec<String>,
    },
    /// Encode filters and a group selection into a device list query.
    EncodeDevices {
        /// Filter as `scope:key:operator:value`, operator without `$`.
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    DecodeDeployments {
        path: String,
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        previous_tab: Option<String>,
    },
    DecodeAuditLogs {
        #[arg(default_value = "")]
        query: String,
    },
    Alerts {
        device: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
        #[arg(long)]
        ascending: bool,
    },
    LatestAlerts {
        device: String,
    },
    IssueCounts {
        /// One of offline, failedLastUpdate, monitoring, authRequests.
        issue: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Notifications {
        action: Toggle,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Toggle {
    Enable,
    Disable,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedDevices {
    page_state: PageState,
    filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
}

fn parse_attribute_arg(raw: &str) -> Result<(Scope, Vec<String>)> {
    let (scope, names) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected scope=name[,name], got {raw}"))?;
    let scope = scope.parse::<Scope>()?;
    Ok((scope, names.split(',').map(str::to_string).collect()))
}

fn parse_filter_arg(raw: &str) -> Result<Filter> {
    let mut parts = raw.splitn(4, ':');
    let (Some(scope), Some(key), Some(operator), Some(value)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow!("expected scope:key:operator:value, got {raw}"));
    };
    Ok(Filter::new(
        scope.parse()?,
        key,
        Operator::from_short_key(operator)?,
        value,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings()?;
    let codec = settings.codec_config();
    let dates = DateBoundaries::current();

    match cli.command {
        Command::DecodeDevices { query, attributes } => {
            let attributes = attributes
                .iter()
                .map(|raw| parse_attribute_arg(raw))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .fold(FilteringAttributes::new(), |accu, (scope, names)| {
                    accu.with_scope(scope, names)
                });
            let common = parse_common(&SearchParams::parse(&query), &[]);
            let devices = parse_device_query(&common.params, &attributes);
            print_json(&DecodedDevices {
                page_state: common.page_state,
                filters: devices.filters,
                group_name: devices.group_name,
            })?;
        }
        Command::EncodeDevices {
            filters,
            group,
            page,
            per_page,
        } => {
            let filters = filters
                .iter()
                .map(|raw| parse_filter_arg(raw))
                .collect::<Result<Vec<_>>>()?;
            let page_state = PageState {
                page,
                per_page,
                ..PageState::default()
            };
            println!(
                "{}",
                format_device_location(&page_state, &filters, group.as_deref(), &codec)
            );
        }
        Command::DecodeDeployments {
            path,
            query,
            previous_tab,
        } => {
            let previous_tab = previous_tab
                .map(|tab| tab.parse::<DeploymentsTab>())
                .transpose()?;
            let state = parse_deployments_query(
                &SearchParams::parse(&query),
                &DeploymentsContext {
                    pathname: &path,
                    previous_tab,
                    dates,
                },
            );
            let normalized = format_deployments(&state, &codec, &dates);
            info!(query = %normalized, "normalized deployments query");
            print_json(&state)?;
        }
        Command::DecodeAuditLogs { query } => {
            print_json(&parse_auditlogs_query(&SearchParams::parse(&query), &dates))?;
        }
        Command::Alerts {
            device,
            page,
            per_page,
            ascending,
        } => {
            let client = MonitorClient::new(settings.client_config());
            let alerts = client
                .get_device_alerts(
                    &device,
                    AlertQuery {
                        page,
                        per_page,
                        sort_ascending: ascending,
                        ..AlertQuery::default()
                    },
                )
                .await
                .with_context(|| format!("fetching alerts for {device}"))?;
            print_json(&alerts)?;
        }
        Command::LatestAlerts { device } => {
            let client = MonitorClient::new(settings.client_config());
            let alerts = client
                .get_latest_device_alerts(&device, None, None)
                .await
                .with_context(|| format!("fetching latest alerts for {device}"))?;
            print_json(&alerts)?;
        }
        Command::IssueCounts {
            issue,
            group,
            status,
        } => {
            let issue_type =
                IssueType::from_key(&issue).ok_or_else(|| anyhow!("unknown issue type {issue}"))?;
            let client = MonitorClient::new(settings.client_config());
            let counts = client
                .get_issue_counts_by_type(
                    issue_type,
                    IssueCountOptions {
                        group,
                        status,
                        ..IssueCountOptions::default()
                    },
                )
                .await
                .context("counting device issues")?;
            print_json(&counts)?;
        }
        Command::Notifications { action } => {
            let client = MonitorClient::new(settings.client_config());
            let enabled = matches!(action, Toggle::Enable);
            client
                .change_notification_setting(enabled, AlertChannel::Email)
                .await
                .context("changing alert notification setting")?;
            info!(enabled, "alert notifications updated");
        }
    }

    Ok(())
}
