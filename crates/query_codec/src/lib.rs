//! Conversion between URL query strings and console list-page state.
//!
//! Every decoder is infallible: malformed parameters are logged and left
//! out of the decoded state. The URL is the only durable copy of page state,
//! so encoders omit anything equal to the configured defaults.

pub mod auditlogs;
pub mod config;
pub mod dates;
pub mod deployments;
pub mod devices;
pub mod page_state;
pub mod params;

/// Separates the parts of compound values such as `key:operator:value`.
pub const SEPARATOR: &str = ":";

pub use auditlogs::{format_auditlogs, parse_auditlogs_query, AuditLogsState};
pub use config::{CodecConfig, FilteringAttributes};
pub use dates::DateBoundaries;
pub use deployments::{
    format_deployments, generate_deployments_path, parse_deployments_query, DeploymentsContext,
    DeploymentsState,
};
pub use devices::{
    format_device_location, format_device_search, generate_device_path, parse_device_query,
    DeviceQuery,
};
pub use page_state::{format_page_state, parse_common, CommonQuery, FieldKind, FieldSpec, PageState};
pub use params::SearchParams;
