use std::fs;

use anyhow::Context;
use chrono::TimeDelta;
use client_core::ClientConfig;
use query_codec::CodecConfig;
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "fleet.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub api_token: Option<String>,
    pub has_reporting: bool,
    pub offline_threshold_hours: i64,
    pub default_per_page: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "https://localhost".into(),
            api_token: None,
            has_reporting: false,
            offline_threshold_hours: 24,
            default_per_page: 20,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    api_token: Option<String>,
    has_reporting: Option<bool>,
    offline_threshold_hours: Option<i64>,
    default_per_page: Option<u32>,
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.server_url.as_str());
        config.api_token = self.api_token.clone();
        config.has_reporting = self.has_reporting;
        config.offline_threshold = TimeDelta::hours(self.offline_threshold_hours);
        config
    }

    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig::default().with_per_page(self.default_per_page)
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(SETTINGS_FILE) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(err).with_context(|| format!("failed to read {SETTINGS_FILE}")),
    };
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Layers the settings file and then environment variables over the defaults.
/// Each setting reads `FLEET_<NAME>` and then `APP__<NAME>`, the latter winning.
pub fn resolve_settings(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings =
            toml::from_str(raw).with_context(|| format!("invalid {SETTINGS_FILE}"))?;
        if let Some(v) = file_cfg.server_url {
            settings.server_url = v;
        }
        if file_cfg.api_token.is_some() {
            settings.api_token = file_cfg.api_token;
        }
        if let Some(v) = file_cfg.has_reporting {
            settings.has_reporting = v;
        }
        if let Some(v) = file_cfg.offline_threshold_hours {
            settings.offline_threshold_hours = v;
        }
        if let Some(v) = file_cfg.default_per_page {
            settings.default_per_page = v;
        }
    }

    let lookup =
        |name: &str| env(&format!("APP__{name}")).or_else(|| env(&format!("FLEET_{name}")));

    if let Some(v) = lookup("SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(v) = lookup("HAS_REPORTING") {
        match v.parse() {
            Ok(parsed) => settings.has_reporting = parsed,
            Err(_) => warn!(value = %v, "ignoring HAS_REPORTING override"),
        }
    }
    if let Some(v) = lookup("OFFLINE_THRESHOLD_HOURS") {
        match v.parse() {
            Ok(parsed) => settings.offline_threshold_hours = parsed,
            Err(_) => warn!(value = %v, "ignoring OFFLINE_THRESHOLD_HOURS override"),
        }
    }
    if let Some(v) = lookup("DEFAULT_PER_PAGE") {
        match v.parse::<u32>() {
            Ok(parsed) if parsed > 0 => settings.default_per_page = parsed,
            _ => warn!(value = %v, "ignoring DEFAULT_PER_PAGE override"),
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
