//! Process configuration, read from the environment (and `.env` if present).

use crate::layout::SheetLayout;
use crate::retry::RetryConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Layout(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub debug: bool,
    /// Origins allowed by CORS outside debug mode
    pub allowed_origins: Vec<String>,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub sheets_token: String,
    pub drive_token: String,
    pub drive_folder: Option<String>,
    pub share_host: String,
    pub max_upload_bytes: usize,
    pub retry: RetryConfig,
    pub layout: SheetLayout,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let debug = get("DEBUG").map(|v| parse_flag(&v)).unwrap_or(true);

        let mut allowed_origins = get("ALLOWED_ORIGINS")
            .map(|v| csv_list(&v))
            .unwrap_or_default();
        if let Some(origin) = get("FRONTEND_ORIGIN") {
            if !allowed_origins.contains(&origin) {
                allowed_origins.push(origin);
            }
        }

        let sheets_token = required("SHEETS_ACCESS_TOKEN")?;
        let drive_token = get("DRIVE_ACCESS_TOKEN").unwrap_or_else(|| sheets_token.clone());

        let max_upload_mb: usize = parse_or(&get, "MAX_UPLOAD_MB", 200)?;
        let retry = RetryConfig {
            max_attempts: parse_or(&get, "RETRY_ATTEMPTS", 3)?,
            ..RetryConfig::default()
        };

        let mut layout = SheetLayout::default();
        layout.header_row = parse_or(&get, "HEADER_ROW", layout.header_row)?;
        layout.first_data_row = parse_or(&get, "FIRST_DATA_ROW", layout.first_data_row)?;
        layout.primary = parse_or(&get, "PRIMARY_COLUMNS", layout.primary)?;
        layout.sent = parse_or(&get, "SENT_COLUMNS", layout.sent)?;
        layout.received = parse_or(&get, "RECEIVED_COLUMNS", layout.received)?;
        if let Some(header) = get("VIDEO_LINK_HEADER") {
            layout.headers.video_link = header;
        }
        layout
            .validate()
            .map_err(|e| ConfigError::Layout(e.to_string()))?;

        Ok(AppConfig {
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8000)))?,
            debug,
            allowed_origins,
            spreadsheet_id: required("SPREADSHEET_ID")?,
            sheet_name: get("SHEET_NAME").unwrap_or_else(|| "SCM FORWARD".to_string()),
            sheets_token,
            drive_token,
            drive_folder: get("DRIVE_FOLDER_ID"),
            share_host: get("SHARE_HOST").unwrap_or_else(|| "drive.google.com".to_string()),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            retry,
            layout,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
