//! Runtime configuration.
//!
//! Resolved once at process startup from `CLINICDESK_*` environment variables
//! and passed down explicitly; nothing below `main` reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::ClinicError;

pub const DEFAULT_API_BASE: &str = "https://176.109.105.255.sslip.io/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "clinicdesk.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicConfig {
    pub api_base: String,
    pub use_mock: bool,
    /// Fixed latency for every mock call; `None` keeps the per-call defaults.
    pub mock_latency: Option<Duration>,
    pub http_timeout: Duration,
    /// Attached to visits created from this terminal.
    pub doctor_id: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            use_mock: false,
            mock_latency: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            doctor_id: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ClinicError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" | "" => Ok(false),
        other => Err(ClinicError::Config(format!(
            "{name} must be true or false, got {other:?}"
        ))),
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64, ClinicError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ClinicError::Config(format!("{name} must be a whole number, got {value:?}")))
}

impl ClinicConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ClinicError::Config` when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ClinicError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    ///
    /// # Errors
    /// Returns `ClinicError::Config` when a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClinicError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("CLINICDESK_API_BASE") {
            let base = base.trim().trim_end_matches('/');
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ClinicError::Config(format!(
                    "CLINICDESK_API_BASE must be an http(s) URL, got {base:?}"
                )));
            }
            config.api_base = base.to_string();
        }

        if let Some(v) = lookup("CLINICDESK_USE_MOCK") {
            config.use_mock = parse_flag("CLINICDESK_USE_MOCK", &v)?;
        }

        if let Some(v) = lookup("CLINICDESK_MOCK_LATENCY_MS") {
            let ms = parse_u64("CLINICDESK_MOCK_LATENCY_MS", &v)?;
            config.mock_latency = Some(Duration::from_millis(ms));
        }

        if let Some(v) = lookup("CLINICDESK_HTTP_TIMEOUT_SECS") {
            let secs = parse_u64("CLINICDESK_HTTP_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(ClinicError::Config(
                    "CLINICDESK_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.http_timeout = Duration::from_secs(secs);
        }

        config.doctor_id = lookup("CLINICDESK_DOCTOR_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(v) = lookup("CLINICDESK_LOG_MODE") {
            config.log_mode = match v.trim() {
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                _ => LogMode::Auto,
            };
        }

        if let Some(v) = lookup("CLINICDESK_LOG_FILE") {
            config.log_file = PathBuf::from(v);
        }

        Ok(config)
    }
}
