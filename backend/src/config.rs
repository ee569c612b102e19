//! Runtime configuration read from environment variables.
//!
//! Every setting has a default, so an empty environment yields a working
//! server that reports to the log only.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::domain::report_service::{EmailConfig, ReportChannel, ReportConfig, WebhookConfig};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("invalid webhook header '{0}', expected Name:Value")]
    InvalidHeader(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// `None` allows any origin
    pub cors_allowed_origin: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "production".to_string(),
            cors_allowed_origin: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any name → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            environment: get("APP_ENV").unwrap_or(defaults.environment),
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN"),
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            )?,
        };

        let email_defaults = EmailConfig::default();
        let email = EmailConfig {
            smtp_host: get("SMTP_HOST"),
            smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), email_defaults.smtp_port)?,
            username: get("SMTP_USERNAME").unwrap_or_default(),
            password: get("SMTP_PASSWORD").unwrap_or_default(),
            from_email: get("FROM_EMAIL").unwrap_or_default(),
            to_emails: get("TO_EMAILS").map(|v| split_list(&v)).unwrap_or_default(),
            subject: get("REPORT_SUBJECT").unwrap_or(email_defaults.subject),
        };

        let webhook_defaults = WebhookConfig::default();
        let webhook = WebhookConfig {
            url: get("WEBHOOK_URL"),
            timeout: match get("WEBHOOK_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_value("WEBHOOK_TIMEOUT_SECS", &v)?),
                None => webhook_defaults.timeout,
            },
            headers: match get("WEBHOOK_HEADERS") {
                Some(v) => parse_headers(&v)?,
                None => Vec::new(),
            },
        };

        let report = ReportConfig {
            channels: get("REPORT_CHANNELS")
                .map(|v| parse_channels(&v))
                .unwrap_or_else(|| ReportConfig::default().channels),
            email,
            webhook,
            error_directory: get("REPORT_ERROR_DIR").map(PathBuf::from),
            force_mock: parse_or("REPORT_FORCE_MOCK", get("REPORT_FORCE_MOCK"), false)?,
        };

        Ok(Self { server, report })
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_value(name, &v),
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_channels(value: &str) -> Vec<ReportChannel> {
    let mut channels = Vec::new();
    for name in split_list(value) {
        match name.parse::<ReportChannel>() {
            Ok(channel) if !channels.contains(&channel) => channels.push(channel),
            Ok(_) => {}
            Err(e) => warn!("Ignoring report channel: {}", e),
        }
    }
    channels
}

fn parse_headers(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|pair| match pair.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidHeader(pair)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.environment, "production");
        assert_eq!(config.server.cors_allowed_origin, None);
        assert_eq!(config.server.max_upload_bytes, 33_554_432);
        assert_eq!(config.report.channels, vec![ReportChannel::Log]);
        assert_eq!(config.report.email.smtp_port, 587);
        assert_eq!(config.report.email.subject, "Migration Report - Ledger API");
        assert_eq!(config.report.webhook.timeout, Duration::from_secs(10));
        assert!(config.report.error_directory.is_none());
        assert!(!config.report.force_mock);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("APP_ENV", "development"),
            ("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
            ("REPORT_CHANNELS", "log, email,webhook"),
            ("TO_EMAILS", "ops@example.com, audit@example.com"),
            ("WEBHOOK_URL", "https://hooks.example.com/migrations"),
            ("WEBHOOK_TIMEOUT_SECS", "3"),
            ("WEBHOOK_HEADERS", "Authorization:Bearer abc,X-Source:ledger"),
            ("REPORT_ERROR_DIR", "/tmp/errors"),
            ("REPORT_FORCE_MOCK", "true"),
        ])
        .unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.server.environment, "development");
        assert_eq!(
            config.server.cors_allowed_origin.as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(
            config.report.channels,
            vec![ReportChannel::Log, ReportChannel::Email, ReportChannel::Webhook]
        );
        assert_eq!(
            config.report.email.to_emails,
            vec!["ops@example.com", "audit@example.com"]
        );
        assert_eq!(config.report.webhook.timeout, Duration::from_secs(3));
        assert_eq!(
            config.report.webhook.headers,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Source".to_string(), "ledger".to_string()),
            ]
        );
        assert_eq!(config.report.error_directory, Some(PathBuf::from("/tmp/errors")));
        assert!(config.report.force_mock);
    }

    #[test]
    fn test_unknown_channels_ignored() {
        let config = config_from(&[("REPORT_CHANNELS", "sms,webhook,webhook")]).unwrap();
        assert_eq!(config.report.channels, vec![ReportChannel::Webhook]);
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_webhook_header() {
        let err = config_from(&[("WEBHOOK_HEADERS", "NoColon")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidHeader("NoColon".to_string()));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("PORT", "  "), ("HOST", "")]).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }
}
