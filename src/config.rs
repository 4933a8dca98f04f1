use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Command line and environment settings
#[derive(Parser, Debug, Clone)]
#[command(name = "badger")]
#[command(about = "Cloud Build status badges", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Google Cloud project whose builds are reported
    #[arg(long, env = "PROJECT")]
    pub project: Option<String>,

    /// Prefix for every badge route, e.g. /badger
    #[arg(long, env = "PATH_PREFIX", default_value = "")]
    pub path_prefix: String,

    #[arg(long, env = "LOGFMT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// env_logger filter, RUST_LOG takes precedence when set
    #[arg(long, env = "LOGLVL", default_value = "info")]
    pub log_level: String,

    #[arg(
        long,
        env = "CLOUDBUILD_API_URL",
        default_value = "https://cloudbuild.googleapis.com"
    )]
    pub api_url: String,

    /// Static OAuth access token; the metadata server is used when unset
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "METADATA_URL", default_value = "http://metadata.google.internal")]
    pub metadata_url: String,

    #[arg(long, env = "BADGE_URL", default_value = "https://img.shields.io")]
    pub badge_url: String,

    #[arg(
        long,
        env = "CONSOLE_URL",
        default_value = "https://console.cloud.google.com"
    )]
    pub console_url: String,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,
}

/// Validated configuration, built once at startup and shared read-only
#[derive(Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub project: String,
    pub path_prefix: String,
    pub api_url: Url,
    pub access_token: Option<String>,
    pub metadata_url: Url,
    pub badge_url: Url,
    pub console_url: Url,
    pub upstream_timeout: Duration,
}

impl TryFrom<Cli> for AppConfig {
    type Error = AppError;

    fn try_from(cli: Cli) -> AppResult<Self> {
        let project = cli
            .project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Config("PROJECT must be set".to_string()))?;

        if cli.upstream_timeout_secs == 0 {
            return Err(AppError::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(AppConfig {
            bind_address: cli.bind_address,
            port: cli.port,
            project,
            path_prefix: normalize_prefix(&cli.path_prefix),
            api_url: parse_base_url("CLOUDBUILD_API_URL", &cli.api_url)?,
            access_token: cli.access_token.filter(|t| !t.is_empty()),
            metadata_url: parse_base_url("METADATA_URL", &cli.metadata_url)?,
            badge_url: parse_base_url("BADGE_URL", &cli.badge_url)?,
            console_url: parse_base_url("CONSOLE_URL", &cli.console_url)?,
            upstream_timeout: Duration::from_secs(cli.upstream_timeout_secs),
        })
    }
}

fn parse_base_url(name: &str, value: &str) -> AppResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| AppError::Config(format!("{} is not a valid URL ({}): {}", name, value, e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "{} must be an absolute http(s) URL, got {}",
            name, value
        )));
    }
    Ok(url)
}

/// "badger/" and "/badger" both become "/badger"; blank stays blank
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
