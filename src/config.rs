//! Startup configuration.
//!
//! Values come from command-line flags, falling back to environment variables
//! (optionally seeded from a `.env` file, see [`crate::util::load_env_file`]).
//! The result is an immutable [`RelayConfig`] built once before the listener is
//! bound and shared read-only with every request.

use clap::Parser;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Ceiling on the outbound call to the destination.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Inbound JSON body cap (100kb).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TARGET_SERVER_URL is not set")]
    MissingTargetUrl,
    #[error("TARGET_SERVER_URL is not a valid URL ({url}): {source}")]
    InvalidTargetUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("TARGET_SERVER_URL must use http or https: {url}")]
    UnsupportedScheme { url: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Command-line interface. Every flag can also be supplied through the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "webhook-relay", version, about)]
pub struct Cli {
    /// Destination that receives the transformed payload.
    #[arg(long, env = "TARGET_SERVER_URL")]
    pub target_server_url: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Maximum accepted webhook body size in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Parsed destination, used for the outbound call.
    pub target_url: Url,
    /// Destination exactly as configured, reported by `/health`.
    pub target_url_raw: String,
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub forward_timeout: Duration,
}

impl RelayConfig {
    /// Validate CLI/env input. A missing or unusable destination is fatal.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let raw = cli
            .target_server_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingTargetUrl)?;

        let target_url = parse_target_url(&raw)?;

        Ok(Self {
            target_url,
            target_url_raw: raw,
            host: cli.host,
            port: cli.port,
            max_body_bytes: cli.max_body_bytes,
            forward_timeout: FORWARD_TIMEOUT,
        })
    }

    /// Address handed to the HTTP server's `bind`.
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidTargetUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            url: raw.to_string(),
        }),
    }
}
