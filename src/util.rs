use actix_web::HttpResponse;
use http::StatusCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigError, RelayConfig};
use crate::forward::Forwarder;

/// Load environment variables from a dotenv file without overriding existing ones.
///
/// Lookup order:
/// - explicit path in ENV_FILE or DOTENV_PATH
/// - `.env` discovered from the current directory upward
///
/// Returns a description of the source that was loaded, if any.
pub fn load_env_file() -> Option<String> {
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                return Some(format!("{p} ({key})"));
            }
        }
    }

    dotenvy::dotenv()
        .ok()
        .map(|path| path.display().to_string())
}

/// Initialize structured tracing based on RUST_LOG (default `info`).
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,actix_server=warn".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Build the outbound HTTP client used for every forwarded webhook.
pub fn build_http_client(config: &RelayConfig) -> Result<reqwest::Client, ConfigError> {
    let client = reqwest::Client::builder()
        .timeout(config.forward_timeout)
        .user_agent(format!("webhook-relay/{}", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Shared application state used by the HTTP server and handlers.
///
/// Everything here is immutable after startup; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        let client = build_http_client(&config)?;
        let forwarder = Forwarder::new(
            client,
            config.target_url.clone(),
            config.forward_timeout,
        );
        Ok(Self {
            config: Arc::new(config),
            forwarder,
        })
    }
}

/// Convert an `http` 1.x status into actix-web's status type.
pub fn actix_status(status: StatusCode) -> actix_web::http::StatusCode {
    actix_web::http::StatusCode::from_u16(status.as_u16())
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build a JSON failure response: `{success: false, error, message}`.
pub fn json_error(status: StatusCode, error: &str, message: &str) -> HttpResponse {
    let body = serde_json::json!({
        "success": false,
        "error": error,
        "message": message,
    });
    HttpResponse::build(actix_status(status)).json(body)
}
