//! Outbound delivery of the transformed envelope.
//!
//! Each webhook produces exactly one POST to the configured destination. The
//! result is folded into an [`Outcome`], which the HTTP layer turns into the
//! caller-facing status and JSON body. No retries, no backoff.

use http::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::transform::Envelope;

pub const SUCCESS_MESSAGE: &str = "Data forwarded successfully";
pub const DOWNSTREAM_ERROR: &str = "Target server error";
pub const UNREACHABLE_ERROR: &str = "Target server unavailable";
pub const UNREACHABLE_MESSAGE: &str = "Could not reach target server";
pub const LOCAL_FAILURE_ERROR: &str = "Internal server error";

/// Terminal state of one forwarding attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Destination answered with a non-error status.
    Success { status: StatusCode, body: Value },
    /// Destination answered with 4xx/5xx. Its status is relayed to the caller.
    DownstreamError { status: StatusCode, body: Value },
    /// Request went out but no complete response came back (refused, DNS, timeout).
    DownstreamUnreachable { reason: String },
    /// Request could not be built or sent at all.
    LocalFailure { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Status returned to the webhook caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Outcome::Success { .. } => StatusCode::OK,
            Outcome::DownstreamError { status, .. } => *status,
            Outcome::DownstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            Outcome::LocalFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body returned to the webhook caller.
    pub fn body(&self) -> Value {
        match self {
            Outcome::Success { body, .. } => json!({
                "success": true,
                "message": SUCCESS_MESSAGE,
                "targetResponse": body,
            }),
            Outcome::DownstreamError { body, .. } => json!({
                "success": false,
                "error": DOWNSTREAM_ERROR,
                "details": body,
            }),
            Outcome::DownstreamUnreachable { .. } => json!({
                "success": false,
                "error": UNREACHABLE_ERROR,
                "message": UNREACHABLE_MESSAGE,
            }),
            Outcome::LocalFailure { reason } => json!({
                "success": false,
                "error": LOCAL_FAILURE_ERROR,
                "message": reason,
            }),
        }
    }
}

/// Statuses below 400 count as a completed exchange; 4xx and above are downstream errors.
pub fn classify_response(status: StatusCode, body: Value) -> Outcome {
    if status.as_u16() < 400 {
        Outcome::Success { status, body }
    } else {
        Outcome::DownstreamError { status, body }
    }
}

/// Decode a destination body: JSON when it parses, otherwise the raw text.
/// An empty body becomes `""`.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn classify_send_error(err: &reqwest::Error) -> Outcome {
    if err.is_builder() {
        Outcome::LocalFailure {
            reason: err.to_string(),
        }
    } else {
        Outcome::DownstreamUnreachable {
            reason: err.to_string(),
        }
    }
}

/// Sends envelopes to the single configured destination.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    destination: Url,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, destination: Url, timeout: Duration) -> Self {
        Self {
            client,
            destination,
            timeout,
        }
    }

    pub fn destination(&self) -> &Url {
        &self.destination
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST the envelope once and classify the result.
    pub async fn forward(&self, envelope: &Envelope) -> Outcome {
        let payload = match serde_json::to_vec(envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to serialize envelope: {}", e);
                return Outcome::LocalFailure {
                    reason: e.to_string(),
                };
            }
        };

        let request = self
            .client
            .post(self.destination.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(payload);

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let outcome = classify_send_error(&e);
                match &outcome {
                    Outcome::LocalFailure { reason } => {
                        tracing::error!("Failed to build request to target server: {}", reason)
                    }
                    _ => tracing::error!(
                        timeout = e.is_timeout(),
                        connect = e.is_connect(),
                        "No response from target server: {}",
                        e
                    ),
                }
                return outcome;
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => decode_body(&bytes),
            Err(e) => {
                tracing::error!(status = %status, "Target server response was cut short: {}", e);
                return Outcome::DownstreamUnreachable {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = classify_response(status, body);
        match &outcome {
            Outcome::Success { status, body } => {
                tracing::info!(status = status.as_u16(), body = %body, "Response from target server")
            }
            Outcome::DownstreamError { status, body } => {
                tracing::error!(status = status.as_u16(), body = %body, "Target server error")
            }
            _ => {}
        }
        outcome
    }
}
