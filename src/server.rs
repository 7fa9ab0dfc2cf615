use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use bytes::BytesMut;
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;
use http::StatusCode;
use serde_json::{json, Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::forward::Outcome;
use crate::transform::transform_value;
use crate::util::{actix_status, json_error, AppState};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Configure Actix-web routes with AppState.
///
/// Unknown paths, and known paths hit with the wrong method, answer 404.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/webhook")
            .route(web::post().to(webhook))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/health")
            .route(web::get().to(health))
            .default_service(web::to(not_found)),
    )
    .default_service(web::to(not_found));
}

/// Middleware: one log line per inbound request.
pub async fn log_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    tracing::info!(method = %req.method(), path = %req.path(), "{} {}", req.method(), req.path());
    next.call(req).await
}

#[derive(Debug)]
enum BodyError {
    TooLarge { limit: usize },
    Read(actix_web::error::PayloadError),
}

async fn read_body(mut payload: web::Payload, limit: usize) -> Result<BytesMut, BodyError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if body.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Parse a webhook body. An empty (or whitespace-only) body is read as `{}`.
fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

fn outcome_response(outcome: &Outcome) -> HttpResponse {
    HttpResponse::build(actix_status(outcome.status_code())).json(outcome.body())
}

/// `POST /api/webhook`: reshape the payload and relay it to the destination.
async fn webhook(state: web::Data<AppState>, payload: web::Payload) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("webhook", request_id = %request_id);
    let mut response = handle_webhook(&state, payload).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(X_REQUEST_ID), value);
    }
    response
}

async fn handle_webhook(state: &AppState, payload: web::Payload) -> HttpResponse {
    let bytes = match read_body(payload, state.config.max_body_bytes).await {
        Ok(b) => b,
        Err(BodyError::TooLarge { limit }) => {
            tracing::warn!(limit, "Rejected oversized webhook body");
            return json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload too large",
                &format!("Request body exceeds {limit} bytes"),
            );
        }
        Err(BodyError::Read(e)) => {
            tracing::warn!("Failed to read webhook body: {}", e);
            return json_error(StatusCode::BAD_REQUEST, "Invalid request", &e.to_string());
        }
    };

    let input = match parse_body(&bytes) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Rejected malformed JSON body: {}", e);
            return json_error(StatusCode::BAD_REQUEST, "Invalid JSON", &e.to_string());
        }
    };

    tracing::info!(payload = %input, "Received data");

    let envelope = match transform_value(input) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!("Rejected webhook body: {}", e);
            return json_error(StatusCode::BAD_REQUEST, "Invalid payload", &e.to_string());
        }
    };

    tracing::info!(
        payload = %serde_json::to_string(&envelope).unwrap_or_default(),
        "Transformed data"
    );

    let outcome = state.forwarder.forward(&envelope).await;
    if !outcome.is_success() {
        tracing::error!(status = outcome.status_code().as_u16(), "Error processing request");
    }
    outcome_response(&outcome)
}

/// `GET /health`: liveness plus the configured destination.
async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "targetServer": state.config.target_url_raw,
    }))
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "error": "Not found",
        "message": format!("Route {} {} not found", req.method(), req.path()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_reads_as_empty_object() {
        assert_eq!(parse_body(b"").unwrap(), json!({}));
        assert_eq!(parse_body(b" \n\t").unwrap(), json!({}));
    }

    #[test]
    fn body_parsing_keeps_non_objects_for_later_rejection() {
        assert_eq!(parse_body(b"[1]").unwrap(), json!([1]));
        assert_eq!(parse_body(b"null").unwrap(), Value::Null);
        assert!(parse_body(b"{\"a\":").is_err());
    }

    #[test]
    fn outcome_response_uses_outcome_status() {
        let resp = outcome_response(&Outcome::DownstreamError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: json!({}),
        });
        assert_eq!(resp.status().as_u16(), 422);

        let resp = outcome_response(&Outcome::DownstreamUnreachable {
            reason: "refused".into(),
        });
        assert_eq!(resp.status().as_u16(), 502);
    }
}
