//! Middleware for logging requests and responses.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::Level;

use crate::Error;

/// The number of bytes of a request body that are logged.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never logged.
const REDACTED_FIELDS: [&str; 3] = ["password", "new_password", "otp"];

const REDACTED: &str = "********";

/// Log each request as `METHOD path | status | latency`.
///
/// When the `debug` level is enabled, JSON request bodies are also logged with
/// secrets redacted and truncated to [LOG_BODY_LENGTH_LIMIT] bytes. Bodies over
/// axum's default body limit are rejected before they reach a handler.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let request = if is_json && tracing::enabled!(Level::DEBUG) {
        let (parts, body) = request.into_parts();

        let body_bytes = match Bytes::from_request(Request::new(body), &()).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                tracing::warn!("Could not read request body for {method} {path}: {rejection}");
                let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Error::PayloadTooLarge
                } else {
                    Error::InvalidInput("No se pudo leer el cuerpo de la solicitud".to_owned())
                };
                return error.into_response();
            }
        };

        tracing::debug!(
            "Request body: {}",
            truncate(&redact(&String::from_utf8_lossy(&body_bytes)), LOG_BODY_LENGTH_LIMIT)
        );

        Request::from_parts(parts, Body::from(body_bytes))
    } else {
        request
    };

    let response = next.run(request).await;

    tracing::info!(
        "{method} {path} | {} | {:?}",
        response.status().as_u16(),
        started.elapsed()
    );

    response
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object.
///
/// Bodies that are not JSON objects are returned as they are.
fn redact(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    let Some(object) = value.as_object_mut() else {
        return body.to_owned();
    };

    for field in REDACTED_FIELDS {
        if let Some(secret) = object.get_mut(field) {
            *secret = Value::String(REDACTED.to_owned());
        }
    }

    value.to_string()
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_owned();
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &text[..end])
}
