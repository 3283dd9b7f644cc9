//! HTTP status to error-kind mapping.

use crate::{Error, ErrorContext};
use serde_json::{json, Value};

/// Parse an error body as JSON; non-JSON or non-object bodies are wrapped as `{"error": <text>}`.
pub fn parse_error_body(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(v @ Value::Object(_)) => v,
        _ => json!({ "error": text }),
    }
}

fn error_message(body: &Value) -> String {
    let field = body.get("error").or_else(|| body.get("message"));
    match field {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => match obj.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => Value::Object(obj.clone()).to_string(),
        },
        Some(other) if !other.is_null() => other.to_string(),
        _ => "Unknown error".to_string(),
    }
}

/// Classify a failed response (`status >= 400`).
///
/// `retry_after` is the raw `Retry-After` header value, if any.
pub fn classify_response(status: u16, retry_after: Option<&str>, body_text: &str) -> Error {
    let body = parse_error_body(body_text);
    let msg = error_message(&body);
    let context = ErrorContext::new()
        .with_status_code(status)
        .with_response_body(body.clone())
        .with_source("transport");

    match status {
        401 => Error::Authentication {
            message: format!("Authentication failed: {}", msg),
            context,
        },
        402 => Error::InsufficientCredits {
            message: format!("Insufficient credits: {}", msg),
            credits_remaining: body.get("credits_remaining").and_then(Value::as_f64),
            credits_required: body.get("credits_required").and_then(Value::as_f64),
            context,
        },
        429 => Error::RateLimit {
            message: format!("Rate limit exceeded: {}", msg),
            retry_after: retry_after.and_then(parse_retry_after),
            context,
        },
        422 => Error::Validation {
            message: format!("Validation error: {}", msg),
            field: body
                .get("field")
                .and_then(Value::as_str)
                .map(str::to_string),
            context,
        },
        s if s >= 500 => Error::Api {
            message: format!("Server error: {}", msg),
            context,
        },
        _ => Error::Api {
            message: format!("Request failed: {}", msg),
            context,
        },
    }
}

/// Delta-seconds only; negative and non-finite values are dropped.
fn parse_retry_after(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}
