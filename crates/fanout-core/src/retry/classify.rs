//! Classify raw HTTP responses and transport failures into `ApiError`.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::ApiError;

/// Structured error body in the shape many REST APIs return with a failure
/// status: a list of top-level messages, a single message, and/or a map of
/// per-field validation messages.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Classifies a non-2xx response. Pure: the caller passes the already-read
/// `Retry-After` header value and body bytes.
///
/// 429 resolves its wait hint from the header, falling back to
/// `default_retry_after_secs` when the header is absent, non-numeric, or zero.
pub fn classify_response(
    status: u16,
    retry_after: Option<&str>,
    body: &[u8],
    default_retry_after_secs: u64,
) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    if status == 429 {
        let message = first_non_empty(parsed.message, parsed.error_messages)
            .unwrap_or_else(|| "rate limit exceeded".to_string());
        let secs = parse_retry_after(retry_after, default_retry_after_secs);
        return ApiError::rate_limited(message, secs);
    }

    let message = first_non_empty(None, parsed.error_messages)
        .or(parsed.message.filter(|m| !m.is_empty()))
        .unwrap_or_else(|| "Unknown error".to_string());
    ApiError::http(status, message, parsed.errors)
}

/// Classifies a `reqwest` failure where no usable response exists.
///
/// Builder errors never left the process; everything else (connect refusal,
/// timeout, broken body read) counts as "dispatched, no response".
pub fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_builder() {
        return ApiError::request(err.to_string());
    }
    ApiError::no_response()
}

fn first_non_empty(message: Option<String>, fallbacks: Vec<String>) -> Option<String> {
    message
        .filter(|m| !m.is_empty())
        .or_else(|| fallbacks.into_iter().find(|m| !m.is_empty()))
}

fn parse_retry_after(header: Option<&str>, default_secs: u64) -> u64 {
    match header.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(n) if n > 0 => n,
        _ => default_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::error::ErrorKind;

    #[test]
    fn rate_limit_header_parsed() {
        let e = classify_response(429, Some("30"), b"{}", 60);
        assert_eq!(e.kind, ErrorKind::RateLimited);
        assert_eq!(e.status, 429);
        assert_eq!(e.retry_after_secs, Some(30));
    }

    #[test]
    fn rate_limit_header_missing_or_unusable_defaults() {
        assert_eq!(classify_response(429, None, b"{}", 60).retry_after_secs, Some(60));
        assert_eq!(classify_response(429, Some("soon"), b"{}", 60).retry_after_secs, Some(60));
        assert_eq!(classify_response(429, Some("0"), b"{}", 60).retry_after_secs, Some(60));
        assert_eq!(classify_response(429, None, b"{}", 15).retry_after_secs, Some(15));
    }

    #[test]
    fn message_taken_from_body() {
        let e = classify_response(404, None, br#"{"message":"not found"}"#, 60);
        assert_eq!(e.status, 404);
        assert_eq!(e.message, "not found");
        assert_eq!(e.kind, ErrorKind::Client);
    }

    #[test]
    fn error_messages_list_wins_over_message() {
        let body = br#"{"errorMessages":["first","second"],"message":"other"}"#;
        let e = classify_response(400, None, body, 60);
        assert_eq!(e.message, "first");
    }

    #[test]
    fn field_errors_carried_through() {
        let body = br#"{"message":"invalid","errors":{"summary":["is required"]}}"#;
        let e = classify_response(400, None, body, 60);
        let fields = e.field_errors.expect("field errors");
        assert_eq!(fields["summary"], vec!["is required".to_string()]);
    }

    #[test]
    fn unreadable_body_falls_back_to_unknown() {
        let e = classify_response(502, None, b"<html>bad gateway</html>", 60);
        assert_eq!(e.kind, ErrorKind::Server);
        assert_eq!(e.message, "Unknown error");
    }

    #[test]
    fn builder_error_is_request_construction() {
        let err = reqwest::Client::new()
            .get("http://[bad-host/")
            .build()
            .unwrap_err();
        let e = classify_transport(&err);
        assert_eq!(e.kind, ErrorKind::RequestConstruction);
        assert_eq!(e.status, 0);
    }
}
