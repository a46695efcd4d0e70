//! Helper functions shared by handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Parse a 1-based gallery index. Zero, negatives and non-numbers are rejected.
pub fn parse_index(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|i| *i > 0)
}

/// Interpret a query flag such as `?refresh=true`.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// JSON `{ "error": message }` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// The 400 returned for an index that is not a positive integer.
pub fn invalid_index(raw: &str) -> Response {
    json_error(
        StatusCode::BAD_REQUEST,
        format!("Invalid index '{}': must be a positive integer", raw),
    )
}
