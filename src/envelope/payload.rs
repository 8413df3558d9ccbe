//! Response envelope payloads and error-message synthesis.

use serde::Serialize;
use serde_json::Value;

use crate::pagination::PaginationOptions;
use crate::validator::ValidationError;

/// The standard response wrapper every schema-governed endpoint sends.
///
/// Invariants: `success == true` implies `error` is absent and
/// `validation_errors` is empty; `success == false` implies `payload` is
/// absent. The diagnostic fields are only populated when the server's own
/// output violated its declared response schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    pub payload: Option<T>,
    pub success: bool,
    pub error: Option<String>,
    pub validation_errors: Vec<ValidationError>,
    /// The response the route attempted to send, on a contract violation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    /// The schema the attempted response failed, on a contract violation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl<T> ResponseEnvelope<T> {
    /// Successful envelope around `payload`.
    pub fn success(payload: T) -> Self {
        Self {
            payload: Some(payload),
            success: true,
            error: None,
            validation_errors: Vec::new(),
            response_data: None,
            response_schema: None,
        }
    }

    /// Failure envelope with a combined message and the individual errors.
    pub fn failure(error: impl Into<String>, validation_errors: Vec<ValidationError>) -> Self {
        Self {
            payload: None,
            success: false,
            error: Some(error.into()),
            validation_errors,
            response_data: None,
            response_schema: None,
        }
    }
}

/// Message carried when the server's own output failed its declared schema.
pub const INVALID_API_RESPONSE_MESSAGE: &str =
    "Validating generated response against schema failed";

/// Page of items plus the bookkeeping fields clients need to paginate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPayload<T> {
    pub items: Vec<T>,
    pub item_count: i64,
    pub page: i64,
    pub page_count: i64,
    pub items_per_page: i64,
}

impl<T> PaginatedPayload<T> {
    /// Wrap `items` for the given page, computing
    /// `page_count = ceil(item_count / items_per_page)`.
    pub fn new(items: Vec<T>, options: &PaginationOptions, item_count: i64) -> Self {
        let items_per_page = options.items_per_page.max(1);
        Self {
            items,
            item_count,
            page: options.page,
            page_count: (item_count + items_per_page - 1) / items_per_page,
            items_per_page: options.items_per_page,
        }
    }
}

/// Join messages into one sentence: `""`, `"A"`, `"A and B"`, `"A, B and C"`.
#[must_use]
pub fn combine_messages(messages: &[String]) -> String {
    match messages {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

/// Strip the `#/` prefix from a JSON path for display. The bare root path
/// `#` becomes empty so root-level errors carry no path prefix.
fn format_json_path(json_path: &str) -> &str {
    match json_path.strip_prefix('#') {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => json_path,
    }
}

fn lower_case_first(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Synthesize a single human-readable sentence from validation errors.
#[must_use]
pub fn build_error_message(validation_errors: &[ValidationError]) -> String {
    let messages: Vec<String> = validation_errors
        .iter()
        .map(|error| {
            let path = format_json_path(&error.path);
            if path.is_empty() {
                lower_case_first(&error.message)
            } else {
                format!("{}: {}", path, lower_case_first(&error.message))
            }
        })
        .collect();
    format!("Validation failed: {}", combine_messages(&messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_combine_messages() {
        assert_eq!(combine_messages(&messages(&[])), "");
        assert_eq!(combine_messages(&messages(&["A"])), "A");
        assert_eq!(combine_messages(&messages(&["A", "B"])), "A and B");
        assert_eq!(combine_messages(&messages(&["A", "B", "C"])), "A, B and C");
        assert_eq!(
            combine_messages(&messages(&["A", "B", "C", "D"])),
            "A, B, C and D"
        );
    }

    #[test]
    fn test_build_error_message() {
        let errors = vec![
            ValidationError::new("Does not match the email format", "FORMAT", "#/email"),
            ValidationError::new("Too short", "MIN_LENGTH", "#/password"),
        ];
        assert_eq!(
            build_error_message(&errors),
            "Validation failed: email: does not match the email format and password: too short"
        );
    }

    #[test]
    fn test_build_error_message_without_path() {
        let errors = vec![ValidationError::new("Not an object", "TYPE", "#")];
        assert_eq!(build_error_message(&errors), "Validation failed: not an object");
    }

    #[test]
    fn test_paginated_payload_page_count() {
        let options = PaginationOptions { page: 2, items_per_page: 3 };
        let payload = PaginatedPayload::new(vec![1], &options, 4);
        assert_eq!(payload.page_count, 2);
        assert_eq!(payload.page, 2);
        assert_eq!(payload.items_per_page, 3);

        let empty: PaginatedPayload<i64> =
            PaginatedPayload::new(Vec::new(), &PaginationOptions { page: 1, items_per_page: 3 }, 0);
        assert_eq!(empty.page_count, 0);
    }

    #[test]
    fn test_success_envelope_invariants() {
        let envelope = ResponseEnvelope::success(serde_json::json!({ "id": 1 }));
        assert!(envelope.success);
        assert!(envelope.error.is_none());
        assert!(envelope.validation_errors.is_empty());
    }

    #[test]
    fn test_failure_envelope_invariants() {
        let envelope: ResponseEnvelope<Value> = ResponseEnvelope::failure("nope", Vec::new());
        assert!(!envelope.success);
        assert!(envelope.payload.is_none());
    }
}
