//! Builders for the JSON schemas the response envelope is validated against.

use serde_json::{json, Value};

/// Wrap a payload schema in the standard envelope schema.
///
/// The resulting schema requires `payload`, `success`, `error` and
/// `validationErrors`, matching what [`super::ResponseEnvelope`] serializes.
#[must_use]
pub fn build_response_schema(payload_schema: Value) -> Value {
    json!({
        "title": "Response schema",
        "description": "Standard response schema envelope",
        "type": "object",
        "properties": {
            "payload": {
                "oneOf": [
                    { "type": "null" },
                    payload_schema
                ]
            },
            "success": {
                "title": "Success indicator",
                "description": "This is true if processing the request was successful and false if there were any issues",
                "type": "boolean"
            },
            "error": {
                "title": "Error message",
                "description": "Combined human-readable error message",
                "oneOf": [
                    { "type": "null" },
                    {
                        "title": "Error message",
                        "description": "Combined human-readable error message",
                        "type": "string"
                    }
                ]
            },
            "validationErrors": {
                "title": "Validation errors",
                "description": "List of validation errors (empty array if there were none)",
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "message": {
                            "title": "Message",
                            "description": "Validation error message",
                            "type": "string"
                        },
                        "code": {
                            "title": "Error code",
                            "description": "Validation error code",
                            "type": "string"
                        },
                        "params": {
                            "title": "Error parameters",
                            "description": "Validation error parameters",
                            "type": "array",
                            "items": {
                                "oneOf": [
                                    { "type": "null" },
                                    { "type": "string" },
                                    { "type": "number" }
                                ]
                            }
                        },
                        "path": {
                            "title": "Error path",
                            "description": "JSON path to the input parameter that failed the validation",
                            "type": "string"
                        },
                        "description": {
                            "title": "Parameter description",
                            "description": "Failed input parameter description",
                            "type": "string"
                        }
                    },
                    "required": ["message", "code", "params", "path"]
                }
            }
        },
        "required": ["payload", "success", "error", "validationErrors"]
    })
}

/// Wrap an items schema in the paginated payload schema, then in the envelope.
///
/// `payload_schema` describes the `items` array itself, so it should be an
/// array schema. The page bookkeeping fields are constrained alongside it.
#[must_use]
pub fn build_paginated_response_schema(payload_schema: Value, maximum_items_per_page: i64) -> Value {
    let title = payload_schema
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = payload_schema.get("description").cloned();
    let mut paginated = json!({
        "title": format!("{title} (paginated)"),
        "type": "object",
        "properties": {
            "items": payload_schema,
            "itemCount": {
                "title": "Item count",
                "description": "Total number of items",
                "type": "number",
                "minimum": 0
            },
            "page": {
                "title": "Page",
                "description": "Current page number",
                "type": "number",
                "minimum": 1
            },
            "pageCount": {
                "title": "Page count",
                "description": "Total number of pages",
                "type": "number",
                "minimum": 0
            },
            "itemsPerPage": {
                "title": "Items per page",
                "description": "Number of items on each page",
                "type": "number",
                "minimum": 1,
                "maximum": maximum_items_per_page
            }
        },
        "required": ["items", "itemCount", "page", "pageCount", "itemsPerPage"]
    });
    // a `description: null` key would make the schema itself invalid
    if let Some(description) = description {
        paginated["description"] = description;
    }
    build_response_schema(paginated)
}

/// Default upper bound for `itemsPerPage` in paginated response schemas.
pub const DEFAULT_MAXIMUM_ITEMS_PER_PAGE: i64 = 100;
