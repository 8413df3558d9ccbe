//! Pagination query parsing.
//!
//! Query strings arrive as loose text; this module coerces them into
//! [`PaginationOptions`] with defaults applied. Bounds checking is
//! deliberately left to schema validation: callers validate the parsed
//! options against [`pagination_options_schema`] so that `page=0` or a
//! negative count is reported as a structured validation failure rather
//! than silently clamped.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Normalized pagination parameters for a list request.
///
/// Values below 1 survive parsing on purpose; reject them by validating
/// against [`pagination_options_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    /// Requested page number (1-based)
    pub page: i64,
    /// Number of items on a single page
    pub items_per_page: i64,
}

/// Trim and numerically coerce one raw query value.
fn normalize_numeric(raw: Option<&String>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Extract pagination options from raw query parameters.
///
/// `page` defaults to 1, `itemsPerPage` to `default_items_per_page`, when the
/// parameter is absent or not numeric. No bounds validation happens here.
#[must_use]
pub fn pagination_page_options(
    query: &HashMap<String, String>,
    default_items_per_page: i64,
) -> PaginationOptions {
    PaginationOptions {
        page: normalize_numeric(query.get("page")).unwrap_or(1),
        items_per_page: normalize_numeric(query.get("itemsPerPage"))
            .unwrap_or(default_items_per_page),
    }
}

/// JSON Schema for [`PaginationOptions`]: both fields optional numbers with
/// `minimum: 1`.
#[must_use]
pub fn pagination_options_schema() -> Value {
    json!({
        "title": "Pagination options",
        "description": "Paginated request options",
        "type": "object",
        "properties": {
            "page": {
                "title": "Page",
                "description": "Page number",
                "type": "number",
                "minimum": 1,
                "default": 1
            },
            "itemsPerPage": {
                "title": "Items per page",
                "description": "Number of items to show on a single page",
                "type": "number",
                "minimum": 1,
                "default": 10
            }
        }
    })
}
