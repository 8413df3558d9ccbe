//! Schema validation: per-call compiled validators with pluggable custom
//! formats, plus a compiled-validator cache for custom-free schemas.

mod cache;
mod core;

pub use cache::ValidatorCache;
pub use core::{
    validate_json_schema, CustomValidator, FormatValidator, JsonSchemaValidationResult,
    ValidationError,
};

pub(crate) use core::collect_errors;
