//! JSON Schema validation with per-call custom format validators.
//!
//! Every call compiles its own engine instance with the call's custom
//! validators baked in as `format` keywords. The format registry therefore
//! lives and dies with the call: two concurrent validations using the same
//! format name with different predicates cannot observe each other. All
//! failing constraints are collected, never just the first.

use anyhow::anyhow;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// A named format predicate pluggable into schema validation.
///
/// The validator contributes a JSON-Schema `format` keyword value for the
/// duration of a single [`validate_json_schema`] call. Predicates may block
/// the calling coroutine (a data-store lookup is typical). A predicate that
/// returns `Err` or panics counts as a failed format, never as a pass.
pub trait CustomValidator: Send + Sync {
    /// Format name as referenced by schemas (`"format": "unique-email"`)
    fn name(&self) -> &str;
    /// Check one string instance against the format
    fn validate(&self, value: &str) -> anyhow::Result<bool>;
}

/// [`CustomValidator`] built from a name and a closure.
pub struct FormatValidator<F> {
    name: String,
    predicate: F,
}

impl<F> FormatValidator<F>
where
    F: Fn(&str) -> anyhow::Result<bool> + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> CustomValidator for FormatValidator<F>
where
    F: Fn(&str) -> anyhow::Result<bool> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &str) -> anyhow::Result<bool> {
        (self.predicate)(value)
    }
}

/// A single failed constraint, re-exposed verbatim in response envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Human-readable description of the failure
    pub message: String,
    /// Failing schema keyword in UPPER_SNAKE form (`FORMAT`, `MIN_LENGTH`, ...)
    pub code: String,
    /// Error parameters (strings, numbers or nulls)
    pub params: Vec<Value>,
    /// JSON path to the offending input value (`#/email`)
    pub path: String,
}

impl ValidationError {
    pub fn new(
        message: impl Into<String>,
        code: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: Vec::new(),
            path: path.into(),
        }
    }
}

/// Outcome of one validation call. `errors` is always present, empty on
/// success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchemaValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Derive an error code from the failing keyword at the end of a schema path
/// (`/properties/email/format` → `FORMAT`, `minLength` → `MIN_LENGTH`).
fn keyword_code(schema_path: &str) -> String {
    let keyword = schema_path
        .rsplit('/')
        .find(|s| !s.is_empty() && !s.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("schema");
    let mut code = String::with_capacity(keyword.len() + 4);
    for ch in keyword.chars() {
        if ch.is_ascii_uppercase() {
            code.push('_');
        }
        code.push(ch.to_ascii_uppercase());
    }
    code
}

/// Compile `schema` with the given custom validators registered as formats.
///
/// Fails only on an invalid schema, which is a programmer error rather than a
/// validation outcome.
pub(crate) fn compile_schema(
    schema: &Value,
    custom_validators: &[Arc<dyn CustomValidator>],
) -> anyhow::Result<JSONSchema> {
    let mut options = JSONSchema::options();
    options.should_validate_formats(true);
    for validator in custom_validators {
        let format = Arc::clone(validator);
        let format_name = validator.name().to_string();
        options.with_format(format_name.clone(), move |value: &str| {
            match std::panic::catch_unwind(AssertUnwindSafe(|| format.validate(value))) {
                Ok(Ok(valid)) => valid,
                Ok(Err(error)) => {
                    warn!(
                        format = %format.name(),
                        error = %error,
                        "Custom format validator failed, treating value as invalid"
                    );
                    false
                }
                Err(_) => {
                    warn!(
                        format = %format.name(),
                        "Custom format validator panicked, treating value as invalid"
                    );
                    false
                }
            }
        });
    }
    options
        .compile(schema)
        .map_err(|e| anyhow!("failed to compile JSON schema: {e}"))
}

/// Run a compiled validator and collect every failing constraint.
pub(crate) fn collect_errors(compiled: &JSONSchema, data: &Value) -> Vec<ValidationError> {
    match compiled.validate(data) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| ValidationError {
                message: e.to_string(),
                code: keyword_code(&e.schema_path.to_string()),
                params: Vec::new(),
                path: format!("#{}", e.instance_path),
            })
            .collect(),
    }
}

/// Validate `data` against `schema`, with `custom_validators` available as
/// `format` keyword values for this call only.
///
/// Returns `Err` only when the schema itself does not compile. A failed
/// custom validator (error or panic) marks the value invalid instead of
/// propagating.
pub fn validate_json_schema(
    data: &Value,
    schema: &Value,
    custom_validators: &[Arc<dyn CustomValidator>],
) -> anyhow::Result<JsonSchemaValidationResult> {
    let compiled = compile_schema(schema, custom_validators)?;
    let errors = collect_errors(&compiled, data);
    let is_valid = errors.is_empty();
    debug!(
        is_valid = is_valid,
        error_count = errors.len(),
        custom_formats = custom_validators.len(),
        "Schema validation completed"
    );
    Ok(JsonSchemaValidationResult { is_valid, errors })
}
