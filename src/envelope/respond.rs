//! Per-request reply channel with envelope self-validation.
//!
//! Handlers never touch the HTTP connection. They receive a [`Responder`]
//! that serializes payloads into the standard envelope, validates the
//! envelope against the route's declared response schema, and ships the
//! result back to the service over a channel. A response that fails its own
//! schema is a server contract violation and is answered loudly with a 400
//! envelope carrying the offending data, the schema and the errors.

use may::sync::mpsc::Sender;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::pagination::PaginationOptions;
use crate::validator::{
    collect_errors, validate_json_schema, CustomValidator, JsonSchemaValidationResult,
    ValidationError, ValidatorCache,
};

use super::payload::{
    build_error_message, PaginatedPayload, ResponseEnvelope, INVALID_API_RESPONSE_MESSAGE,
};

/// One finished reply, ready for the service to write out.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeReply {
    pub status: u16,
    pub body: Value,
}

/// Single-use reply handle passed to every handler in a chain.
///
/// The underlying sender is consumed by the first send; any later send on the
/// same request logs a warning and does nothing.
pub struct Responder {
    reply_tx: Option<Sender<EnvelopeReply>>,
    cache: ValidatorCache,
    route_key: String,
}

impl Responder {
    pub(crate) fn new(
        reply_tx: Sender<EnvelopeReply>,
        cache: ValidatorCache,
        route_key: impl Into<String>,
    ) -> Self {
        Self {
            reply_tx: Some(reply_tx),
            cache,
            route_key: route_key.into(),
        }
    }

    /// Whether this request has already been answered.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.reply_tx.is_none()
    }

    /// Send a raw status and JSON body, outside the envelope contract.
    ///
    /// Escape hatch for ad-hoc handler responses such as 404 or 401.
    pub fn send(&mut self, status: u16, body: Value) {
        match self.reply_tx.take() {
            Some(tx) => {
                if tx.send(EnvelopeReply { status, body }).is_err() {
                    warn!(route = %self.route_key, "Reply receiver dropped before response was sent");
                }
            }
            None => {
                warn!(
                    route = %self.route_key,
                    status = status,
                    "Response already sent for this request, dropping extra reply"
                );
            }
        }
    }

    /// Validate an outgoing envelope, through the cache when no custom
    /// validators are in play.
    fn validate_envelope(
        &self,
        envelope: &Value,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<JsonSchemaValidationResult> {
        if custom_validators.is_empty() {
            let compiled = self
                .cache
                .get_or_compile(&self.route_key, "response", response_schema)
                .ok_or_else(|| {
                    anyhow::anyhow!("response schema for {} failed to compile", self.route_key)
                })?;
            let errors = collect_errors(&compiled, envelope);
            let is_valid = errors.is_empty();
            return Ok(JsonSchemaValidationResult { is_valid, errors });
        }
        validate_json_schema(envelope, response_schema, custom_validators)
    }

    fn send_validated(
        &mut self,
        status: u16,
        envelope: Value,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<()> {
        let result = self.validate_envelope(&envelope, response_schema, custom_validators)?;
        if !result.is_valid {
            warn!(
                route = %self.route_key,
                error_count = result.errors.len(),
                "Generated response failed its declared schema"
            );
            let violation = ResponseEnvelope::<Value> {
                payload: None,
                success: false,
                error: Some(INVALID_API_RESPONSE_MESSAGE.to_string()),
                validation_errors: result.errors,
                response_data: Some(envelope),
                response_schema: Some(response_schema.clone()),
            };
            self.send(400, serde_json::to_value(violation)?);
            return Ok(());
        }
        self.send(status, envelope);
        Ok(())
    }

    /// Send a successful envelope with an explicit status code.
    pub fn success_with_status<T: Serialize>(
        &mut self,
        payload: T,
        status: u16,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<()> {
        let envelope = serde_json::to_value(ResponseEnvelope::success(payload))?;
        self.send_validated(status, envelope, response_schema, custom_validators)
    }

    /// Send a 200 envelope around `payload`.
    pub fn success<T: Serialize>(
        &mut self,
        payload: T,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<()> {
        self.success_with_status(payload, 200, response_schema, custom_validators)
    }

    /// Send a 201 envelope around a newly created resource.
    pub fn created<T: Serialize>(
        &mut self,
        payload: T,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<()> {
        self.success_with_status(payload, 201, response_schema, custom_validators)
    }

    /// Send a 200 envelope around one page of items plus page bookkeeping.
    pub fn paginated_success<T: Serialize>(
        &mut self,
        items: Vec<T>,
        options: &PaginationOptions,
        item_count: i64,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
    ) -> anyhow::Result<()> {
        let payload = PaginatedPayload::new(items, options, item_count);
        self.success(payload, response_schema, custom_validators)
    }

    /// Send a 400 failure envelope carrying `validation_errors`.
    ///
    /// The combined message is synthesized from the errors unless
    /// `custom_error_message` overrides it.
    pub fn fail(
        &mut self,
        validation_errors: Vec<ValidationError>,
        response_schema: &Value,
        custom_validators: &[Arc<dyn CustomValidator>],
        custom_error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        let message = match custom_error_message {
            Some(message) => message.to_string(),
            None => build_error_message(&validation_errors),
        };
        let envelope =
            serde_json::to_value(ResponseEnvelope::<Value>::failure(message, validation_errors))?;
        self.send_validated(400, envelope, response_schema, custom_validators)
    }
}
