//! The standard response envelope: payload types, schema builders and the
//! per-request [`Responder`].

mod payload;
mod respond;
mod schema;

pub use payload::{
    build_error_message, combine_messages, PaginatedPayload, ResponseEnvelope,
    INVALID_API_RESPONSE_MESSAGE,
};
pub use respond::{EnvelopeReply, Responder};
pub use schema::{
    build_paginated_response_schema, build_response_schema, DEFAULT_MAXIMUM_ITEMS_PER_PAGE,
};
