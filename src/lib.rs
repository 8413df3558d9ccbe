//! # schemaroute
//!
//! **schemaroute** is a schema-driven route registration and validation
//! engine for coroutine-based HTTP services built on `may_minihttp`.
//!
//! Route modules declare themselves as [`routes::RouteSource`]s: an identity
//! (group, name, filename) plus a deferred `setup` factory producing a
//! [`routes::RouteDefinition`] with path, method, metadata, JSON Schemas and
//! a handler chain. [`registrar::build_service`] resolves every source once,
//! sorts routes so literal paths win over parameterized ones, spawns one
//! coroutine per route and returns a [`server::SchemaService`] ready to run.
//!
//! Every service gets introspection for free: `GET /schema` lists all
//! grouped routes and each grouped route exposes its own document at
//! `GET /schema/<group>/<path>/<method>`.
//!
//! ## Architecture
//!
//! - **[`routes`]** - Route identity, path normalization, ordering and
//!   discovery contracts
//! - **[`registrar`]** - Service construction from route sources
//! - **[`dispatcher`]** - Coroutine-based handler chain dispatch
//! - **[`server`]** - HTTP service and server wrapper on `may_minihttp`
//! - **[`envelope`]** - The standard response envelope and its self-validating
//!   [`envelope::Responder`]
//! - **[`validator`]** - JSON Schema validation with per-call custom format
//!   validators and a compiled-validator cache
//! - **[`pagination`]** - Pagination query parsing and its schema
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use schemaroute::dispatcher::{HandlerFlow, RouteRequest};
//! use schemaroute::envelope::{build_response_schema, Responder};
//! use schemaroute::registrar::{build_service, SchemaServerOptions};
//! use schemaroute::routes::{RouteDefinition, RouteSource, SchemaMetadata};
//! use schemaroute::server::HttpServer;
//! use serde_json::json;
//!
//! let routes = vec![RouteSource::new("users", "get-users", "users/get-users.rs", || {
//!     let schema = build_response_schema(json!({ "type": "array" }));
//!     Ok(RouteDefinition::new("/")
//!         .response_schema(schema.clone())
//!         .handler(move |_req: &RouteRequest, _ctx: &(), res: &mut Responder| -> anyhow::Result<HandlerFlow> {
//!             res.success(json!([]), &schema, &[])?;
//!             Ok(HandlerFlow::Done)
//!         }))
//! })];
//!
//! let service = build_service(SchemaServerOptions {
//!     routes,
//!     context: Arc::new(()),
//!     metadata: SchemaMetadata::default(),
//!     base_path: String::new(),
//! }).unwrap();
//!
//! let handle = HttpServer(service).start("0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```

pub mod dispatcher;
pub mod envelope;
pub mod pagination;
pub mod registrar;
pub mod routes;
pub mod runtime_config;
pub mod server;
pub mod validator;

pub use dispatcher::{Dispatcher, HandlerFlow, RouteHandler, RouteRequest};
pub use envelope::{PaginatedPayload, Responder, ResponseEnvelope};
pub use pagination::{pagination_page_options, PaginationOptions};
pub use registrar::{build_service, SchemaServerOptions};
pub use routes::{RouteDefinition, RouteDescriptor, RouteSource, SchemaMetadata};
pub use server::{HttpServer, SchemaService, ServerHandle};
pub use validator::{validate_json_schema, CustomValidator, ValidationError};
