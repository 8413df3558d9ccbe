//! Route identity, definition and schema projection types.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::dispatcher::RouteHandler;
use crate::routes::path::{build_route_path, route_without_parameters};
use crate::routes::sort::RouteKey;

/// Descriptive metadata attached to a single route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetadata {
    pub title: String,
    pub description: String,
    pub since_version: String,
    pub is_deprecated: bool,
}

/// Descriptive metadata for the whole service, shown by the aggregate schema
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    pub title: String,
    pub description: String,
    pub version: String,
}

/// Everything a route declares about itself: path, method, metadata, the
/// request and response schemas, and the handler chain.
pub struct RouteDefinition<C> {
    /// Path relative to the route's group, `:name` segments are parameters
    pub path: String,
    pub method: Method,
    pub metadata: RouteMetadata,
    pub request_schema: Value,
    pub response_schema: Value,
    pub handlers: Vec<Arc<dyn RouteHandler<C>>>,
}

impl<C> RouteDefinition<C> {
    /// Definition with the given path and a GET method; fill the rest via
    /// the builder methods or struct update.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            metadata: RouteMetadata::default(),
            request_schema: Value::Null,
            response_schema: Value::Null,
            handlers: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: RouteMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn request_schema(mut self, schema: Value) -> Self {
        self.request_schema = schema;
        self
    }

    #[must_use]
    pub fn response_schema(mut self, schema: Value) -> Self {
        self.response_schema = schema;
        self
    }

    /// Append a handler to the chain
    #[must_use]
    pub fn handler(mut self, handler: impl RouteHandler<C> + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }
}

impl<C> fmt::Debug for RouteDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("metadata", &self.metadata)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

/// Deferred definition factory for setup failures that should abort service
/// construction rather than surface per request.
pub type RouteSetupFn<C> = Box<dyn FnOnce() -> anyhow::Result<RouteDefinition<C>> + Send>;

/// A discovered route module: identity plus a definition factory.
///
/// `setup` is consumed exactly once while the service is built.
pub struct RouteSource<C> {
    /// Directory-derived group, empty for ungrouped routes
    pub group: String,
    /// File-derived route name
    pub name: String,
    /// Originating module filename, for diagnostics
    pub filename: String,
    pub setup: RouteSetupFn<C>,
}

impl<C> RouteSource<C> {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        filename: impl Into<String>,
        setup: impl FnOnce() -> anyhow::Result<RouteDefinition<C>> + Send + 'static,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            filename: filename.into(),
            setup: Box::new(setup),
        }
    }
}

impl<C> fmt::Debug for RouteSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSource")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Flattened source identity and resolved definition, minus the handlers.
///
/// Immutable once built; shared between the matcher and the schema
/// endpoints.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub group: String,
    pub name: String,
    pub filename: String,
    pub path: String,
    pub method: Method,
    pub metadata: RouteMetadata,
    pub request_schema: Value,
    pub response_schema: Value,
    /// Full match path: base path + group + route path
    pub endpoint: String,
}

impl RouteDescriptor {
    /// Dispatch key, unique per method and endpoint
    #[must_use]
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }

    /// Path of this route's schema endpoint, relative to the base path
    #[must_use]
    pub fn schema_path(&self, base_path: &str) -> String {
        let endpoint_path = build_route_path(&[&self.group, &self.path]);
        build_route_path(&[
            base_path,
            "schema",
            &route_without_parameters(&endpoint_path),
            &lowercase_method(&self.method),
        ])
    }

    /// Project the descriptor into its wire-facing schema representation.
    ///
    /// Recomputed per request so the URLs always reflect the base the client
    /// reached us through.
    #[must_use]
    pub fn schema(&self, base_url: &str) -> RouteSchema {
        let endpoint_path = build_route_path(&[&self.group, &self.path]);
        let method = lowercase_method(&self.method);
        RouteSchema {
            endpoint_url: build_route_path(&[base_url, &endpoint_path]),
            schema_url: build_route_path(&[
                base_url,
                "schema",
                &route_without_parameters(&endpoint_path),
                &method,
            ]),
            method,
            group: self.group.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            metadata: self.metadata.clone(),
            request_schema: self.request_schema.clone(),
            response_schema: self.response_schema.clone(),
        }
    }
}

impl RouteKey for RouteDescriptor {
    fn group(&self) -> &str {
        &self.group
    }

    fn path(&self) -> &str {
        &self.path
    }
}

fn lowercase_method(method: &Method) -> String {
    method.as_str().to_ascii_lowercase()
}

/// Wire representation of one route in the schema endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSchema {
    pub method: String,
    pub group: String,
    pub name: String,
    pub path: String,
    pub endpoint_url: String,
    pub schema_url: String,
    pub metadata: RouteMetadata,
    pub request_schema: Value,
    pub response_schema: Value,
}

/// Aggregate schema listing every grouped route in the service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchema {
    pub metadata: SchemaMetadata,
    pub routes: Vec<RouteSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> RouteDescriptor {
        RouteDescriptor {
            group: "users".to_string(),
            name: "get-user".to_string(),
            filename: "users/get-user.rs".to_string(),
            path: "/:id".to_string(),
            method: Method::GET,
            metadata: RouteMetadata {
                title: "Get user".to_string(),
                description: "Fetch a single user by id".to_string(),
                since_version: "1.0.0".to_string(),
                is_deprecated: false,
            },
            request_schema: json!({}),
            response_schema: json!({}),
            endpoint: "/users/:id".to_string(),
        }
    }

    #[test]
    fn test_route_key() {
        assert_eq!(descriptor().route_key(), "GET /users/:id");
    }

    #[test]
    fn test_schema_projection_urls() {
        let schema = descriptor().schema("/v1");
        assert_eq!(schema.method, "get");
        assert_eq!(schema.endpoint_url, "/v1/users/:id");
        assert_eq!(schema.schema_url, "/v1/schema/users/get");
        assert_eq!(schema.path, "/:id");
    }

    #[test]
    fn test_schema_projection_without_base() {
        let schema = descriptor().schema("");
        assert_eq!(schema.endpoint_url, "/users/:id");
        assert_eq!(schema.schema_url, "/schema/users/get");
    }

    #[test]
    fn test_schema_path() {
        assert_eq!(descriptor().schema_path(""), "/schema/users/get");
        assert_eq!(descriptor().schema_path("/v1"), "/v1/schema/users/get");
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let value = serde_json::to_value(descriptor().schema("")).unwrap();
        assert!(value.get("endpointUrl").is_some());
        assert!(value.get("schemaUrl").is_some());
        assert!(value.get("requestSchema").is_some());
        assert_eq!(value["metadata"]["sinceVersion"], json!("1.0.0"));
        assert_eq!(value["metadata"]["isDeprecated"], json!(false));
    }

    #[test]
    fn test_definition_builder() {
        let definition: RouteDefinition<()> = RouteDefinition::new("/:id")
            .method(Method::DELETE)
            .request_schema(json!({ "type": "object" }));
        assert_eq!(definition.method, Method::DELETE);
        assert_eq!(definition.path, "/:id");
        assert!(definition.handlers.is_empty());
    }
}
