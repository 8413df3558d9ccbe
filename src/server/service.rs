use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

use super::request::{parse_request, ParsedRequest};
use super::response::{write_json, write_json_error};
use crate::dispatcher::{Dispatcher, HeaderVec, RouteRequest};
use crate::registrar::RegisteredRoute;
use crate::routes::{build_route_path, RouteDescriptor, SchemaMetadata, ServiceSchema};

/// The HTTP service: schema introspection endpoints plus sorted first-match
/// routing into the dispatcher.
///
/// Built by [`crate::registrar::build_service`]. Cloning is cheap; clones
/// share the routing table and dispatcher, which is how `may_minihttp` hands
/// one service instance to each connection.
#[derive(Clone)]
pub struct SchemaService {
    routes: Arc<Vec<RegisteredRoute>>,
    dispatcher: Arc<Dispatcher>,
    /// Per-route schema endpoints keyed by their full GET path
    schema_endpoints: Arc<HashMap<String, Arc<RouteDescriptor>>>,
    metadata: SchemaMetadata,
    base_path: String,
    aggregate_schema_path: String,
}

impl SchemaService {
    pub(crate) fn new(
        routes: Vec<RegisteredRoute>,
        dispatcher: Dispatcher,
        schema_endpoints: HashMap<String, Arc<RouteDescriptor>>,
        metadata: SchemaMetadata,
        base_path: String,
    ) -> Self {
        let aggregate_schema_path = build_route_path(&[&base_path, "schema"]);
        Self {
            routes: Arc::new(routes),
            dispatcher: Arc::new(dispatcher),
            schema_endpoints: Arc::new(schema_endpoints),
            metadata,
            base_path,
            aggregate_schema_path,
        }
    }

    /// Registered endpoints in match order
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|route| route.descriptor.endpoint.clone())
            .collect()
    }

    /// Aggregate schema document listing every grouped route.
    ///
    /// Recomputed per request so URLs always reflect the current base path.
    #[must_use]
    pub fn service_schema(&self) -> ServiceSchema {
        ServiceSchema {
            metadata: self.metadata.clone(),
            routes: self
                .routes
                .iter()
                .filter(|route| !route.descriptor.group.is_empty())
                .map(|route| route.descriptor.schema(&self.base_path))
                .collect(),
        }
    }

    fn to_header_vec(map: &HashMap<String, String>) -> HeaderVec {
        map.iter()
            .map(|(k, v)| (Arc::from(k.as_str()), v.clone()))
            .collect()
    }
}

impl fmt::Debug for SchemaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaService")
            .field("routes", &self.endpoints())
            .field("schema_endpoint_count", &self.schema_endpoints.len())
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl HttpService for SchemaService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ParsedRequest {
            method,
            path,
            headers,
            cookies,
            query_params,
            body,
        } = parse_request(req);

        let method = match method.parse::<Method>() {
            Ok(method) => method,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "Unsupported method" }));
                return Ok(());
            }
        };

        if method == Method::GET {
            if path == self.aggregate_schema_path {
                match serde_json::to_value(self.service_schema()) {
                    Ok(schema) => write_json(res, 200, &schema),
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize aggregate schema");
                        write_json_error(res, 500, json!({ "error": "Internal server error" }));
                    }
                }
                return Ok(());
            }
            if let Some(descriptor) = self.schema_endpoints.get(&path) {
                match serde_json::to_value(descriptor.schema(&self.base_path)) {
                    Ok(schema) => write_json(res, 200, &schema),
                    Err(e) => {
                        warn!(error = %e, route = %descriptor.route_key(), "Failed to serialize route schema");
                        write_json_error(res, 500, json!({ "error": "Internal server error" }));
                    }
                }
                return Ok(());
            }
        }

        // First match wins: routes are pre-sorted so literal paths win over
        // parameterized ones.
        let matched = self.routes.iter().find_map(|route| {
            if route.descriptor.method != method {
                return None;
            }
            route
                .matcher
                .captures(&path)
                .map(|params| (route, params))
        });

        let Some((route, path_params)) = matched else {
            debug!(method = %method, path = %path, "No route matched");
            write_json_error(
                res,
                404,
                json!({ "error": "Not Found", "method": method.as_str(), "path": path }),
            );
            return Ok(());
        };

        let request = RouteRequest {
            method,
            path: path.clone(),
            path_params,
            query_params,
            headers: Self::to_header_vec(&headers),
            cookies: Self::to_header_vec(&cookies),
            body,
        };

        match self.dispatcher.dispatch(&route.descriptor.route_key(), request) {
            Some(reply) => write_json(res, reply.status, &reply.body),
            None => {
                write_json_error(
                    res,
                    500,
                    json!({
                        "error": "Handler failed or not registered",
                        "path": path
                    }),
                );
            }
        }
        Ok(())
    }
}
