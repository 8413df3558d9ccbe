//! Service construction: resolve route sources, sort, compile matchers,
//! spawn route coroutines and wire up the schema endpoints.

use anyhow::Context as _;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::{Dispatcher, ParamVec, RouteHandler};
use crate::routes::{
    build_route_path, sort_routes, RouteDescriptor, RouteKey, RouteSource, SchemaMetadata,
};
use crate::runtime_config::RuntimeConfig;
use crate::server::SchemaService;
use crate::validator::ValidatorCache;

/// Everything needed to assemble a schema-driven service.
pub struct SchemaServerOptions<C> {
    /// Route sources, resolved once during construction
    pub routes: Vec<RouteSource<C>>,
    /// Shared application context handed to every handler
    pub context: Arc<C>,
    /// Service metadata shown by the aggregate schema endpoint
    pub metadata: SchemaMetadata,
    /// Path prefix all endpoints live under, empty for the root
    pub base_path: String,
}

/// Compiled matcher for one endpoint. `:name` segments become capture
/// groups; everything else matches literally.
pub(crate) struct RouteMatcher {
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl RouteMatcher {
    pub(crate) fn compile(endpoint: &str) -> anyhow::Result<Self> {
        let mut pattern = String::from("^");
        let mut param_names = Vec::new();
        for segment in endpoint.split('/').filter(|s| !s.is_empty()) {
            pattern.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                pattern.push_str("([^/]+)");
                param_names.push(Arc::from(name));
            } else {
                pattern.push_str(&regex::escape(segment));
            }
        }
        if pattern == "^" {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern)
            .with_context(|| format!("invalid matcher pattern for endpoint {endpoint}"))?;
        Ok(Self { regex, param_names })
    }

    /// Match a request path, returning the extracted path parameters.
    pub(crate) fn captures(&self, path: &str) -> Option<ParamVec> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (index, name) in self.param_names.iter().enumerate() {
            if let Some(value) = captures.get(index + 1) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(params)
    }
}

/// A descriptor plus its compiled matcher, held by the service in match
/// order.
pub(crate) struct RegisteredRoute {
    pub(crate) descriptor: Arc<RouteDescriptor>,
    pub(crate) matcher: RouteMatcher,
}

struct ResolvedRoute<C> {
    descriptor: RouteDescriptor,
    handlers: Vec<Arc<dyn RouteHandler<C>>>,
}

impl<C> RouteKey for ResolvedRoute<C> {
    fn group(&self) -> &str {
        &self.descriptor.group
    }

    fn path(&self) -> &str {
        &self.descriptor.path
    }
}

/// Resolve every route source and assemble the HTTP service.
///
/// Each source's `setup` runs exactly once; an error from any of them is a
/// configuration problem and aborts construction. Routes are sorted before
/// registration so literal paths are matched ahead of parameterized ones.
pub fn build_service<C: Send + Sync + 'static>(
    options: SchemaServerOptions<C>,
) -> anyhow::Result<SchemaService> {
    let config = RuntimeConfig::from_env();
    let SchemaServerOptions {
        routes,
        context,
        metadata,
        base_path,
    } = options;

    let mut resolved = Vec::with_capacity(routes.len());
    for source in routes {
        let RouteSource {
            group,
            name,
            filename,
            setup,
        } = source;
        let definition =
            setup().with_context(|| format!("route setup failed for {filename}"))?;
        let endpoint = build_route_path(&[&base_path, &group, &definition.path]);
        debug!(
            group = %group,
            name = %name,
            method = %definition.method,
            endpoint = %endpoint,
            handler_count = definition.handlers.len(),
            "Route source resolved"
        );
        resolved.push(ResolvedRoute {
            descriptor: RouteDescriptor {
                group,
                name,
                filename,
                path: definition.path,
                method: definition.method,
                metadata: definition.metadata,
                request_schema: definition.request_schema,
                response_schema: definition.response_schema,
                endpoint,
            },
            handlers: definition.handlers,
        });
    }

    sort_routes(&mut resolved);

    let cache = ValidatorCache::new(config.schema_cache_enabled);
    let mut dispatcher = Dispatcher::new();
    let mut registered = Vec::with_capacity(resolved.len());
    let mut schema_endpoints = HashMap::new();

    for route in resolved {
        let ResolvedRoute {
            descriptor,
            handlers,
        } = route;
        let descriptor = Arc::new(descriptor);
        // SAFETY: coroutine spawn happens during service construction, before
        // the server starts accepting connections.
        unsafe {
            dispatcher.register_route(
                &descriptor.route_key(),
                handlers,
                Arc::clone(&context),
                cache.clone(),
                config.stack_size,
            )?;
        }
        let matcher = RouteMatcher::compile(&descriptor.endpoint)?;
        if !descriptor.group.is_empty() {
            // Parameterized routes collapse onto the same schema path as their
            // literal siblings (`/users/:id` -> `/schema/users/get`); the first
            // route in match order keeps the slot.
            schema_endpoints
                .entry(descriptor.schema_path(&base_path))
                .or_insert_with(|| Arc::clone(&descriptor));
        }
        registered.push(RegisteredRoute { descriptor, matcher });
    }

    info!(
        route_count = registered.len(),
        schema_endpoint_count = schema_endpoints.len(),
        base_path = %base_path,
        "Schema service built"
    );

    Ok(SchemaService::new(
        registered,
        dispatcher,
        schema_endpoints,
        metadata,
        base_path,
    ))
}
