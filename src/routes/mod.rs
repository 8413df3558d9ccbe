//! Route identity, path manipulation, ordering and discovery contracts.

mod discover;
mod path;
mod sort;
mod types;

pub use discover::{route_group, route_name};
pub use path::{build_route_path, route_without_parameters};
pub use sort::{sort_routes, RouteKey};
pub use types::{
    RouteDefinition, RouteDescriptor, RouteMetadata, RouteSchema, RouteSetupFn, RouteSource,
    SchemaMetadata, ServiceSchema,
};
