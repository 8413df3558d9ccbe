//! Filename-derived route identity.
//!
//! Walking the filesystem for route modules is the host application's job;
//! this module only fixes how a module's location maps to a route's group
//! and name, so every application derives the same identity for the same
//! layout.

use std::path::Path;

use super::types::{RouteDefinition, RouteSource};

/// Group of a route module: the name of its parent directory, relative to
/// the route base directory. A module sitting directly in the base directory
/// has an empty group.
#[must_use]
pub fn route_group(filename: &str, base_directory: &str) -> String {
    let relative = Path::new(filename)
        .strip_prefix(base_directory)
        .unwrap_or_else(|_| Path::new(filename));
    relative
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Name of a route module: its file stem.
#[must_use]
pub fn route_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

impl<C> RouteSource<C> {
    /// Source with group and name derived from the module's location.
    pub fn from_file(
        base_directory: &str,
        filename: &str,
        setup: impl FnOnce() -> anyhow::Result<RouteDefinition<C>> + Send + 'static,
    ) -> Self {
        Self::new(
            route_group(filename, base_directory),
            route_name(filename),
            filename,
            setup,
        )
    }
}
