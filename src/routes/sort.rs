//! Route ordering for first-match-wins registration.
//!
//! The underlying server tries routes in registration order, so a
//! parameterized route registered early (`/:id`) would shadow a literal route
//! registered later (`/deleted`). Sorting descriptors before registration
//! keeps literal and deeper paths ahead of parameterized ones within each
//! group.

use super::path::{parameter_count, path_depth};

/// Minimal view of a route the sorter needs: its group and relative path.
pub trait RouteKey {
    fn group(&self) -> &str;
    fn path(&self) -> &str;
}

/// Order routes so literal and deeper paths precede parameterized ones.
///
/// Two stable passes:
/// 1. across the whole slice, descending path depth, ties broken by ascending
///    `:param` count;
/// 2. ascending lexical group.
///
/// Net effect: groups in lexical order; within a group, deeper and
/// less-parameterized paths first, original order otherwise preserved. This
/// is a heuristic: a literal segment nested beneath a parameterized prefix
/// (`/:org/settings` vs `/all/:id`) is not guaranteed optimal ordering.
pub fn sort_routes<R: RouteKey>(routes: &mut [R]) {
    routes.sort_by(|a, b| {
        path_depth(b.path())
            .cmp(&path_depth(a.path()))
            .then_with(|| parameter_count(a.path()).cmp(&parameter_count(b.path())))
    });
    routes.sort_by(|a, b| a.group().cmp(b.group()));
}
