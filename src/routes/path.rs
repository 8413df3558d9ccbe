//! Route path normalization.
//!
//! Endpoints are assembled from fragments (base path, group, route path) that
//! may carry stray or duplicated slashes. `build_route_path` folds such a
//! fragment list into one canonical path; `route_without_parameters` derives
//! the literal-only form used for schema introspection endpoints.

/// Join path fragments into a single canonical route path.
///
/// Empty and `"/"` fragments are skipped, runs of slashes collapse to one,
/// a single trailing slash is stripped, and an all-empty input yields `"/"`.
/// Idempotent: feeding the result back in returns it unchanged.
#[must_use]
pub fn build_route_path(segments: &[&str]) -> String {
    let mut path = String::new();
    for segment in segments {
        if segment.is_empty() || *segment == "/" {
            continue;
        }
        for part in segment.split('/') {
            if part.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(part);
        }
    }

    if path.is_empty() {
        path.push('/');
    }

    path
}

/// Strip `:param` segments from a route path.
///
/// Used to build schema endpoint paths, which must stay literal so they can
/// be matched exactly (`/users/:id` → `/users`).
#[must_use]
pub fn route_without_parameters(path: &str) -> String {
    let literal: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.starts_with(':'))
        .collect();
    literal.join("/")
}

/// Number of `/`-separated segments in a route path (`/` itself has depth 0).
pub(crate) fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Number of `:param` tokens in a route path.
pub(crate) fn parameter_count(path: &str) -> usize {
    path.split('/').filter(|s| s.starts_with(':')).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_segments() {
        assert_eq!(build_route_path(&["users", ":id"]), "/users/:id");
        assert_eq!(build_route_path(&["/users", "deleted"]), "/users/deleted");
    }

    #[test]
    fn test_empty_input_is_root() {
        assert_eq!(build_route_path(&[]), "/");
        assert_eq!(build_route_path(&["", "/"]), "/");
    }

    #[test]
    fn test_collapses_slash_runs() {
        assert_eq!(build_route_path(&["a", "//b///c", ""]), "/a/b/c");
    }

    #[test]
    fn test_strips_trailing_slash() {
        assert_eq!(build_route_path(&["users/"]), "/users");
        assert_eq!(build_route_path(&["users", "/"]), "/users");
    }

    #[test]
    fn test_idempotent() {
        for segments in [
            vec!["users", ":id"],
            vec!["a", "//b///c", ""],
            vec![],
            vec!["", "/"],
        ] {
            let once = build_route_path(&segments);
            let twice = build_route_path(&[once.as_str()]);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_route_without_parameters() {
        assert_eq!(route_without_parameters("/users/:id"), "/users");
        assert_eq!(route_without_parameters("/users/:id/posts/:post"), "/users/posts");
        assert_eq!(route_without_parameters("/users/deleted"), "/users/deleted");
    }

    #[test]
    fn test_depth_and_parameter_count() {
        assert_eq!(path_depth("/"), 0);
        assert_eq!(path_depth("/users/:id"), 2);
        assert_eq!(parameter_count("/users/:id"), 1);
        assert_eq!(parameter_count("/users/deleted"), 0);
    }
}
