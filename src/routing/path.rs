//! Path resolution from the location fragment.

/// Derive the logical path from a location fragment.
///
/// Accepts the raw fragment with or without its leading `#`. An empty
/// fragment resolves to `/`; a fragment without a leading slash gets one.
/// Query strings are kept.
pub fn resolve_path(hash: &str) -> String {
    let path = hash.strip_prefix('#').unwrap_or(hash);
    if path.is_empty() {
        return "/".to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// The part of a path before any `?`.
pub fn route_path(path: &str) -> &str {
    match path.split_once('?') {
        Some((route, _)) => route,
        None => path,
    }
}

/// The part of a path after the first `?`, if any.
pub fn query_string(path: &str) -> Option<&str> {
    path.split_once('?').map(|(_, query)| query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment_is_root() {
        assert_eq!(resolve_path(""), "/");
        assert_eq!(resolve_path("#"), "/");
    }

    #[test]
    fn test_strips_marker_and_keeps_query() {
        assert_eq!(resolve_path("#/dashboard"), "/dashboard");
        assert_eq!(resolve_path("#/assets/add?strategy=7"), "/assets/add?strategy=7");
        assert_eq!(resolve_path("/login"), "/login");
    }

    #[test]
    fn test_missing_slash_is_added() {
        assert_eq!(resolve_path("#dashboard"), "/dashboard");
    }

    #[test]
    fn test_route_and_query_split() {
        assert_eq!(route_path("/assets/add?strategy=7"), "/assets/add");
        assert_eq!(query_string("/assets/add?strategy=7"), Some("strategy=7"));
        assert_eq!(route_path("/assets"), "/assets");
        assert_eq!(query_string("/assets"), None);
    }
}
