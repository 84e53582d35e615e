//! Route path helpers shared by the web-framework extractors.

use std::path::Path;

use super::naming::{singularize, to_pascal_case};
use crate::adapters::lexer::unquote;
use crate::adapters::Node;
use crate::model::{ActionParameter, ParamLocation};

/// Value of a string literal node: `'x'`, `"x"`, `` `x` ``, or Python
/// prefixed strings such as `r"x"`. Template strings with substitutions
/// are rejected.
pub fn string_value(node: Node<'_>) -> Option<String> {
    let text = node.text().trim();
    let text = text.trim_start_matches(|c: char| matches!(c, 'r' | 'b' | 'u' | 'f' | 'R' | 'B' | 'U' | 'F'));
    if let Some(inner) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        return (!inner.contains("${")).then(|| inner.to_string());
    }
    if let Some(inner) = text
        .strip_prefix("\"\"\"")
        .and_then(|t| t.strip_suffix("\"\"\""))
    {
        return Some(inner.to_string());
    }
    let first = text.chars().next()?;
    if (first == '\'' || first == '"') && text.len() >= 2 && text.ends_with(first) {
        return Some(unquote(text).replace("\\'", "'").replace("\\\"", "\""));
    }
    None
}

/// Rewrite `:id`, `<id>`, `<int:id>`, and `[id]` segments as `{id}`.
pub fn normalize_path(path: &str) -> String {
    let normalized: Vec<String> = path
        .split('/')
        .map(|segment| {
            let param = segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')))
                .or_else(|| segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')));
            match param {
                Some(name) => {
                    let name = name.rsplit(':').next().unwrap_or(name).trim_start_matches("...");
                    format!("{{{name}}}")
                }
                None => segment.to_string(),
            }
        })
        .collect();
    normalized.join("/")
}

/// Join a prefix and a route path with exactly one `/` between them.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => {
            if prefix.starts_with('/') {
                prefix.to_string()
            } else {
                format!("/{prefix}")
            }
        }
        (false, false) => {
            let joined = format!("{prefix}/{path}");
            if joined.starts_with('/') {
                joined
            } else {
                format!("/{joined}")
            }
        }
    }
}

/// `{name}` segments of a normalized path as path parameters.
pub fn path_parameters(path: &str) -> Vec<ActionParameter> {
    normalize_path(path)
        .split('/')
        .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .map(|name| ActionParameter::new(name, None, ParamLocation::Path))
        .collect()
}

/// Name for an anonymous route handler: the lowercase verb followed by the
/// literal path segments, e.g. `GET /api/users/{id}` to `getApiUsers`.
pub fn generated_action_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && !s.starts_with(['{', ':', '<', '[']))
        .collect();
    let mut name = method.to_ascii_lowercase();
    for (i, segment) in segments.iter().enumerate() {
        let word = if i + 1 == segments.len() && path_has_trailing_param(path) {
            singularize(segment)
        } else {
            segment.to_string()
        };
        name.push_str(&to_pascal_case(&word));
    }
    name
}

fn path_has_trailing_param(path: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|s| s.starts_with(['{', ':', '<', '[']))
}

/// Forward-slash form of a path, for directory-convention routing.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_styles() {
        assert_eq!(normalize_path("/users/:id"), "/users/{id}");
        assert_eq!(normalize_path("/users/<int:user_id>"), "/users/{user_id}");
        assert_eq!(normalize_path("/posts/[slug]"), "/posts/{slug}");
        assert_eq!(normalize_path("/docs/[...path]"), "/docs/{path}");
        assert_eq!(normalize_path("/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api/users", "/{id}"), "/api/users/{id}");
        assert_eq!(join_paths("/api/", ""), "/api");
        assert_eq!(join_paths("", "items"), "/items");
        assert_eq!(join_paths("", ""), "/");
    }

    #[test]
    fn test_path_parameters() {
        let params = path_parameters("/orgs/:org/users/<id>");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["org", "id"]);
        assert!(params.iter().all(|p| p.location == ParamLocation::Path));
    }

    #[test]
    fn test_generated_action_name() {
        assert_eq!(generated_action_name("GET", "/users"), "getUsers");
        assert_eq!(generated_action_name("DELETE", "/api/users/:id"), "deleteApiUser");
        assert_eq!(generated_action_name("post", "/"), "post");
    }
}
