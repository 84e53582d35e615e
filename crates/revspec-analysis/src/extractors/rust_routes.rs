//! Text-pattern route discovery for Rust router builders.
//!
//! Builder chains (`web::scope(..).service(..)`, `Router::new().route(..)`,
//! `warp::path!(..)`, `app.at(..)`) are plain method calls, so the grammar
//! gives no route semantics. These regexes recover them at a lower
//! confidence than attribute routes.

use std::sync::LazyLock;

use regex::Regex;

use super::routes::{generated_action_name, join_paths, normalize_path, path_parameters};
use super::ExtractionContext;
use crate::model::{CanonicalAction, ExtractionMethod};
use revspec_core::constants::CONFIDENCE_TEXT_PATTERN;

static ACTIX_SCOPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"web::scope\(\s*"([^"]*)"\s*\)"#).ok());

static ACTIX_RESOURCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"web::resource\(\s*"([^"]*)"\s*\)"#).ok());

/// `web::get().to(handler)` inside a resource.
static ACTIX_METHOD_TO: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"web::(get|post|put|patch|delete|head)\(\s*\)\s*\.\s*to\(\s*([\w:]+)\s*\)"#).ok()
});

/// `.route("/p", web::get().to(handler))`.
static ACTIX_ROUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"\.route\(\s*"([^"]*)"\s*,\s*web::(get|post|put|patch|delete|head)\(\s*\)\s*\.\s*to\(\s*([\w:]+)\s*\)"#,
    )
    .ok()
});

/// `.route("/p", get(a).post(b))`.
static AXUM_ROUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"\.route\(\s*"([^"]*)"\s*,\s*((?:\s*\.?\s*(?:routing::)?(?:get|post|put|patch|delete|head|options)\(\s*[\w:]+\s*\))+)"#,
    )
    .ok()
});

/// One `get(handler)` of an axum method router or a tide endpoint.
static METHOD_CALL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?:routing::)?(get|post|put|patch|delete|head|options)\(\s*([\w:]+)\s*\)"#).ok()
});

/// `warp::path!("users" / u32)` or `warp::path("users")`.
static WARP_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"warp::path!\(([^)]*)\)|warp::path\(\s*"([^"]*)"\s*\)"#).ok()
});

static WARP_METHOD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"warp::(get|post|put|patch|delete|head)\(\s*\)"#).ok());

static WARP_HANDLER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\.(?:and_then|map)\(\s*([\w:]+)\s*\)"#).ok());

/// `.at("/p").get(a).post(b)`.
static TIDE_AT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"\.at\(\s*"([^"]*)"\s*\)((?:\s*\.\s*(?:get|post|put|patch|delete|head|options)\(\s*[\w:]+\s*\))+)"#,
    )
    .ok()
});

/// A route recovered from builder text.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredRoute {
    pub framework: &'static str,
    pub method: String,
    pub path: String,
    pub handler: Option<String>,
    pub offset: usize,
}

/// Byte index where the call enclosing `start` closes, or the end of text.
/// String literals are skipped so that `")"` does not close anything.
fn enclosing_call_end(text: &str, start: usize) -> usize {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return start + i;
                }
            }
            ';' if depth <= 0 => return start + i,
            _ => {}
        }
    }
    text.len()
}

/// Scope prefixes whose extent contains `offset`, outermost first.
fn scope_prefix(scopes: &[(usize, usize, String)], offset: usize) -> String {
    scopes
        .iter()
        .filter(|(start, end, _)| *start < offset && offset < *end)
        .fold(String::new(), |acc, (_, _, prefix)| join_paths(&acc, prefix))
}

fn handler_name(path: &str) -> String {
    path.rsplit("::").next().unwrap_or(path).to_string()
}

fn actix_routes(text: &str, out: &mut Vec<DiscoveredRoute>) {
    let (Some(scope_re), Some(resource_re), Some(to_re), Some(route_re)) = (
        ACTIX_SCOPE.as_ref(),
        ACTIX_RESOURCE.as_ref(),
        ACTIX_METHOD_TO.as_ref(),
        ACTIX_ROUTE.as_ref(),
    ) else {
        return;
    };
    let scopes: Vec<(usize, usize, String)> = scope_re
        .captures_iter(text)
        .filter_map(|c| {
            let m = c.get(0)?;
            Some((m.start(), enclosing_call_end(text, m.start()), c[1].to_string()))
        })
        .collect();

    for caps in resource_re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let path = join_paths(&scope_prefix(&scopes, whole.start()), &caps[1]);
        let end = enclosing_call_end(text, whole.end());
        for method in to_re.captures_iter(&text[whole.end()..end]) {
            out.push(DiscoveredRoute {
                framework: "actix",
                method: method[1].to_ascii_uppercase(),
                path: path.clone(),
                handler: Some(handler_name(&method[2])),
                offset: whole.start(),
            });
        }
    }
    for caps in route_re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push(DiscoveredRoute {
            framework: "actix",
            method: caps[2].to_ascii_uppercase(),
            path: join_paths(&scope_prefix(&scopes, whole.start()), &caps[1]),
            handler: Some(handler_name(&caps[3])),
            offset: whole.start(),
        });
    }
}

fn method_chain(
    framework: &'static str,
    path: &str,
    chain: &str,
    offset: usize,
    out: &mut Vec<DiscoveredRoute>,
) {
    let Some(method_re) = METHOD_CALL.as_ref() else {
        return;
    };
    for method in method_re.captures_iter(chain) {
        out.push(DiscoveredRoute {
            framework,
            method: method[1].to_ascii_uppercase(),
            path: normalize_path(path),
            handler: Some(handler_name(&method[2])),
            offset,
        });
    }
}

fn axum_routes(text: &str, out: &mut Vec<DiscoveredRoute>) {
    let Some(re) = AXUM_ROUTE.as_ref() else { return };
    for caps in re.captures_iter(text) {
        let offset = caps.get(0).map_or(0, |m| m.start());
        method_chain("axum", &caps[1], &caps[2], offset, out);
    }
}

fn tide_routes(text: &str, out: &mut Vec<DiscoveredRoute>) {
    let Some(re) = TIDE_AT.as_ref() else { return };
    for caps in re.captures_iter(text) {
        let offset = caps.get(0).map_or(0, |m| m.start());
        method_chain("tide", &caps[1], &caps[2], offset, out);
    }
}

/// `"users" / u32 / "posts"` to `/users/{param}/posts`.
fn warp_macro_path(segments: &str) -> String {
    let mut params = 0;
    let parts: Vec<String> = segments
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "..")
        .map(|s| match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(literal) => literal.to_string(),
            None => {
                params += 1;
                if params == 1 {
                    "{param}".to_string()
                } else {
                    format!("{{param{params}}}")
                }
            }
        })
        .collect();
    join_paths("", &parts.join("/"))
}

fn warp_routes(text: &str, out: &mut Vec<DiscoveredRoute>) {
    let (Some(path_re), Some(method_re), Some(handler_re)) =
        (WARP_PATH.as_ref(), WARP_METHOD.as_ref(), WARP_HANDLER.as_ref())
    else {
        return;
    };
    let mut last_end = 0;
    for caps in path_re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        // Chained `warp::path("a").and(warp::path("b"))` belongs to one filter.
        if whole.start() < last_end {
            continue;
        }
        let end = text[whole.start()..]
            .find(';')
            .map_or(text.len(), |i| whole.start() + i);
        last_end = end;
        let statement = &text[whole.start()..end];

        let path = match (caps.get(1), caps.get(2)) {
            (Some(segments), _) => warp_macro_path(segments.as_str()),
            (None, Some(_)) => {
                let segments: Vec<String> = path_re
                    .captures_iter(statement)
                    .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
                    .collect();
                join_paths("", &segments.join("/"))
            }
            (None, None) => continue,
        };
        let method = method_re
            .captures(statement)
            .map_or_else(|| "GET".to_string(), |m| m[1].to_ascii_uppercase());
        let handler = handler_re.captures(statement).map(|h| handler_name(&h[1]));
        out.push(DiscoveredRoute {
            framework: "warp",
            method,
            path,
            handler,
            offset: whole.start(),
        });
    }
}

/// Every route the builder regexes find in `source`, in source order.
pub fn discover_routes(source: &str) -> Vec<DiscoveredRoute> {
    let mut routes = Vec::new();
    actix_routes(source, &mut routes);
    axum_routes(source, &mut routes);
    warp_routes(source, &mut routes);
    tide_routes(source, &mut routes);
    routes.sort_by_key(|r| r.offset);
    routes
}

/// Routes found by text pattern, as actions gated on the context floor.
pub fn route_actions(source: &str, ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
    let mut actions = Vec::new();
    for route in discover_routes(source) {
        let line = source[..route.offset].matches('\n').count() as u32 + 1;
        let name = route
            .handler
            .clone()
            .unwrap_or_else(|| generated_action_name(&route.method, &route.path));
        if !ctx.admit(CONFIDENCE_TEXT_PATTERN, &name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_TEXT_PATTERN, ctx.source_at(line))
                .with_route(&route.method, route.path.clone())
                .with_framework(route.framework)
                .with_method(ExtractionMethod::TextPattern)
                .with_parameters(path_parameters(&route.path)),
        );
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SourceLanguage;

    fn paths(routes: &[DiscoveredRoute]) -> Vec<(String, String)> {
        routes.iter().map(|r| (r.method.clone(), r.path.clone())).collect()
    }

    #[test]
    fn test_actix_scope_and_resource() {
        let source = r#"
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(handlers::get_user))
                    .route(web::delete().to(delete_user)),
            )
            .route("/users", web::post().to(create_user)),
    );
    cfg.route("/health", web::get().to(health));
}
"#;
        let routes = discover_routes(source);
        assert_eq!(
            paths(&routes),
            vec![
                ("GET".to_string(), "/api/users/{id}".to_string()),
                ("DELETE".to_string(), "/api/users/{id}".to_string()),
                ("POST".to_string(), "/api/users".to_string()),
                ("GET".to_string(), "/health".to_string()),
            ]
        );
        assert_eq!(routes[0].handler.as_deref(), Some("get_user"));
    }

    #[test]
    fn test_axum_method_router() {
        let source = r#"
let app = Router::new()
    .route("/users/:id", get(show_user).delete(remove_user))
    .route("/users", post(create_user));
"#;
        let routes = discover_routes(source);
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].path, "/users/{id}");
        assert_eq!(routes[1].method, "DELETE");
        assert!(routes.iter().all(|r| r.framework == "axum"));
    }

    #[test]
    fn test_warp_filters() {
        let source = r#"
let list = warp::path!("todos").and(warp::get()).and_then(list_todos);
let delete = warp::path!("todos" / u64).and(warp::delete()).and_then(delete_todo);
let hello = warp::path("hello").and(warp::path("world")).map(hello_world);
"#;
        let routes = discover_routes(source);
        assert_eq!(
            paths(&routes),
            vec![
                ("GET".to_string(), "/todos".to_string()),
                ("DELETE".to_string(), "/todos/{param}".to_string()),
                ("GET".to_string(), "/hello/world".to_string()),
            ]
        );
        assert_eq!(routes[1].handler.as_deref(), Some("delete_todo"));
    }

    #[test]
    fn test_tide_at() {
        let source = r#"app.at("/orders/:id").get(get_order).put(update_order);"#;
        let routes = discover_routes(source);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].method, "PUT");
        assert_eq!(routes[1].path, "/orders/{id}");
    }

    #[test]
    fn test_route_actions_are_text_pattern() {
        let mut ctx = ExtractionContext::new("main.rs", SourceLanguage::Rust);
        let actions = route_actions("app.at(\"/a\")\n  .get(list_a);", &mut ctx);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].extraction_method, ExtractionMethod::TextPattern);
        assert_eq!(actions[0].confidence, 0.85);
        assert_eq!(actions[0].source.line, Some(1));
    }
}
