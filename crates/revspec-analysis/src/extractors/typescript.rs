//! TypeScript extractor.
//!
//! Entities come from `interface` declarations and object `type` aliases.
//! Actions come from Express/Fastify route calls, Next.js pages and app
//! router handlers, and `'use server'` modules.

use super::naming::{entity_name, to_snake_case};
use super::routes::{generated_action_name, join_paths, normalize_path, path_parameters, slash_path, string_value};
use super::type_map::{make_field, typescript_type};
use super::{ExtractionContext, Extractor};
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{ActionParameter, CanonicalAction, CanonicalEntity, CanonicalField, ParamLocation};
use crate::relationships::resolve_reference;
use revspec_core::constants::{CONFIDENCE_EXPLICIT, CONFIDENCE_STRUCTURAL, CONFIDENCE_TEXT_PATTERN};

const HTTP_VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];
const EXPORTED_HANDLERS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
/// Handler parameters bound by the framework rather than the caller.
const FRAMEWORK_PARAMS: &[&str] = &["req", "res", "request", "reply", "response", "next", "ctx", "context"];

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptExtractor;

impl Extractor for TypeScriptExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::TypeScript
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        let candidates: Vec<(Node<'_>, Node<'_>)> = root
            .descendants()
            .into_iter()
            .filter_map(|node| {
                let body = match node.kind() {
                    "interface_declaration" => node.child_by_field("body")?,
                    "type_alias_declaration" => node
                        .child_by_field("value")
                        .filter(|v| v.kind() == "object_type")?,
                    _ => return None,
                };
                Some((node, body))
            })
            .collect();

        // Register every name first so references resolve regardless of order.
        for (decl, _) in &candidates {
            if let Some(name) = decl.child_by_field("name") {
                ctx.register_entity_alias(name.text(), entity_name(name.text()));
            }
        }

        candidates
            .into_iter()
            .filter_map(|(decl, body)| extract_object_type(decl, body, ctx))
            .collect()
    }

    fn extract_actions(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
        let root = tree.root();
        let file = slash_path(ctx.path());
        let mut actions = Vec::new();

        express_routes(root, ctx, &mut actions);
        if let Some(base) = pages_api_route(&file) {
            pages_router(root, &base, ctx, &mut actions);
        }
        if let Some(base) = app_route(&file) {
            app_router(root, &base, ctx, &mut actions);
        }
        if has_use_server_directive(root) {
            server_actions(root, ctx, &mut actions);
        }
        actions
    }
}

// ---- Entities ----

fn extract_object_type(decl: Node<'_>, body: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalEntity> {
    let raw_name = decl.child_by_field("name")?.text();
    let name = entity_name(raw_name);
    let mut entity = CanonicalEntity::new(
        name.clone(),
        ctx.default_schema().to_string(),
        format!("{}s", to_snake_case(&name)),
        ctx.source_at(decl.line()),
    );

    for member in body.named_children() {
        match member.kind() {
            "property_signature" => {
                let Some(field) = property_field(member, ctx) else {
                    continue;
                };
                if let Err(e) = entity.push_field(field) {
                    ctx.record(e);
                }
            }
            "comment" => {}
            other => ctx.skip_construct(other, member.line(), "interface member is not a data field"),
        }
    }
    Some(entity)
}

/// Parsed `T | null`, `T[]`, `Array<T>`, or `'a' | 'b'` annotation.
#[derive(Debug, PartialEq)]
struct TsType {
    base: String,
    nullable: bool,
    is_list: bool,
    enum_values: Vec<String>,
}

fn parse_ts_type(annotation: &str) -> TsType {
    let mut nullable = false;
    let mut parts = Vec::new();
    for part in annotation.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        if part == "null" || part == "undefined" {
            nullable = true;
        } else {
            parts.push(part);
        }
    }

    let is_literal = |p: &&str| p.len() >= 2 && (p.starts_with('\'') || p.starts_with('"'));
    if parts.len() > 1 && parts.iter().all(is_literal) {
        return TsType {
            base: "string".to_string(),
            nullable,
            is_list: false,
            enum_values: parts
                .iter()
                .filter_map(|p| p.get(1..p.len() - 1).map(str::to_string))
                .collect(),
        };
    }

    let single = if parts.len() == 1 { parts[0] } else { "" };
    let (base, is_list) = if let Some(inner) = single.strip_suffix("[]") {
        (inner, true)
    } else if let Some(inner) = single.strip_prefix("Array<").and_then(|s| s.strip_suffix('>')) {
        (inner, true)
    } else {
        (single, false)
    };
    TsType {
        base: base.trim().trim_start_matches('(').trim_end_matches(')').to_string(),
        nullable,
        is_list,
        enum_values: Vec::new(),
    }
}

fn property_field(node: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalField> {
    let name_node = node.child_by_field("name")?;
    let name = string_value(name_node).unwrap_or_else(|| name_node.text().to_string());
    let optional = node.children().any(|c| !c.is_named() && c.kind() == "?");
    let annotation = node
        .child_by_field("type")
        .map(|t| t.text().trim_start_matches(':').trim().to_string())
        .unwrap_or_else(|| "any".to_string());
    let ts = parse_ts_type(&annotation);

    let mut field = if ts.enum_values.is_empty() {
        make_field(&name, &ts.base, typescript_type(&ts.base))
    } else {
        make_field(&name, &annotation, typescript_type(&ts.base)).with_enum_values(ts.enum_values)
    };
    field = field.with_list(ts.is_list).with_nullable(optional || ts.nullable);
    if field.enum_values.is_none() {
        resolve_reference(&mut field, None, ctx, false);
    }
    Some(field)
}

// ---- Actions ----

fn handler_parameters(params: Option<Node<'_>>) -> Vec<ActionParameter> {
    let Some(params) = params else {
        return Vec::new();
    };
    params
        .named_children()
        .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter" | "identifier"))
        .filter_map(|p| {
            let name = match p.kind() {
                "identifier" => p.text(),
                _ => p.child_by_field("pattern")?.text(),
            };
            if FRAMEWORK_PARAMS.contains(&name) || name.starts_with(['{', '[']) {
                return None;
            }
            let type_hint = p
                .child_by_field("type")
                .map(|t| t.text().trim_start_matches(':').trim().to_string());
            Some(ActionParameter::new(name, type_hint, ParamLocation::Unknown))
        })
        .collect()
}

fn is_async(function: Node<'_>) -> bool {
    function.children().any(|c| c.kind() == "async")
}

fn is_router_object(name: &str) -> bool {
    matches!(name, "router" | "app" | "server" | "fastify" | "api" | "routes")
        || name.ends_with("Router")
        || name.ends_with("router")
}

/// `router.get('/users/:id', auth, handler)` and friends.
fn express_routes(root: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    for call in root.find_all("call_expression") {
        let Some(callee) = call.child_by_field("function").filter(|f| f.kind() == "member_expression") else {
            continue;
        };
        let (Some(object), Some(property)) = (callee.child_by_field("object"), callee.child_by_field("property"))
        else {
            continue;
        };
        let verb = property.text();
        if !HTTP_VERBS.contains(&verb) || !is_router_object(object.text()) {
            continue;
        }
        let Some(args) = call.child_by_field("arguments") else {
            continue;
        };
        let args: Vec<Node<'_>> = args.named_children().collect();
        let Some(path) = args.first().and_then(|a| string_value(*a)) else {
            continue;
        };
        let path = normalize_path(&path);
        let handler = args.iter().skip(1).last().copied();

        let (name, is_async, mut parameters) = match handler {
            Some(h) if h.kind() == "identifier" => (h.text().to_string(), false, Vec::new()),
            Some(h) if h.kind() == "member_expression" => (
                h.child_by_field("property").map_or_else(|| h.text().to_string(), |p| p.text().to_string()),
                false,
                Vec::new(),
            ),
            Some(h) if matches!(h.kind(), "arrow_function" | "function_expression" | "function") => (
                generated_action_name(verb, &path),
                is_async(h),
                handler_parameters(h.child_by_field("parameters")),
            ),
            _ => (generated_action_name(verb, &path), false, Vec::new()),
        };
        let mut all_params = path_parameters(&path);
        all_params.append(&mut parameters);

        let framework = if object.text().contains("fastify") {
            "fastify"
        } else {
            "express"
        };
        if !ctx.admit(CONFIDENCE_EXPLICIT, &name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_EXPLICIT, ctx.source_at(call.line()))
                .with_route(verb, path)
                .with_framework(framework)
                .with_async(is_async)
                .with_parameters(all_params),
        );
    }
}

/// `/pages/api/users/[id].ts` to `/api/users/{id}`.
fn pages_api_route(file: &str) -> Option<String> {
    let (_, rest) = file.split_once("pages/api/")?;
    let stem = rest.rsplit_once('.').map_or(rest, |(stem, _)| stem);
    let stem = stem.strip_suffix("/index").or_else(|| (stem == "index").then_some("")).unwrap_or(stem);
    Some(normalize_path(&join_paths("/api", stem)))
}

/// `app/users/[id]/route.ts` to `/users/{id}`; route groups `(x)` are dropped.
fn app_route(file: &str) -> Option<String> {
    let (dir, file_name) = file.rsplit_once('/')?;
    let stem = file_name.split('.').next()?;
    if stem != "route" {
        return None;
    }
    let after_app = if dir == "app" || dir.ends_with("/app") {
        ""
    } else {
        dir.strip_prefix("app/")
            .or_else(|| dir.split_once("/app/").map(|(_, rest)| rest))?
    };
    let segments: Vec<&str> = after_app
        .split('/')
        .filter(|s| !s.is_empty() && !(s.starts_with('(') && s.ends_with(')')))
        .collect();
    Some(normalize_path(&join_paths("", &segments.join("/"))))
}

/// Methods a pages-router handler branches on: `req.method === 'POST'` and
/// `switch (req.method) { case 'GET': ... }`.
fn pages_methods(root: Node<'_>) -> Vec<String> {
    let is_method_access = |n: Node<'_>| {
        let text = n.text().trim_matches(|c: char| c == '(' || c == ')').trim();
        text.ends_with(".method") && (text.starts_with("req") || text.starts_with("request"))
    };
    let mut methods: Vec<String> = Vec::new();
    let mut push = |m: String| {
        let m = m.to_ascii_uppercase();
        if EXPORTED_HANDLERS.contains(&m.as_str()) && !methods.contains(&m) {
            methods.push(m);
        }
    };

    for binary in root.find_all("binary_expression") {
        let (Some(left), Some(right)) = (binary.child_by_field("left"), binary.child_by_field("right")) else {
            continue;
        };
        let operator = binary.child_by_field("operator").map(|o| o.text()).unwrap_or_default();
        if operator != "===" && operator != "==" {
            continue;
        }
        if is_method_access(left) {
            if let Some(m) = string_value(right) {
                push(m);
            }
        } else if is_method_access(right) {
            if let Some(m) = string_value(left) {
                push(m);
            }
        }
    }
    for switch in root.find_all("switch_statement") {
        if !switch.child_by_field("value").is_some_and(is_method_access) {
            continue;
        }
        for case in switch.find_all("switch_case") {
            if let Some(m) = case.child_by_field("value").and_then(string_value) {
                push(m);
            }
        }
    }
    methods
}

fn pages_router(root: Node<'_>, route: &str, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    let mut methods = pages_methods(root);
    if methods.is_empty() {
        methods.push("GET".to_string());
    }
    let is_async = root
        .find_all("export_statement")
        .iter()
        .any(|e| e.descendants().iter().any(|n| n.kind() == "async"));
    for method in methods {
        let name = generated_action_name(&method, route);
        if !ctx.admit(CONFIDENCE_STRUCTURAL, &name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_STRUCTURAL, ctx.source_at(1))
                .with_route(&method, route)
                .with_framework("nextjs")
                .with_async(is_async)
                .with_parameters(path_parameters(route)),
        );
    }
}

/// Exported functions of a module, with their name and function node.
fn exported_functions(root: Node<'_>) -> Vec<(String, Node<'_>)> {
    let mut out = Vec::new();
    for export in root.children_of_kind("export_statement") {
        let Some(decl) = export.child_by_field("declaration") else {
            continue;
        };
        match decl.kind() {
            "function_declaration" => {
                if let Some(name) = decl.child_by_field("name") {
                    out.push((name.text().to_string(), decl));
                }
            }
            "lexical_declaration" => {
                for declarator in decl.children_of_kind("variable_declarator") {
                    let (Some(name), Some(value)) =
                        (declarator.child_by_field("name"), declarator.child_by_field("value"))
                    else {
                        continue;
                    };
                    if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                        out.push((name.text().to_string(), value));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn app_router(root: Node<'_>, route: &str, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    for (name, function) in exported_functions(root) {
        if !EXPORTED_HANDLERS.contains(&name.as_str()) {
            continue;
        }
        let action_name = generated_action_name(&name, route);
        if !ctx.admit(CONFIDENCE_EXPLICIT, &action_name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(action_name, CONFIDENCE_EXPLICIT, ctx.source_at(function.line()))
                .with_route(&name, route)
                .with_framework("nextjs")
                .with_async(is_async(function))
                .with_parameters(path_parameters(route)),
        );
    }
}

fn has_use_server_directive(root: Node<'_>) -> bool {
    root.named_children()
        .find(|n| n.kind() != "comment")
        .filter(|n| n.kind() == "expression_statement")
        .and_then(|n| n.named_children().next())
        .and_then(string_value)
        .is_some_and(|s| s == "use server")
}

fn server_actions(root: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    for (name, function) in exported_functions(root) {
        if !is_async(function) {
            continue;
        }
        if !ctx.admit(CONFIDENCE_TEXT_PATTERN, &name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_TEXT_PATTERN, ctx.source_at(function.line()))
                .with_framework("nextjs-server-action")
                .with_async(true)
                .with_parameters(handler_parameters(function.child_by_field("parameters"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::adapters::adapter_for;
    use crate::model::{CrudKind, TypeTier};

    fn parse(source: &str, path: &str) -> (SyntaxTree, ExtractionContext) {
        let tree = adapter_for(SourceLanguage::TypeScript)
            .parse(source, Path::new(path))
            .unwrap();
        (tree, ExtractionContext::new(path, SourceLanguage::TypeScript))
    }

    #[test]
    fn test_interface_fields() {
        let source = r#"
interface User {
  id: number;
  email: string;
  nickname?: string;
  role: 'admin' | 'member';
  tags: string[];
  deletedAt: Date | null;
}

type Post = {
  id: number;
  author: User;
  categoryId: number;
};
"#;
        let (tree, mut ctx) = parse(source, "models.ts");
        let entities = TypeScriptExtractor.extract_entities(&tree, &mut ctx);
        assert_eq!(entities.len(), 2);

        let user = &entities[0];
        assert_eq!(user.table_name, "users");
        assert_eq!(user.field("id").unwrap().type_expression(), "decimal!");
        assert_eq!(user.field("email").unwrap().canonical_type, "email");
        assert_eq!(user.field("nickname").unwrap().type_expression(), "text");
        assert_eq!(user.field("role").unwrap().type_expression(), "enum(admin, member)!");
        assert_eq!(user.field("tags").unwrap().type_expression(), "text[]!");
        assert!(user.field("deletedAt").unwrap().nullable);

        let post = &entities[1];
        assert_eq!(post.field("author").unwrap().type_expression(), "ref(User)!");
        assert_eq!(post.field("categoryId").unwrap().type_tier, TypeTier::Reference);
    }

    #[test]
    fn test_affixed_interface_references_resolve_to_entity_name() {
        let source = r#"
interface UserEntity {
  id: number;
}

interface Project {
  id: number;
  owner: UserEntity;
  members: UserEntity[];
}
"#;
        let (tree, mut ctx) = parse(source, "models.ts");
        let entities = TypeScriptExtractor.extract_entities(&tree, &mut ctx);
        assert_eq!(entities[0].name, "User");
        let project = &entities[1];
        assert_eq!(project.field("owner").unwrap().type_expression(), "ref(User)!");
        assert_eq!(project.field("members").unwrap().reference_target.as_deref(), Some("User"));
    }

    #[test]
    fn test_express_routes() {
        let source = r#"
import { Router } from 'express';
const router = Router();
router.get('/users', listUsers);
router.post('/users', auth, async (req, res) => { res.send(req.body); });
router.delete('/users/:id', userController.remove);
"#;
        let (tree, mut ctx) = parse(source, "routes/users.ts");
        let actions = TypeScriptExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].name, "listUsers");
        assert_eq!(actions[0].crud_kind, CrudKind::Read);
        assert_eq!(actions[1].name, "postUsers");
        assert!(actions[1].is_async);
        assert_eq!(actions[2].name, "remove");
        assert_eq!(actions[2].path.as_deref(), Some("/users/{id}"));
        assert_eq!(actions[2].parameters[0].name, "id");
        assert!(actions.iter().all(|a| a.confidence == 0.95));
    }

    #[test]
    fn test_pages_router_methods() {
        let source = r#"
export default async function handler(req, res) {
  if (req.method === 'POST') {
    return res.status(201).json({});
  }
  switch (req.method) {
    case 'GET':
      return res.json([]);
    case 'DELETE':
      return res.status(204).end();
  }
}
"#;
        let (tree, mut ctx) = parse(source, "src/pages/api/users/[id].ts");
        let actions = TypeScriptExtractor.extract_actions(&tree, &mut ctx);
        let methods: Vec<&str> = actions.iter().filter_map(|a| a.http_method.as_deref()).collect();
        assert_eq!(methods, vec!["POST", "GET", "DELETE"]);
        assert_eq!(actions[0].path.as_deref(), Some("/api/users/{id}"));
        assert_eq!(actions[0].confidence, 0.90);
    }

    #[test]
    fn test_pages_router_defaults_to_get() {
        let (tree, mut ctx) = parse(
            "export default function handler(req, res) { res.json([]); }",
            "pages/api/health.ts",
        );
        let actions = TypeScriptExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].http_method.as_deref(), Some("GET"));
    }

    #[test]
    fn test_app_router_exports() {
        let source = r#"
export async function GET(request: Request) { return Response.json([]); }
export const POST = async (request: Request) => Response.json({});
export function helper() {}
"#;
        let (tree, mut ctx) = parse(source, "app/(shop)/products/[id]/route.ts");
        let actions = TypeScriptExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].path.as_deref(), Some("/products/{id}"));
        assert_eq!(actions[1].crud_kind, CrudKind::Create);
        assert_eq!(actions[0].framework.as_deref(), Some("nextjs"));
    }

    #[test]
    fn test_server_actions() {
        let source = r#"'use server';

export async function createInvoice(formData: FormData) {}
export async function deleteInvoice(id: string) {}
export function notAnAction() {}
"#;
        let (tree, mut ctx) = parse(source, "app/actions.ts");
        let actions = TypeScriptExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].crud_kind, CrudKind::Create);
        assert_eq!(actions[1].crud_kind, CrudKind::Delete);
        assert_eq!(actions[1].parameters[0].type_hint.as_deref(), Some("string"));
        assert!(actions[0].http_method.is_none());
        assert_eq!(actions[0].confidence, 0.85);
    }

    #[test]
    fn test_floor_omits_server_actions() {
        let (tree, ctx) = parse("'use server';\nexport async function saveDraft() {}", "a.ts");
        let mut ctx = ctx.with_confidence_floor(0.9);
        assert!(TypeScriptExtractor.extract_actions(&tree, &mut ctx).is_empty());
        assert_eq!(ctx.omissions(), 1);
    }

    #[test]
    fn test_parse_ts_type() {
        let t = parse_ts_type("Array<Tag> | undefined");
        assert_eq!(t.base, "Tag");
        assert!(t.is_list && t.nullable);
    }
}
