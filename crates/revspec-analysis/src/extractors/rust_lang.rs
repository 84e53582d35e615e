//! Rust extractor.
//!
//! Entities come from Diesel `table!` macros and from model structs
//! (`#[diesel(table_name = ..)]`, ORM derives). Actions come from route
//! attributes, `pub` methods of inherent impls, and builder-chain routes
//! found by [`super::rust_routes`].

use std::sync::LazyLock;

use regex::Regex;
use revspec_core::FxHashMap;

use super::naming::{entity_name, to_snake_case};
use super::routes::{normalize_path, path_parameters};
use super::rust_routes::route_actions;
use super::type_map::{make_field, rust_type, BINARY};
use super::{ExtractionContext, Extractor};
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{
    ActionParameter, CanonicalAction, CanonicalEntity, CanonicalField, CrudKind, ExtractionMethod,
    ForeignKey, ParamLocation,
};
use crate::relationships::{apply_foreign_keys, resolve_reference, TableForeignKey};
use revspec_core::constants::{CONFIDENCE_EXPLICIT, CONFIDENCE_HEURISTIC, CONFIDENCE_NAMED};

/// `table! { [schema.]name (pk, ..) { col -> Type, .. } }`.
static TABLE_MACRO: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^(?:diesel::)?table!\s*[{(]\s*(?:#\[[^\]]*\]\s*)*(?:(\w+)\s*\.\s*)?(\w+)\s*(?:\(([^)]*)\))?\s*\{(.*)\}\s*[})]\s*;?$",
    )
    .ok()
});

/// `joinable!(posts -> users (user_id))`.
static JOINABLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:diesel::)?joinable!\s*\(\s*(\w+)\s*->\s*(\w+)\s*\(\s*(\w+)\s*\)\s*\)").ok()
});

/// `table_name = users`, `table_name = "users"`, `table_name = crate::schema::users`.
static TABLE_NAME_ATTR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"table_name\s*=\s*"?([\w:]+)"?"#).ok());

static PRIMARY_KEY_ATTR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"primary_key\s*\(([^)]*)\)").ok());

static BELONGS_TO_ATTR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"belongs_to\(\s*(\w+)\s*(?:,\s*foreign_key\s*=\s*(\w+))?\s*\)").ok()
});

/// `#[get("/path", ..)]`, optionally path-qualified (`actix_web::get`).
static ROUTE_ATTR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)^#\[\s*(?:\w+::)*(get|post|put|patch|delete|head|options)\s*\(\s*"([^"]*)"(.*)\)\s*\]$"#)
        .ok()
});

static ROCKET_ARGS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(?:data|format|rank)\s*=").ok());

static ROCKET_DATA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\bdata\s*=\s*"<(\w+)>""#).ok());

const ORM_DERIVES: &[&str] = &[
    "Queryable",
    "Insertable",
    "Identifiable",
    "Selectable",
    "AsChangeset",
    "FromRow",
    "DeriveEntityModel",
];

/// Extractor argument types the framework injects.
const INJECTED_TYPES: &[&str] = &[
    "Data<", "State<", "HttpRequest", "Extension<", "DbConn", "Connection", "Pool", "Request<",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct RustExtractor;

impl Extractor for RustExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Rust
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        let mut entities: Vec<CanonicalEntity> = root
            .find_all("macro_invocation")
            .into_iter()
            .filter_map(|m| diesel_table(m, ctx))
            .collect();

        let models: Vec<Node<'_>> = root
            .find_all("struct_item")
            .into_iter()
            .filter(|s| is_model_struct(&preceding_attributes(*s)))
            .collect();
        for model in &models {
            if let Some(name) = model.child_by_field("name") {
                ctx.register_entity_alias(name.text(), entity_name(name.text()));
            }
        }
        for entity in &entities {
            ctx.register_entity(entity.name.clone());
        }

        for model in models {
            model_struct(model, &mut entities, ctx);
        }

        let joins: Vec<TableForeignKey> = root
            .find_all("macro_invocation")
            .into_iter()
            .filter_map(|m| joinable(m, &entities))
            .collect();
        apply_foreign_keys(&mut entities, &joins);
        entities
    }

    fn extract_actions(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
        let root = tree.root();
        let mut actions = Vec::new();

        for function in root.find_all("function_item") {
            if let Some(action) = attribute_route(function, ctx) {
                actions.push(action);
            }
        }

        for imp in root.find_all("impl_item") {
            if imp.child_by_field("trait").is_some() {
                continue;
            }
            let Some(owner) = imp.child_by_field("type").map(|t| base_type_name(t.text())) else {
                continue;
            };
            let Some(body) = imp.child_by_field("body") else {
                continue;
            };
            for method in body.children_of_kind("function_item") {
                if let Some(action) = impl_method(method, &owner, ctx) {
                    actions.push(action);
                }
            }
        }

        for action in route_actions(tree.source(), ctx) {
            let duplicate = actions
                .iter()
                .any(|a| a.http_method == action.http_method && a.path == action.path);
            if !duplicate {
                actions.push(action);
            }
        }
        actions
    }
}

/// Attributes directly above an item, nearest last.
fn preceding_attributes(node: Node<'_>) -> Vec<String> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    let siblings: Vec<Node<'_>> = parent.children().collect();
    let Some(index) = siblings.iter().position(|s| s.id() == node.id()) else {
        return Vec::new();
    };
    let mut attrs: Vec<String> = siblings[..index]
        .iter()
        .rev()
        .take_while(|s| matches!(s.kind(), "attribute_item" | "line_comment" | "block_comment"))
        .filter(|s| s.kind() == "attribute_item")
        .map(|s| s.text().to_string())
        .collect();
    attrs.reverse();
    attrs
}

fn is_model_struct(attrs: &[String]) -> bool {
    attrs.iter().any(|a| {
        a.contains("table_name")
            || (a.contains("derive") && ORM_DERIVES.iter().any(|d| a.contains(d)))
    })
}

/// `Vec<Foo<T>>` to `Vec`, `crate::models::User` to `User`.
fn base_type_name(text: &str) -> String {
    let head = text.split('<').next().unwrap_or(text).trim();
    head.rsplit("::").next().unwrap_or(head).to_string()
}

fn generic_inner<'a>(text: &'a str, wrapper: &str) -> Option<&'a str> {
    let text = text.trim();
    let rest = text.strip_prefix(wrapper)?.trim_start();
    rest.strip_prefix('<')?.strip_suffix('>').map(str::trim)
}

// ---- Diesel schema ----

/// Diesel column type: `Nullable<T>` is nullable, `Array<T>` is a list.
fn diesel_column(name: &str, ty: &str) -> CanonicalField {
    let mut ty = ty.trim();
    let mut nullable = false;
    let mut is_list = false;
    loop {
        if let Some(inner) = generic_inner(ty, "Nullable") {
            nullable = true;
            ty = inner;
        } else if let Some(inner) = generic_inner(ty, "Array") {
            is_list = true;
            ty = inner;
        } else {
            break;
        }
    }
    let native = ty.rsplit("::").next().unwrap_or(ty);
    make_field(name, native, rust_type(native))
        .with_nullable(nullable)
        .with_list(is_list)
}

fn diesel_table(node: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalEntity> {
    let caps = TABLE_MACRO.as_ref()?.captures(node.text())?;
    let table = caps.get(2)?.as_str().to_string();
    let schema = caps
        .get(1)
        .map_or_else(|| ctx.default_schema().to_string(), |s| s.as_str().to_string());
    let pk: Vec<String> = caps
        .get(3)
        .map(|p| {
            p.as_str()
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_else(|| vec!["id".to_string()]);

    let mut entity = CanonicalEntity::new(entity_name(&table), schema, table, ctx.source_at(node.line()));
    let body = caps.get(4).map_or("", |b| b.as_str());
    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("#[") || line.starts_with("//") {
            continue;
        }
        let Some((column, ty)) = line.trim_end_matches(',').split_once("->") else {
            ctx.skip_construct(line, node.line(), "table! entry is not a column definition");
            continue;
        };
        let field = diesel_column(column.trim(), ty);
        if let Err(e) = entity.push_field(field) {
            ctx.record(e);
        }
    }
    if let Err(e) = entity.set_primary_key(pk) {
        ctx.record(e);
    }
    let names: Vec<String> = entity.field_names().map(str::to_string).collect();
    for name in names {
        let is_pk = entity.is_primary_key_column(&name);
        if let Some(field) = entity.field_mut(&name) {
            resolve_reference(field, None, ctx, is_pk);
        }
    }
    Some(entity)
}

fn joinable(node: Node<'_>, entities: &[CanonicalEntity]) -> Option<TableForeignKey> {
    let caps = JOINABLE.as_ref()?.captures(node.text())?;
    let (child, parent, column) = (&caps[1], &caps[2], &caps[3]);
    let target = entities
        .iter()
        .find(|e| e.table_name == parent)
        .map_or_else(|| entity_name(parent), |e| e.name.clone());
    Some(TableForeignKey {
        schema: None,
        table: child.to_string(),
        foreign_key: ForeignKey::new(column, parent, target).with_target_column("id"),
    })
}

// ---- Model structs ----

/// Struct field type: `Option<T>` is nullable, `Vec<T>` is a list,
/// `Vec<u8>` is binary.
fn struct_field(name: &str, ty: &str) -> CanonicalField {
    let mut ty = ty.trim();
    let mut nullable = false;
    let mut is_list = false;
    if let Some(inner) = generic_inner(ty, "Option") {
        nullable = true;
        ty = inner;
    }
    if ty == "Vec<u8>" {
        return make_field(name, ty, BINARY).with_nullable(nullable);
    }
    if let Some(inner) = generic_inner(ty, "Vec") {
        is_list = true;
        ty = inner;
    }
    let native = base_type_name(ty);
    make_field(name, &native, rust_type(&native))
        .with_nullable(nullable)
        .with_list(is_list)
}

fn model_struct(node: Node<'_>, entities: &mut Vec<CanonicalEntity>, ctx: &mut ExtractionContext) {
    let Some(raw_name) = node.child_by_field("name").map(|n| n.text()) else {
        return;
    };
    let attrs = preceding_attributes(node);
    let name = entity_name(raw_name);
    let table = attrs
        .iter()
        .find_map(|a| TABLE_NAME_ATTR.as_ref()?.captures(a))
        .map(|c| base_type_name(&c[1]))
        .unwrap_or_else(|| format!("{}s", to_snake_case(&name)));

    // A same-file `table!` already describes the columns; the struct names it.
    if let Some(existing) = entities.iter_mut().find(|e| e.table_name == table) {
        tracing::trace!(table = %table, model = %name, "naming table! entity after its model struct");
        existing.name = name;
        return;
    }
    if entities.iter().any(|e| e.name == name) {
        return;
    }

    let mut explicit: FxHashMap<String, String> = FxHashMap::default();
    for attr in &attrs {
        let Some(re) = BELONGS_TO_ATTR.as_ref() else { break };
        for caps in re.captures_iter(attr) {
            let parent = caps[1].to_string();
            let column = caps
                .get(2)
                .map_or_else(|| format!("{}_id", to_snake_case(&parent)), |c| c.as_str().to_string());
            explicit.insert(column, entity_name(&parent));
        }
    }

    let mut entity = CanonicalEntity::new(
        name,
        ctx.default_schema().to_string(),
        table.clone(),
        ctx.source_at(node.line()),
    );
    let mut pk: Vec<String> = attrs
        .iter()
        .find_map(|a| PRIMARY_KEY_ATTR.as_ref()?.captures(a))
        .map(|c| c[1].split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let Some(body) = node.child_by_field("body") else {
        ctx.skip_construct(format!("struct {raw_name}"), node.line(), "model struct has no named fields");
        return;
    };
    for decl in body.children_of_kind("field_declaration") {
        let (Some(field_name), Some(ty)) = (decl.child_by_field("name"), decl.child_by_field("type")) else {
            continue;
        };
        let field_name = field_name.text();
        let field_attrs = preceding_attributes(decl);
        if field_attrs.iter().any(|a| a.contains("primary_key") && !a.contains("primary_key(")) {
            pk.push(field_name.to_string());
        }
        let field = struct_field(field_name, ty.text());
        if let Err(e) = entity.push_field(field) {
            ctx.record(e);
        }
    }
    if pk.is_empty() && entity.has_field("id") {
        pk.push("id".to_string());
    }
    for column in &pk {
        if let Some(field) = entity.field_mut(column) {
            field.nullable = false;
        }
    }
    if let Err(e) = entity.set_primary_key(pk) {
        ctx.record(e);
    }

    let names: Vec<String> = entity.field_names().map(str::to_string).collect();
    for field_name in names {
        let is_pk = entity.is_primary_key_column(&field_name);
        let target = explicit.get(&field_name).cloned();
        if let Some(field) = entity.field_mut(&field_name) {
            resolve_reference(field, target.as_deref(), ctx, is_pk);
        }
        if let Some(target) = target {
            let target_table = format!("{}s", to_snake_case(&target));
            entity.foreign_keys.push(ForeignKey::new(field_name, target_table, target));
        }
    }
    entities.push(entity);
}

// ---- Actions ----

fn is_async(function: Node<'_>) -> bool {
    function
        .children_of_kind("function_modifiers")
        .iter()
        .any(|m| m.text().contains("async"))
}

fn is_pub(function: Node<'_>) -> bool {
    function
        .child_of_kind("visibility_modifier")
        .is_some_and(|v| v.text().starts_with("pub"))
}

/// Binding name of a parameter pattern: `id`, `mut id`, `web::Path(id)`.
fn pattern_name(pattern: &str) -> String {
    let inner = match (pattern.find('('), pattern.rfind(')')) {
        (Some(open), Some(close)) if open < close => &pattern[open + 1..close],
        _ => pattern,
    };
    inner.trim().trim_start_matches("mut ").trim().to_string()
}

fn function_parameters(function: Node<'_>, path_names: &[String]) -> Vec<ActionParameter> {
    let Some(params) = function.child_by_field("parameters") else {
        return Vec::new();
    };
    params
        .children_of_kind("parameter")
        .iter()
        .filter_map(|p| {
            let name = pattern_name(p.child_by_field("pattern")?.text());
            let ty = p.child_by_field("type").map(|t| t.text().to_string());
            let ty_text = ty.as_deref().unwrap_or_default();
            if INJECTED_TYPES.iter().any(|t| ty_text.contains(t)) || name == "_" {
                return None;
            }
            let location = if path_names.contains(&name) || ty_text.contains("Path<") {
                ParamLocation::Path
            } else if ty_text.contains("Json<") || ty_text.contains("Form<") {
                ParamLocation::Body
            } else if ty_text.contains("Query<") {
                ParamLocation::Query
            } else {
                ParamLocation::Unknown
            };
            Some(ActionParameter::new(name, ty, location))
        })
        .collect()
}

fn attribute_route(function: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalAction> {
    let re = ROUTE_ATTR.as_ref()?;
    let attrs = preceding_attributes(function);
    let caps = attrs.iter().find_map(|a| re.captures(a))?;
    let name = function.child_by_field("name")?.text();
    let (method, raw_path, rest) = (&caps[1], &caps[2], &caps[3]);

    let rocket = raw_path.contains('<') || ROCKET_ARGS.as_ref().is_some_and(|r| r.is_match(rest));
    let path = normalize_path(raw_path.split('?').next().unwrap_or(raw_path));
    let mut parameters = path_parameters(&path);
    let path_names: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
    for param in function_parameters(function, &path_names) {
        if !path_names.contains(&param.name) {
            parameters.push(param);
        }
    }
    if let Some(data) = ROCKET_DATA.as_ref().and_then(|r| r.captures(rest)) {
        if let Some(param) = parameters.iter_mut().find(|p| p.name == data[1]) {
            param.location = ParamLocation::Body;
        }
    }

    if !ctx.admit(CONFIDENCE_EXPLICIT, name) {
        return None;
    }
    Some(
        CanonicalAction::new(name, CONFIDENCE_EXPLICIT, ctx.source_at(function.line()))
            .with_route(method, path)
            .with_framework(if rocket { "rocket" } else { "actix" })
            .with_async(is_async(function))
            .with_parameters(parameters),
    )
}

fn impl_method(function: Node<'_>, owner: &str, ctx: &mut ExtractionContext) -> Option<CanonicalAction> {
    if !is_pub(function) {
        return None;
    }
    if ROUTE_ATTR
        .as_ref()
        .is_some_and(|re| preceding_attributes(function).iter().any(|a| re.is_match(a)))
    {
        return None;
    }
    let name = function.child_by_field("name")?.text();
    let action = CanonicalAction::new(name, CONFIDENCE_HEURISTIC, ctx.source_at(function.line()));
    let confidence = if action.crud_kind == CrudKind::Custom {
        CONFIDENCE_HEURISTIC
    } else {
        CONFIDENCE_NAMED
    };
    if !ctx.admit(confidence, name) {
        return None;
    }
    let mut action = action
        .with_method(ExtractionMethod::NameHeuristic)
        .with_owner(owner)
        .with_async(is_async(function))
        .with_parameters(function_parameters(function, &[]));
    action.confidence = confidence;
    Some(action)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::adapters::adapter_for;
    use crate::model::TypeTier;

    fn parse(source: &str) -> (SyntaxTree, ExtractionContext) {
        let tree = adapter_for(SourceLanguage::Rust)
            .parse(source, Path::new("schema.rs"))
            .unwrap();
        (tree, ExtractionContext::new("schema.rs", SourceLanguage::Rust))
    }

    const SCHEMA: &str = r#"
diesel::table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        bio -> Nullable<Text>,
        tags -> Array<Text>,
    }
}

diesel::table! {
    posts (id) {
        id -> Int4,
        author_id -> Int4,
        title -> Varchar,
        published_at -> Nullable<Timestamp>,
    }
}

diesel::joinable!(posts -> users (author_id));

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub email: String,
}
"#;

    #[test]
    fn test_diesel_tables() {
        let (tree, mut ctx) = parse(SCHEMA);
        let entities = RustExtractor.extract_entities(&tree, &mut ctx);
        assert_eq!(entities.len(), 2);

        let users = &entities[0];
        assert_eq!(users.name, "User");
        assert_eq!(users.table_name, "users");
        assert_eq!(users.field("id").unwrap().type_expression(), "integer!");
        assert_eq!(users.field("email").unwrap().type_expression(), "email!");
        assert_eq!(users.field("bio").unwrap().type_expression(), "text");
        assert_eq!(users.field("tags").unwrap().type_expression(), "text[]!");
    }

    #[test]
    fn test_joinable_targets_named_entity() {
        let (tree, mut ctx) = parse(SCHEMA);
        let entities = RustExtractor.extract_entities(&tree, &mut ctx);
        let posts = &entities[1];
        assert_eq!(posts.field("author_id").unwrap().type_expression(), "ref(User)!");
        assert_eq!(posts.foreign_keys[0].target_table, "users");
    }

    #[test]
    fn test_model_struct_without_table_macro() {
        let source = r#"
#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = comments, primary_key(comment_id))]
#[diesel(belongs_to(Post, foreign_key = parent_post))]
pub struct Comment {
    pub comment_id: i64,
    pub parent_post: i64,
    pub body: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub avatar: Vec<u8>,
}

pub struct NotAModel {
    pub x: i32,
}
"#;
        let (tree, mut ctx) = parse(source);
        let entities = RustExtractor.extract_entities(&tree, &mut ctx);
        assert_eq!(entities.len(), 1);
        let comment = &entities[0];
        assert_eq!(comment.table_name, "comments");
        assert_eq!(comment.primary_key(), Some(&["comment_id".to_string()][..]));
        assert_eq!(comment.field("parent_post").unwrap().type_expression(), "ref(Post)!");
        assert_eq!(comment.field("body").unwrap().type_expression(), "text");
        assert_eq!(comment.field("created_at").unwrap().canonical_type, "timestamp");
        assert_eq!(comment.field("avatar").unwrap().canonical_type, "binary");
        assert_eq!(comment.field("comment_id").unwrap().type_tier, TypeTier::Basic);
    }

    #[test]
    fn test_attribute_routes() {
        let source = r#"
#[get("/users/{id}")]
async fn get_user(path: web::Path<i32>, pool: web::Data<DbPool>) -> impl Responder { todo!() }

#[post("/users", data = "<user>")]
fn create_user(user: Json<NewUser>) -> Status { todo!() }

#[get("/users/<id>")]
fn show(id: i32) -> String { todo!() }
"#;
        let (tree, mut ctx) = parse(source);
        let actions = RustExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 3);

        assert_eq!(actions[0].framework.as_deref(), Some("actix"));
        assert!(actions[0].is_async);
        assert_eq!(actions[0].parameters[0].name, "id");
        assert_eq!(actions[0].parameters.len(), 2);

        assert_eq!(actions[1].framework.as_deref(), Some("rocket"));
        assert_eq!(actions[1].crud_kind, CrudKind::Create);
        assert_eq!(actions[1].parameters[0].location, ParamLocation::Body);

        assert_eq!(actions[2].framework.as_deref(), Some("rocket"));
        assert_eq!(actions[2].path.as_deref(), Some("/users/{id}"));
        assert_eq!(actions[2].parameters.len(), 1);
        assert!(actions.iter().all(|a| a.confidence == 0.95));
    }

    #[test]
    fn test_impl_methods_by_name() {
        let source = r#"
pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_email(&self, email: &str) -> Option<User> { None }
    pub fn delete_user(&self, id: i32) {}
    pub fn ping(&self) {}
    fn private_helper(&self) {}
}

impl Default for UserRepository {
    fn default() -> Self { Self }
}
"#;
        let (tree, mut ctx) = parse(source);
        let actions = RustExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].crud_kind, CrudKind::Read);
        assert!(actions[0].is_async);
        assert_eq!(actions[0].owner.as_deref(), Some("UserRepository"));
        assert_eq!(actions[0].confidence, 0.85);
        assert_eq!(actions[1].crud_kind, CrudKind::Delete);
        assert_eq!(actions[2].confidence, 0.70);
        assert!(actions.iter().all(|a| a.extraction_method == ExtractionMethod::NameHeuristic));
    }

    #[test]
    fn test_builder_routes_are_merged() {
        let source = r#"
fn app() -> Router {
    Router::new().route("/health", get(health))
}
"#;
        let (tree, mut ctx) = parse(source);
        let actions = RustExtractor.extract_actions(&tree, &mut ctx);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].framework.as_deref(), Some("axum"));
        assert_eq!(actions[0].extraction_method, ExtractionMethod::TextPattern);
    }
}
