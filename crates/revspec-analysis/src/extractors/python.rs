//! Python extractor.
//!
//! Entities come from Django `models.Model` subclasses and SQLAlchemy
//! declarative classes. Actions come from FastAPI/Flask route decorators,
//! Django and Flask view classes, DRF viewsets, and, as a last resort,
//! CRUD-named module functions.

use super::naming::{entity_name, to_snake_case};
use super::routes::{normalize_path, path_parameters, string_value};
use super::type_map::{make_field, python_type, BIGINT, INTEGER};
use super::{ExtractionContext, Extractor};
use crate::actions::crud::crud_from_http;
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{
    ActionParameter, CanonicalAction, CanonicalEntity, CanonicalField, CrudKind, ExtractionMethod,
    ForeignKey, ParamLocation,
};
use crate::relationships::{apply_foreign_keys, resolve_reference, split_qualified, TableForeignKey};
use revspec_core::constants::{CONFIDENCE_EXPLICIT, CONFIDENCE_HEURISTIC, CONFIDENCE_STRUCTURAL};

const HTTP_VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];
const SKIPPED_PARAMS: &[&str] = &["self", "cls", "request"];
const VIEW_BASES: &[&str] = &["View", "APIView", "ViewSet", "MethodView", "GenericAPIView"];
const SQLALCHEMY_BASES: &[&str] = &["Base", "DeclarativeBase", "db.Model", "Model", "SQLModel"];

/// DRF viewset actions, their CRUD kind, and the verb the router binds.
const VIEWSET_ACTIONS: &[(&str, CrudKind, &str)] = &[
    ("list", CrudKind::Read, "GET"),
    ("retrieve", CrudKind::Read, "GET"),
    ("create", CrudKind::Create, "POST"),
    ("update", CrudKind::Update, "PUT"),
    ("partial_update", CrudKind::Update, "PATCH"),
    ("destroy", CrudKind::Delete, "DELETE"),
];

/// Annotation types FastAPI binds from the query string.
const QUERY_TYPES: &[&str] = &["str", "int", "float", "bool", "Optional[str]", "Optional[int]", "list[str]", "List[str]"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonExtractor;

impl Extractor for PythonExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Python
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        let models: Vec<(Node<'_>, ModelKind)> = root
            .find_all("class_definition")
            .into_iter()
            .filter_map(|class| model_kind(class).map(|kind| (class, kind)))
            .collect();
        for (class, _) in &models {
            if let Some(name) = class.child_by_field("name") {
                ctx.register_entity_alias(name.text(), entity_name(name.text()));
            }
        }

        let mut pending = Vec::new();
        let mut entities: Vec<CanonicalEntity> = models
            .into_iter()
            .filter_map(|(class, kind)| model_entity(class, kind, &mut pending, ctx))
            .collect();

        // SQLAlchemy keys name a table, Django keys name a class; fill in the
        // other side from this file's entities.
        let foreign_keys: Vec<TableForeignKey> = pending
            .into_iter()
            .map(|mut fk: TableForeignKey| {
                let key = &mut fk.foreign_key;
                if key.target_table.is_empty() {
                    key.target_table = entities
                        .iter()
                        .find(|e| e.name == key.target_entity)
                        .map(|e| e.table_name.clone())
                        .unwrap_or_else(|| format!("{}s", to_snake_case(&key.target_entity)));
                } else if let Some(target) = entities.iter().find(|e| e.table_name == key.target_table) {
                    key.target_entity = target.name.clone();
                }
                fk
            })
            .collect();
        apply_foreign_keys(&mut entities, &foreign_keys);
        entities
    }

    fn extract_actions(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
        let root = tree.root();
        let mut actions = Vec::new();
        for function in root.find_all("function_definition") {
            match enclosing_class(function) {
                Some(class) => {
                    if is_view_class(class) {
                        view_method(function, class, ctx, &mut actions);
                    }
                }
                None if is_module_level(function) => module_function(function, ctx, &mut actions),
                None => {}
            }
        }
        actions
    }
}

// ---- Shared helpers ----

/// Class whose body directly contains `function`.
fn enclosing_class(function: Node<'_>) -> Option<Node<'_>> {
    let mut parent = function.parent()?;
    if parent.kind() == "decorated_definition" {
        parent = parent.parent()?;
    }
    if parent.kind() != "block" {
        return None;
    }
    parent.parent().filter(|p| p.kind() == "class_definition")
}

/// Defined directly in the module body, decorated or not.
fn is_module_level(function: Node<'_>) -> bool {
    let parent = function
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .map_or_else(|| function.parent(), |decorated| decorated.parent());
    parent.is_some_and(|p| p.kind() == "module")
}

fn decorators(definition: Node<'_>) -> Vec<Node<'_>> {
    definition
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .map(|p| p.children_of_kind("decorator"))
        .unwrap_or_default()
}

fn superclasses(class: Node<'_>) -> Vec<String> {
    class
        .child_by_field("superclasses")
        .map(|s| s.named_children().map(|b| b.text().to_string()).collect())
        .unwrap_or_default()
}

/// Function name, positional arguments, and keyword arguments of a call.
struct Call<'t> {
    function: &'t str,
    positional: Vec<Node<'t>>,
    keywords: Vec<(&'t str, Node<'t>)>,
}

impl<'t> Call<'t> {
    fn parse(node: Node<'t>) -> Option<Self> {
        if node.kind() != "call" {
            return None;
        }
        let function = node.child_by_field("function")?.text();
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        if let Some(args) = node.child_by_field("arguments") {
            for arg in args.named_children() {
                match arg.kind() {
                    "keyword_argument" => {
                        if let (Some(name), Some(value)) = (arg.child_by_field("name"), arg.child_by_field("value")) {
                            keywords.push((name.text(), value));
                        }
                    }
                    "comment" => {}
                    _ => positional.push(arg),
                }
            }
        }
        Some(Self {
            function,
            positional,
            keywords,
        })
    }

    /// Last dotted segment of the callee: `models.CharField` to `CharField`.
    fn name(&self) -> &'t str {
        self.function.rsplit('.').next().unwrap_or(self.function)
    }

    fn keyword(&self, name: &str) -> Option<Node<'t>> {
        self.keywords.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match self.keyword(name)?.text() {
            "True" => Some(true),
            "False" => Some(false),
            _ => None,
        }
    }
}

fn string_list(node: Node<'_>) -> Vec<String> {
    node.named_children().filter_map(string_value).collect()
}

// ---- Entities ----

#[derive(Debug, Clone, Copy, PartialEq)]
enum ModelKind {
    Django,
    SqlAlchemy,
}

fn model_kind(class: Node<'_>) -> Option<ModelKind> {
    let bases = superclasses(class);
    if bases.iter().any(|b| b == "models.Model") {
        return Some(ModelKind::Django);
    }
    let declarative = bases.iter().any(|b| SQLALCHEMY_BASES.contains(&b.as_str()));
    let has_tablename = class_assignments(class).iter().any(|(name, _, _)| *name == "__tablename__");
    (declarative || has_tablename).then_some(ModelKind::SqlAlchemy)
}

/// `name [: annotation] = value` statements directly in a class body.
fn class_assignments(class: Node<'_>) -> Vec<(&str, Option<Node<'_>>, Option<Node<'_>>)> {
    let Some(body) = class.child_by_field("body") else {
        return Vec::new();
    };
    body.children_of_kind("expression_statement")
        .into_iter()
        .filter_map(|stmt| stmt.child_of_kind("assignment"))
        .filter_map(|assignment| {
            let left = assignment.child_by_field("left").filter(|l| l.kind() == "identifier")?;
            Some((left.text(), assignment.child_by_field("type"), assignment.child_by_field("right")))
        })
        .collect()
}

/// `db_table = "x"` inside a nested `class Meta`.
fn django_meta_table(class: Node<'_>) -> Option<String> {
    let body = class.child_by_field("body")?;
    let meta = body
        .children_of_kind("class_definition")
        .into_iter()
        .find(|c| c.child_by_field("name").is_some_and(|n| n.text() == "Meta"))?;
    class_assignments(meta)
        .into_iter()
        .find(|(name, _, _)| *name == "db_table")
        .and_then(|(_, _, value)| value.and_then(string_value))
}

/// Target class of a relation: `Author`, `"Author"`, `"app.Author"`, `"self"`.
fn relation_target(node: Node<'_>, own: &str) -> String {
    let raw = string_value(node).unwrap_or_else(|| node.text().to_string());
    let last = raw.rsplit('.').next().unwrap_or(&raw);
    if last == "self" {
        own.to_string()
    } else {
        entity_name(last)
    }
}

/// One mapped column: the field, whether it is part of the primary key, and
/// the foreign key it declares.
struct Column {
    field: CanonicalField,
    is_pk: bool,
    foreign_key: Option<ForeignKey>,
}

fn model_entity(
    class: Node<'_>,
    kind: ModelKind,
    pending: &mut Vec<TableForeignKey>,
    ctx: &mut ExtractionContext,
) -> Option<CanonicalEntity> {
    let name = entity_name(class.child_by_field("name")?.text());
    let assignments = class_assignments(class);
    let table_name = match kind {
        ModelKind::Django => django_meta_table(class),
        ModelKind::SqlAlchemy => assignments
            .iter()
            .find(|(n, _, _)| *n == "__tablename__")
            .and_then(|(_, _, value)| value.and_then(string_value)),
    }
    .unwrap_or_else(|| format!("{}s", to_snake_case(&name)));

    let mut columns = Vec::new();
    for (attr, annotation, value) in assignments {
        if attr.starts_with("__") {
            continue;
        }
        let call = value.and_then(Call::parse);
        let column = match kind {
            ModelKind::Django => call.as_ref().and_then(|c| django_column(attr, c, &name)),
            ModelKind::SqlAlchemy => sqlalchemy_column(attr, annotation, call.as_ref()),
        };
        match column {
            Some(column) => columns.push(column),
            None => {
                if let Some(call) = call {
                    tracing::trace!(model = %name, attribute = %attr, call = %call.function, "class attribute is not a column");
                }
            }
        }
    }

    if kind == ModelKind::Django && !columns.iter().any(|c| c.is_pk || c.field.name == "id") {
        // Django adds an implicit auto primary key.
        columns.insert(
            0,
            Column {
                field: make_field("id", "AutoField", INTEGER).with_nullable(false),
                is_pk: true,
                foreign_key: None,
            },
        );
    }

    let mut entity = CanonicalEntity::new(
        name,
        ctx.default_schema().to_string(),
        table_name.clone(),
        ctx.source_at(class.line()),
    );
    let mut pk = Vec::new();
    for Column {
        mut field,
        is_pk,
        foreign_key,
    } in columns
    {
        if is_pk {
            field.nullable = false;
            pk.push(field.name.clone());
        }
        if field.enum_values.is_none() {
            let explicit = foreign_key.as_ref().map(|fk| fk.target_entity.as_str());
            resolve_reference(&mut field, explicit, ctx, is_pk);
        }
        if let Some(foreign_key) = foreign_key {
            pending.push(TableForeignKey {
                schema: None,
                table: table_name.clone(),
                foreign_key,
            });
        }
        if let Err(e) = entity.push_field(field) {
            ctx.record(e);
        }
    }
    if let Err(e) = entity.set_primary_key(pk) {
        ctx.record(e);
    }
    Some(entity)
}

/// Django field call to a column. Relation fields become `<name>_id`.
fn django_column(attr: &str, call: &Call<'_>, own: &str) -> Option<Column> {
    let field_class = call.name();
    if !field_class.ends_with("Field") && field_class != "ForeignKey" {
        return None;
    }
    let is_pk = call.flag("primary_key").unwrap_or(false);
    let mut foreign_key = None;

    let mut field = match field_class {
        "ForeignKey" | "OneToOneField" => {
            let target = call
                .positional
                .first()
                .copied()
                .or_else(|| call.keyword("to"))
                .map(|n| relation_target(n, own))?;
            let column = call
                .keyword("db_column")
                .and_then(string_value)
                .unwrap_or_else(|| format!("{attr}_id"));
            // Target table is filled in once the batch's tables are known.
            foreign_key = Some(ForeignKey::new(column.as_str(), "", target.as_str()).with_target_column("id"));
            make_field(&column, &target, BIGINT)
        }
        "ManyToManyField" => {
            let target = call.positional.first().map(|n| relation_target(*n, own))?;
            let field = make_field(attr, &target, BIGINT)
                .with_list(true)
                .with_reference(target);
            return Some(Column {
                field,
                is_pk: false,
                foreign_key: None,
            });
        }
        _ => {
            let column = call
                .keyword("db_column")
                .and_then(string_value)
                .unwrap_or_else(|| attr.to_string());
            let mut field = make_field(&column, field_class, python_type(field_class));
            if let Some(length) = call.keyword("max_length") {
                if field.canonical_type == "text" {
                    field.postgres_type = format!("VARCHAR({})", length.text());
                }
            }
            if let Some(default) = call.keyword("default") {
                field.default = Some(default.text().to_string());
            }
            field
        }
    };
    field.nullable = call.flag("null").unwrap_or(false) && !is_pk;
    Some(Column {
        field,
        is_pk,
        foreign_key,
    })
}

/// Inner type of `Mapped[T]` and whether it is optional.
fn mapped_inner(annotation: &str) -> Option<(&str, bool)> {
    let inner = annotation.trim().strip_prefix("Mapped[")?.strip_suffix(']')?;
    if let Some(optional) = inner.strip_prefix("Optional[").and_then(|i| i.strip_suffix(']')) {
        return Some((optional, true));
    }
    match inner.strip_suffix("| None") {
        Some(optional) => Some((optional.trim(), true)),
        None => Some((inner, false)),
    }
}

/// SQLAlchemy `Column(...)` / `mapped_column(...)`, with an optional
/// `Mapped[T]` annotation.
fn sqlalchemy_column(attr: &str, annotation: Option<Node<'_>>, call: Option<&Call<'_>>) -> Option<Column> {
    if call.is_some_and(|c| c.name() == "relationship") {
        return None;
    }
    let mapped = annotation.and_then(|a| mapped_inner(a.text()));
    let is_column_call = call.is_some_and(|c| matches!(c.name(), "Column" | "mapped_column"));
    if !is_column_call && mapped.is_none() {
        return None;
    }

    let mut native = None;
    let mut nullable = None;
    let mut is_list = false;
    if let Some((inner, optional)) = mapped {
        let element = inner
            .strip_prefix("list[")
            .or_else(|| inner.strip_prefix("List["))
            .and_then(|i| i.strip_suffix(']'));
        match element {
            // `Mapped[list["Child"]]` is a relationship collection.
            Some(e) if e.starts_with('"') || e.starts_with('\'') => return None,
            Some(e) => {
                is_list = true;
                native = Some(e.to_string());
            }
            None => native = Some(inner.to_string()),
        }
        nullable = Some(optional);
    }

    let mut is_pk = false;
    let mut default = None;
    let mut foreign_key = None;
    if let Some(call) = call {
        let mut column_type = None;
        for arg in &call.positional {
            if let Some(fk) = Call::parse(*arg).filter(|c| c.name() == "ForeignKey") {
                foreign_key = fk.positional.first().and_then(|t| string_value(*t)).map(|target| {
                    let (table_part, column) = target.rsplit_once('.').unwrap_or((target.as_str(), "id"));
                    let (schema, table) = split_qualified(table_part);
                    let mut foreign_key =
                        ForeignKey::new(attr, table.as_str(), entity_name(&table)).with_target_column(column);
                    if let Some(schema) = schema {
                        foreign_key = foreign_key.with_target_schema(schema);
                    }
                    foreign_key
                });
            } else if column_type.is_none() && arg.kind() != "string" {
                let text = arg.text();
                let base = text.split('(').next().unwrap_or(text);
                column_type = Some(base.rsplit('.').next().unwrap_or(base).to_string());
            }
        }
        if column_type.is_some() {
            native = column_type;
        }
        is_pk = call.flag("primary_key").unwrap_or(false);
        if let Some(flag) = call.flag("nullable") {
            nullable = Some(flag);
        }
        default = call
            .keyword("server_default")
            .or_else(|| call.keyword("default"))
            .map(|d| d.text().to_string());
    }

    let native = native.unwrap_or_else(|| "String".to_string());
    let mut field = make_field(attr, &native, python_type(&native)).with_list(is_list);
    field.nullable = !is_pk && nullable.unwrap_or(true);
    field.default = default;
    Some(Column {
        field,
        is_pk,
        foreign_key,
    })
}

// ---- Actions ----

fn function_parameters(function: Node<'_>, path: Option<&str>, fastapi: bool) -> Vec<ActionParameter> {
    let path_params = path.map(path_parameters).unwrap_or_default();
    let Some(params) = function.child_by_field("parameters") else {
        return path_params;
    };
    let mut out = path_params;
    for param in params.named_children() {
        let (name, ty, default) = match param.kind() {
            "identifier" => (param.text(), None, None),
            "typed_parameter" => (
                param.named_children().find(|c| c.kind() == "identifier").map_or("", |n| n.text()),
                param.child_by_field("type").map(|t| t.text()),
                None,
            ),
            "default_parameter" | "typed_default_parameter" => (
                param.child_by_field("name").map_or("", |n| n.text()),
                param.child_by_field("type").map(|t| t.text()),
                param.child_by_field("value").map(|v| v.text()),
            ),
            _ => continue,
        };
        if name.is_empty() || SKIPPED_PARAMS.contains(&name) {
            continue;
        }
        if default.is_some_and(|d| d.starts_with("Depends(") || d.starts_with("Security(")) {
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|p| p.name == name) {
            existing.type_hint = ty.map(str::to_string);
            continue;
        }
        let location = match (fastapi, ty) {
            (false, _) => ParamLocation::Unknown,
            (true, None) => ParamLocation::Query,
            (true, Some(t)) if QUERY_TYPES.contains(&t) => ParamLocation::Query,
            (true, Some(_)) => ParamLocation::Body,
        };
        out.push(ActionParameter::new(name, ty.map(str::to_string), location));
    }
    out
}

fn is_async(function: Node<'_>) -> bool {
    function.children().any(|c| c.kind() == "async")
}

/// A route decorator: framework, methods, and path.
struct Route {
    framework: &'static str,
    methods: Vec<String>,
    path: Option<String>,
}

fn route_decorator(decorator: Node<'_>) -> Option<Route> {
    let call = decorator.named_children().find_map(Call::parse)?;
    let path = call.positional.first().and_then(|p| string_value(*p)).map(|p| normalize_path(&p));
    let methods_kw = call.keyword("methods").map(string_list);

    if call.function == "api_view" {
        let methods = call.positional.first().map(|m| string_list(*m)).unwrap_or_default();
        return Some(Route {
            framework: "django",
            methods: if methods.is_empty() { vec!["GET".to_string()] } else { methods },
            path: None,
        });
    }
    let (_, attribute) = call.function.rsplit_once('.')?;
    if HTTP_VERBS.contains(&attribute) {
        return Some(Route {
            framework: "fastapi",
            methods: vec![attribute.to_ascii_uppercase()],
            path,
        });
    }
    if attribute == "route" {
        let methods = methods_kw.filter(|m| !m.is_empty()).unwrap_or_else(|| vec!["GET".to_string()]);
        return Some(Route {
            framework: "flask",
            methods,
            path,
        });
    }
    None
}

fn module_function(function: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    let Some(name) = function.child_by_field("name").map(|n| n.text()) else {
        return;
    };
    let route = decorators(function).into_iter().find_map(route_decorator);
    let Some(route) = route else {
        if name.starts_with('_') {
            return;
        }
        let action = CanonicalAction::new(name, CONFIDENCE_HEURISTIC, ctx.source_at(function.line()));
        if action.crud_kind == CrudKind::Custom || !ctx.admit(CONFIDENCE_HEURISTIC, name) {
            return;
        }
        actions.push(
            action
                .with_method(ExtractionMethod::NameHeuristic)
                .with_framework("django")
                .with_async(is_async(function))
                .with_parameters(function_parameters(function, None, false)),
        );
        return;
    };

    let fastapi = route.framework == "fastapi";
    for method in &route.methods {
        if !ctx.admit(CONFIDENCE_EXPLICIT, name) {
            continue;
        }
        let mut action = CanonicalAction::new(name, CONFIDENCE_EXPLICIT, ctx.source_at(function.line()))
            .with_framework(route.framework)
            .with_async(is_async(function))
            .with_parameters(function_parameters(function, route.path.as_deref(), fastapi));
        action = match &route.path {
            Some(path) => action.with_route(method, path.clone()),
            None => with_http_method(action, method),
        };
        actions.push(action);
    }
}

/// Set the verb of an action whose path comes from a URL conf elsewhere.
fn with_http_method(mut action: CanonicalAction, method: &str) -> CanonicalAction {
    let method = method.to_ascii_uppercase();
    if let Some(kind) = crud_from_http(&method) {
        action.crud_kind = kind;
    }
    action.http_method = Some(method);
    action
}

fn is_view_class(class: Node<'_>) -> bool {
    superclasses(class).iter().any(|base| {
        let last = base.rsplit('.').next().unwrap_or(base);
        VIEW_BASES.iter().any(|v| last.contains(v))
    })
}

fn view_method(function: Node<'_>, class: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    let (Some(name), Some(owner)) = (
        function.child_by_field("name").map(|n| n.text()),
        class.child_by_field("name").map(|n| n.text()),
    ) else {
        return;
    };
    let framework = if superclasses(class).iter().any(|b| b.ends_with("MethodView")) {
        "flask"
    } else {
        "django"
    };
    let source = ctx.source_at(function.line());
    let params = function_parameters(function, None, false);

    let action = if HTTP_VERBS.contains(&name) {
        if !ctx.admit(CONFIDENCE_STRUCTURAL, name) {
            return;
        }
        with_http_method(CanonicalAction::new(name, CONFIDENCE_STRUCTURAL, source), name)
    } else if let Some((_, kind, method)) = VIEWSET_ACTIONS.iter().find(|(action, _, _)| *action == name) {
        if !ctx.admit(CONFIDENCE_EXPLICIT, name) {
            return;
        }
        with_http_method(CanonicalAction::new(name, CONFIDENCE_EXPLICIT, source), method).with_crud(*kind)
    } else if let Some(extra) = decorators(function)
        .into_iter()
        .filter_map(|d| d.named_children().find_map(Call::parse))
        .find(|c| c.function == "action")
    {
        // DRF `@action(detail=True, methods=["post"])`.
        if !ctx.admit(CONFIDENCE_EXPLICIT, name) {
            return;
        }
        let method = extra
            .keyword("methods")
            .map(string_list)
            .and_then(|m| m.into_iter().next())
            .unwrap_or_else(|| "GET".to_string());
        let mut action = with_http_method(CanonicalAction::new(name, CONFIDENCE_EXPLICIT, source), &method);
        if let Some(url_path) = extra.keyword("url_path").and_then(string_value) {
            action.path = Some(normalize_path(&url_path));
        }
        action
    } else {
        return;
    };

    actions.push(
        action
            .with_framework(framework)
            .with_owner(owner)
            .with_async(is_async(function))
            .with_parameters(params),
    );
}
