//! Java extractor: JPA entities, Spring MVC controllers, Spring Data
//! repositories.
//!
//! Declarations are walked with the grammar; annotation argument lists are
//! scanned with a regex since their values are constant expressions.

use std::sync::LazyLock;

use regex::Regex;

use super::naming::{entity_name, to_snake_case};
use super::routes::{join_paths, normalize_path, path_parameters};
use super::type_map::{java_type, make_field, BIGINT};
use super::{ExtractionContext, Extractor};
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{
    ActionParameter, CanonicalAction, CanonicalEntity, CanonicalField, CrudKind, ExtractionMethod,
    ForeignKey, ParamLocation, TypeTier,
};
use crate::relationships::resolve_reference;
use revspec_core::constants::{CONFIDENCE_EXPLICIT, CONFIDENCE_NAMED, CONFIDENCE_STRUCTURAL};

/// One `key = value` or positional value of an annotation argument list.
static ANNOTATION_ARG: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?:(\w+)\s*=\s*)?(\{[^}]*\}|"(?:[^"\\]|\\.)*"|[\w.$]+)"#).ok()
});

const MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("PatchMapping", "PATCH"),
    ("DeleteMapping", "DELETE"),
];

const REPOSITORY_BASES: &[&str] = &[
    "CrudRepository",
    "JpaRepository",
    "PagingAndSortingRepository",
    "ListCrudRepository",
    "ReactiveCrudRepository",
];

/// Methods every Spring Data repository inherits.
const REPOSITORY_BASE_METHODS: &[(&str, CrudKind)] = &[
    ("save", CrudKind::Create),
    ("findById", CrudKind::Read),
    ("findAll", CrudKind::Read),
    ("deleteById", CrudKind::Delete),
];

/// Servlet and framework types injected into handler methods.
const INJECTED_TYPES: &[&str] = &[
    "HttpServletRequest",
    "HttpServletResponse",
    "Principal",
    "Model",
    "BindingResult",
    "Authentication",
    "Pageable",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaExtractor;

impl Extractor for JavaExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Java
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        for decl in root.find_all("enum_declaration") {
            let Some(name) = decl.child_by_field("name") else { continue };
            let values = decl
                .child_by_field("body")
                .map(|body| {
                    body.children_of_kind("enum_constant")
                        .iter()
                        .filter_map(|c| c.child_by_field("name").map(|n| n.text().to_string()))
                        .collect()
                })
                .unwrap_or_default();
            ctx.register_enum(name.text(), values);
        }

        let classes: Vec<Node<'_>> = root
            .find_all("class_declaration")
            .into_iter()
            .filter(|c| has_annotation(*c, "Entity"))
            .collect();
        for class in &classes {
            if let Some(name) = class.child_by_field("name") {
                ctx.register_entity_alias(name.text(), entity_name(name.text()));
            }
        }
        classes
            .into_iter()
            .filter_map(|class| jpa_entity(class, ctx))
            .collect()
    }

    fn extract_actions(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalAction> {
        let root = tree.root();
        let mut actions = Vec::new();
        for class in root.find_all("class_declaration") {
            if has_annotation(class, "RestController") || has_annotation(class, "Controller") {
                controller_actions(class, ctx, &mut actions);
            }
        }
        for interface in root.find_all("interface_declaration") {
            repository_actions(interface, ctx, &mut actions);
        }
        actions
    }
}

// ---- Annotations ----

/// A parsed `@Name(args)` annotation.
#[derive(Debug, Clone)]
struct Annotation {
    name: String,
    args: Vec<(Option<String>, String)>,
}

impl Annotation {
    fn parse(node: Node<'_>) -> Option<Self> {
        let full = node.child_by_field("name")?.text();
        let name = full.rsplit('.').next().unwrap_or(full).to_string();
        let args = node
            .child_by_field("arguments")
            .and_then(|a| {
                let text = a.text().trim();
                let inner = text.strip_prefix('(')?.strip_suffix(')')?;
                let re = ANNOTATION_ARG.as_ref()?;
                Some(
                    re.captures_iter(inner)
                        .map(|c| (c.get(1).map(|k| k.as_str().to_string()), c[2].to_string()))
                        .collect(),
                )
            })
            .unwrap_or_default();
        Some(Self { name, args })
    }

    fn named(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v.as_str())
    }

    /// `value`, `path`, or the positional argument.
    fn value(&self) -> Option<&str> {
        self.named("value")
            .or_else(|| self.named("path"))
            .or_else(|| self.args.iter().find(|(k, _)| k.is_none()).map(|(_, v)| v.as_str()))
    }

    fn string(&self, key: &str) -> Option<String> {
        self.named(key).map(literal)
    }

    fn is_false(&self, key: &str) -> bool {
        self.named(key) == Some("false")
    }

    fn is_true(&self, key: &str) -> bool {
        self.named(key) == Some("true")
    }
}

/// `"x"` to `x`, `{"a", "b"}` to `a`, `Foo.class` to `Foo`, `RequestMethod.GET` to `GET`.
fn literal(value: &str) -> String {
    let value = value.trim();
    let value = value
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .map_or(value, |inner| inner.split(',').next().unwrap_or("").trim());
    if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        return inner.to_string();
    }
    let value = value.strip_suffix(".class").unwrap_or(value);
    value.rsplit('.').next().unwrap_or(value).to_string()
}

fn annotations(node: Node<'_>) -> Vec<Annotation> {
    node.child_of_kind("modifiers")
        .map(|m| {
            m.named_children()
                .filter(|c| matches!(c.kind(), "annotation" | "marker_annotation"))
                .filter_map(Annotation::parse)
                .collect()
        })
        .unwrap_or_default()
}

fn has_annotation(node: Node<'_>, name: &str) -> bool {
    annotations(node).iter().any(|a| a.name == name)
}

fn find_annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.name == name)
}

/// Type arguments of `List<Foo>` / `Map<K, V>`, if generic.
fn type_arguments(ty: &str) -> Option<Vec<String>> {
    let open = ty.find('<')?;
    let close = ty.rfind('>')?;
    (open < close).then(|| {
        ty[open + 1..close]
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    })
}

fn raw_type(ty: &str) -> &str {
    ty.split('<').next().unwrap_or(ty).trim()
}

fn is_collection(ty: &str) -> bool {
    matches!(raw_type(ty), "List" | "Set" | "Collection" | "Iterable" | "ArrayList" | "HashSet")
}

// ---- JPA entities ----

fn jpa_entity(class: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalEntity> {
    let class_name = class.child_by_field("name")?.text();
    let name = entity_name(class_name);
    let class_annotations = annotations(class);
    let table = find_annotation(&class_annotations, "Table");
    let table_name = table
        .and_then(|t| t.string("name"))
        .unwrap_or_else(|| format!("{}s", to_snake_case(&name)));
    let schema = table
        .and_then(|t| t.string("schema"))
        .unwrap_or_else(|| ctx.default_schema().to_string());

    let mut entity = CanonicalEntity::new(name, schema, table_name, ctx.source_at(class.line()));
    let mut pk = Vec::new();

    let body = class.child_by_field("body")?;
    for decl in body.children_of_kind("field_declaration") {
        let modifiers = decl.child_of_kind("modifiers").map(|m| m.text()).unwrap_or_default();
        if modifiers.split_whitespace().any(|w| w == "static") {
            continue;
        }
        let field_annotations = annotations(decl);
        if find_annotation(&field_annotations, "Transient").is_some() {
            continue;
        }
        let Some(ty) = decl.child_by_field("type").map(|t| t.text()) else { continue };
        for declarator in decl.children_by_field("declarator") {
            let Some(java_name) = declarator.child_by_field("name").map(|n| n.text()) else {
                continue;
            };
            let Some((field, is_id)) = jpa_field(java_name, ty, &field_annotations, &mut entity, ctx, decl.line())
            else {
                continue;
            };
            if is_id {
                pk.push(field.name.clone());
            }
            if let Err(e) = entity.push_field(field) {
                ctx.record(e);
            }
        }
    }

    if let Err(e) = entity.set_primary_key(pk) {
        ctx.record(e);
    }
    Some(entity)
}

/// Build one column. Returns `None` for inverse-side collections.
fn jpa_field(
    java_name: &str,
    ty: &str,
    annotations: &[Annotation],
    entity: &mut CanonicalEntity,
    ctx: &mut ExtractionContext,
    line: u32,
) -> Option<(CanonicalField, bool)> {
    let column = find_annotation(annotations, "Column");
    let is_id = find_annotation(annotations, "Id").is_some() || find_annotation(annotations, "EmbeddedId").is_some();
    let not_null = is_id
        || column.is_some_and(|c| c.is_false("nullable"))
        || annotations.iter().any(|a| matches!(a.name.as_str(), "NotNull" | "NonNull" | "NotBlank"));
    let column_name = column
        .and_then(|c| c.string("name"))
        .unwrap_or_else(|| to_snake_case(java_name));

    let relation = annotations
        .iter()
        .find(|a| matches!(a.name.as_str(), "ManyToOne" | "OneToOne" | "OneToMany" | "ManyToMany"));
    if let Some(relation) = relation {
        let target = relation
            .named("targetEntity")
            .map(literal)
            .or_else(|| type_arguments(ty).and_then(|args| args.last().cloned()))
            .unwrap_or_else(|| raw_type(ty).to_string());
        let target_entity = entity_name(&target);
        return match relation.name.as_str() {
            "OneToMany" => {
                tracing::trace!(entity = %entity.name, field = %java_name, "skipping inverse-side collection");
                None
            }
            "ManyToMany" => {
                let mut field = make_field(&column_name, &target, BIGINT).with_list(true);
                field.set_reference(target_entity);
                Some((field, false))
            }
            _ => {
                let join = find_annotation(annotations, "JoinColumn");
                let join_column = join
                    .and_then(|j| j.string("name"))
                    .unwrap_or_else(|| format!("{}_id", to_snake_case(java_name)));
                let nullable = !(relation.is_false("optional") || join.is_some_and(|j| j.is_false("nullable")));
                let mut field = make_field(&join_column, &target, BIGINT).with_nullable(nullable);
                field.set_reference(target_entity.clone());
                let mut fk = ForeignKey::new(
                    join_column,
                    format!("{}s", to_snake_case(&target_entity)),
                    target_entity,
                );
                if let Some(referenced) = join.and_then(|j| j.string("referencedColumnName")) {
                    fk = fk.with_target_column(referenced);
                }
                entity.foreign_keys.push(fk);
                Some((field, false))
            }
        };
    }

    let (element, is_list) = match type_arguments(ty) {
        Some(args) if is_collection(ty) => (args.last().cloned().unwrap_or_default(), true),
        _ => (ty.to_string(), ty.ends_with("[]") && ty != "byte[]"),
    };
    let element = element.trim_end_matches("[]").to_string();
    let element = if element == "byte" && ty == "byte[]" { ty.to_string() } else { element };

    let mut field = if find_annotation(annotations, "Embedded").is_some() {
        CanonicalField::new(&column_name, TypeTier::Composite, raw_type(&element), &element, "JSONB")
    } else if let Some(values) = ctx.enum_values(&element) {
        let storage = find_annotation(annotations, "Enumerated")
            .and_then(|e| e.value())
            .map(literal);
        let postgres = if storage.as_deref() == Some("ORDINAL") { "INTEGER" } else { "TEXT" };
        CanonicalField::new(&column_name, TypeTier::Scalar, &element, &element, postgres)
            .with_enum_values(values.to_vec())
    } else {
        if find_annotation(annotations, "Enumerated").is_some() {
            ctx.skip_construct(
                format!("enum {element}"),
                line,
                "enum declared outside this file; values unknown",
            );
        }
        make_field(&column_name, &element, java_type(raw_type(&element)))
    };
    field = field.with_list(is_list).with_nullable(!not_null);

    if let Some(column) = column {
        if let Some(length) = column.named("length").filter(|_| field.canonical_type == "text") {
            field.postgres_type = format!("VARCHAR({length})");
        }
        if column.is_true("unique") {
            entity.unique_constraints.push(vec![column_name.clone()]);
        }
        if let Some(definition) = column.string("columnDefinition") {
            field.postgres_type = definition.to_ascii_uppercase();
        }
    }
    if field.type_tier != TypeTier::Composite && field.enum_values.is_none() {
        resolve_reference(&mut field, None, ctx, is_id);
    }
    Some((field, is_id))
}

// ---- Spring MVC ----

fn request_mapping(annotations: &[Annotation]) -> Option<(String, String)> {
    for (annotation, method) in MAPPINGS {
        if let Some(a) = find_annotation(annotations, annotation) {
            return Some((method.to_string(), a.value().map(literal).unwrap_or_default()));
        }
    }
    let a = find_annotation(annotations, "RequestMapping")?;
    let method = a.named("method").map_or_else(|| "GET".to_string(), literal);
    Some((method.to_ascii_uppercase(), a.value().map(literal).unwrap_or_default()))
}

fn handler_parameters(method: Node<'_>) -> Vec<ActionParameter> {
    let Some(params) = method.child_by_field("parameters") else {
        return Vec::new();
    };
    params
        .children_of_kind("formal_parameter")
        .iter()
        .filter_map(|p| {
            let name = p.child_by_field("name")?.text();
            let ty = p.child_by_field("type")?.text();
            if INJECTED_TYPES.contains(&raw_type(ty)) {
                return None;
            }
            let param_annotations = annotations(*p);
            let location = if find_annotation(&param_annotations, "PathVariable").is_some() {
                ParamLocation::Path
            } else if find_annotation(&param_annotations, "RequestBody").is_some() {
                ParamLocation::Body
            } else if find_annotation(&param_annotations, "RequestParam").is_some() {
                ParamLocation::Query
            } else {
                ParamLocation::Unknown
            };
            let bound_name = param_annotations
                .iter()
                .find(|a| matches!(a.name.as_str(), "PathVariable" | "RequestParam"))
                .and_then(|a| a.named("name").or_else(|| a.value()))
                .map(literal)
                .unwrap_or_else(|| name.to_string());
            Some(ActionParameter::new(bound_name, Some(ty.to_string()), location))
        })
        .collect()
}

fn controller_actions(class: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    let Some(class_name) = class.child_by_field("name").map(|n| n.text()) else {
        return;
    };
    let prefix = find_annotation(&annotations(class), "RequestMapping")
        .and_then(|a| a.value())
        .map(literal)
        .unwrap_or_default();
    let Some(body) = class.child_by_field("body") else {
        return;
    };
    for method in body.children_of_kind("method_declaration") {
        let Some((http_method, path)) = request_mapping(&annotations(method)) else {
            continue;
        };
        let Some(name) = method.child_by_field("name").map(|n| n.text()) else {
            continue;
        };
        let full_path = normalize_path(&join_paths(&prefix, &path));
        let mut parameters = handler_parameters(method);
        for declared in path_parameters(&full_path) {
            if !parameters.iter().any(|p| p.name == declared.name) {
                parameters.push(declared);
            }
        }
        if !ctx.admit(CONFIDENCE_EXPLICIT, name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_EXPLICIT, ctx.source_at(method.line()))
                .with_route(&http_method, full_path)
                .with_framework("spring")
                .with_owner(class_name)
                .with_parameters(parameters),
        );
    }
}

// ---- Spring Data ----

/// Base interface and its type arguments, when the interface extends a
/// Spring Data repository.
fn repository_base(interface: Node<'_>) -> Option<String> {
    let extends = interface.child_of_kind("extends_interfaces")?;
    let text = extends.text();
    REPOSITORY_BASES
        .iter()
        .find(|base| text.contains(*base))
        .map(|base| base.to_string())
}

fn repository_actions(interface: Node<'_>, ctx: &mut ExtractionContext, actions: &mut Vec<CanonicalAction>) {
    if repository_base(interface).is_none() {
        return;
    }
    let Some(owner) = interface.child_by_field("name").map(|n| n.text()) else {
        return;
    };
    let line = interface.line();
    for (name, kind) in REPOSITORY_BASE_METHODS {
        if !ctx.admit(CONFIDENCE_STRUCTURAL, name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(*name, CONFIDENCE_STRUCTURAL, ctx.source_at(line))
                .with_crud(*kind)
                .with_framework("spring-data")
                .with_owner(owner),
        );
    }

    let Some(body) = interface.child_by_field("body") else {
        return;
    };
    for method in body.children_of_kind("method_declaration") {
        let Some(name) = method.child_by_field("name").map(|n| n.text()) else {
            continue;
        };
        if REPOSITORY_BASE_METHODS.iter().any(|(base, _)| *base == name) {
            continue;
        }
        if !ctx.admit(CONFIDENCE_NAMED, name) {
            continue;
        }
        actions.push(
            CanonicalAction::new(name, CONFIDENCE_NAMED, ctx.source_at(method.line()))
                .with_method(ExtractionMethod::NameHeuristic)
                .with_framework("spring-data")
                .with_owner(owner)
                .with_parameters(handler_parameters(method)),
        );
    }
}
