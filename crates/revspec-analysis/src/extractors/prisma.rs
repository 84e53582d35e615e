//! Prisma schema extractor.
//!
//! Models become entities. Enums are registered in the context first so that
//! enum-typed fields resolve regardless of declaration order.

use revspec_core::{FxHashMap, FxHashSet};

use super::naming::to_snake_case;
use super::type_map::{is_prisma_scalar, make_field, prisma_type, BIGINT};
use super::{ExtractionContext, Extractor};
use crate::adapters::lexer::unquote;
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{CanonicalEntity, CanonicalField, ForeignKey, TypeTier};
use crate::relationships::resolve_reference;

#[derive(Debug, Default, Clone, Copy)]
pub struct PrismaExtractor;

impl Extractor for PrismaExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Prisma
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        let mut models = ModelIndex::default();

        for block in root.named_children() {
            let Some(name) = block.child_by_field("name").map(|n| n.text().to_string()) else {
                continue;
            };
            match block.kind() {
                "enum_block" => {
                    let values = block
                        .children_of_kind("enum_value")
                        .iter()
                        .map(|v| v.text().to_string())
                        .collect();
                    ctx.register_enum(name, values);
                }
                "model_block" => {
                    models.tables.insert(name.clone(), table_name(block, &name));
                    ctx.register_entity(name);
                }
                "type_block" => {
                    models.composites.insert(name);
                }
                _ => {}
            }
        }

        root.children_of_kind("model_block")
            .into_iter()
            .filter_map(|model| extract_model(model, &models, ctx))
            .collect()
    }
}

/// Per-schema facts gathered before any model is extracted.
#[derive(Default)]
struct ModelIndex {
    /// Model name to its table name, honouring `@@map`.
    tables: FxHashMap<String, String>,
    composites: FxHashSet<String>,
}

impl ModelIndex {
    fn table_of(&self, model: &str) -> String {
        self.tables
            .get(model)
            .cloned()
            .unwrap_or_else(|| format!("{}s", to_snake_case(model)))
    }
}

/// Name and parsed argument list of one `@attr(...)` / `@@attr(...)`.
struct Attribute<'t> {
    name: &'t str,
    args: Vec<(Option<&'t str>, &'t str)>,
}

impl<'t> Attribute<'t> {
    fn parse(node: Node<'t>) -> Option<Self> {
        let name = node.child_by_field("name")?.text();
        let args = node
            .child_by_field("arguments")
            .map(|args| {
                args.children_of_kind("argument")
                    .iter()
                    .filter_map(|arg| {
                        let key = arg.child_by_field("key").map(|k| k.text());
                        Some((key, arg.child_by_field("value")?.text()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { name, args })
    }

    /// Positional first argument, or the named one.
    fn arg(&self, key: &str) -> Option<&'t str> {
        self.args
            .iter()
            .find(|(k, _)| *k == Some(key))
            .or_else(|| self.args.iter().find(|(k, _)| k.is_none()))
            .map(|(_, v)| *v)
    }

    fn named(&self, key: &str) -> Option<&'t str> {
        self.args.iter().find(|(k, _)| *k == Some(key)).map(|(_, v)| *v)
    }

    /// Raw argument text, as written between the parentheses.
    fn raw_args(&self) -> String {
        self.args
            .iter()
            .map(|(k, v)| match k {
                Some(k) => format!("{k}: {v}"),
                None => v.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `[a, b]` or `a` to a list of names.
fn name_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn block_attributes(model: Node<'_>) -> Vec<Attribute<'_>> {
    model
        .children_of_kind("block_attribute")
        .into_iter()
        .filter_map(Attribute::parse)
        .collect()
}

/// `@@map("...")` when present, otherwise the pluralised snake-case name.
fn table_name(model: Node<'_>, name: &str) -> String {
    block_attributes(model)
        .iter()
        .find(|a| a.name == "map")
        .and_then(|a| a.arg("name"))
        .map(unquote)
        .unwrap_or_else(|| format!("{}s", to_snake_case(name)))
}

fn extract_model(
    model: Node<'_>,
    models: &ModelIndex,
    ctx: &mut ExtractionContext,
) -> Option<CanonicalEntity> {
    let name = model.child_by_field("name")?.text().to_string();
    let block_attrs = block_attributes(model);
    let table_name = models.table_of(&name);
    let schema = block_attrs
        .iter()
        .find(|a| a.name == "schema")
        .and_then(|a| a.arg("name"))
        .map(unquote)
        .unwrap_or_else(|| ctx.default_schema().to_string());

    let mut entity = CanonicalEntity::new(name.clone(), schema, table_name, ctx.source_at(model.line()));
    let mut pk: Vec<String> = Vec::new();
    let mut explicit: FxHashMap<String, String> = FxHashMap::default();

    for field_node in model.children_of_kind("model_field") {
        if let Some(field) = model_field(field_node, &mut entity, &mut pk, &mut explicit, models, ctx) {
            if let Err(e) = entity.push_field(field) {
                ctx.record(e);
            }
        }
    }

    for attr in &block_attrs {
        match attr.name {
            "id" => pk = attr.arg("fields").map(name_list).unwrap_or_default(),
            "unique" => {
                if let Some(fields) = attr.arg("fields") {
                    entity.unique_constraints.push(name_list(fields));
                }
            }
            "map" | "schema" | "index" | "ignore" => {}
            other => ctx.skip_construct(format!("@@{other}"), model.line(), "block attribute has no canonical form"),
        }
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
            if field.type_tier == TypeTier::Composite || field.enum_values.is_some() {
                continue;
            }
            resolve_reference(field, target.as_deref(), ctx, is_pk);
        }
    }
    Some(entity)
}

/// Build one field. Relation object fields keep the related model as their
/// native type and become references once the model is resolved; their
/// `@relation` arguments become foreign keys on the scalar columns.
fn model_field(
    node: Node<'_>,
    entity: &mut CanonicalEntity,
    pk: &mut Vec<String>,
    explicit: &mut FxHashMap<String, String>,
    models: &ModelIndex,
    ctx: &mut ExtractionContext,
) -> Option<CanonicalField> {
    let name = node.child_by_field("name")?.text().to_string();
    let type_node = node.child_by_field("type")?;
    let type_name = type_node.child_by_field("name")?.text();
    let is_list = type_node.child_of_kind("list_marker").is_some();
    let optional = type_node.child_of_kind("optional_marker").is_some();
    let attrs: Vec<Attribute<'_>> = node
        .children_of_kind("field_attribute")
        .into_iter()
        .filter_map(Attribute::parse)
        .collect();

    if ctx.is_known_entity(type_name) {
        if let Some(relation) = attrs.iter().find(|a| a.name == "relation") {
            let sources = relation.named("fields").map(name_list).unwrap_or_default();
            let targets = relation.named("references").map(name_list).unwrap_or_default();
            for (i, source) in sources.iter().enumerate() {
                let mut fk = ForeignKey::new(source.clone(), models.table_of(type_name), type_name);
                if let Some(target) = targets.get(i) {
                    fk = fk.with_target_column(target.clone());
                }
                if let Some(constraint) = relation.named("map") {
                    fk = fk.with_constraint_name(unquote(constraint));
                }
                explicit.insert(source.clone(), type_name.to_string());
                entity.foreign_keys.push(fk);
            }
        }
        // A list side is never required; the singular side follows its `?`.
        let field = make_field(&name, type_name, BIGINT)
            .with_list(is_list)
            .with_nullable(is_list || optional);
        return Some(field);
    }

    let mut field = if let Some(values) = ctx.enum_values(type_name) {
        CanonicalField::new(&name, TypeTier::Scalar, type_name, type_name, "TEXT")
            .with_enum_values(values.to_vec())
    } else if models.composites.contains(type_name) {
        CanonicalField::new(&name, TypeTier::Composite, type_name, type_name, "JSONB")
    } else {
        if !is_prisma_scalar(type_name) {
            ctx.skip_construct(
                format!("type {type_name}"),
                node.line(),
                "unknown Prisma type mapped to text",
            );
        }
        make_field(&name, type_name, prisma_type(type_name))
    };
    field = field.with_list(is_list).with_nullable(optional);

    for attr in &attrs {
        match attr.name {
            "id" => {
                field.nullable = false;
                pk.push(name.clone());
            }
            "unique" => entity.unique_constraints.push(vec![name.clone()]),
            "default" => field.default = Some(attr.raw_args()),
            "map" | "updatedAt" | "ignore" => {}
            db if db.starts_with("db.") => {
                let native = db.trim_start_matches("db.").to_ascii_uppercase();
                field.postgres_type = if attr.args.is_empty() {
                    native
                } else {
                    format!("{native}({})", attr.raw_args())
                };
            }
            other => ctx.skip_construct(format!("@{other}"), node.line(), "field attribute has no canonical form"),
        }
    }
    Some(field)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::adapters::{PrismaAdapter, SourceAdapter};

    const SCHEMA: &str = r#"
model Post {
  id        Int      @id @default(autoincrement())
  title     String   @db.VarChar(255)
  author    User     @relation(fields: [authorId], references: [id])
  authorId  Int
  createdAt DateTime @default(now())
}

model User {
  id      Int     @id
  email   String  @unique
  role    Role    @default(USER)
  posts   Post[]
  nick    String?
  address Address?
  @@map("app_users")
}

enum Role {
  USER
  ADMIN
}

type Address {
  street String
}
"#;

    fn extract() -> (Vec<CanonicalEntity>, ExtractionContext) {
        let tree = PrismaAdapter::new()
            .parse(SCHEMA, Path::new("schema.prisma"))
            .unwrap();
        let mut ctx = ExtractionContext::new("schema.prisma", SourceLanguage::Prisma);
        let entities = PrismaExtractor.extract_entities(&tree, &mut ctx);
        (entities, ctx)
    }

    #[test]
    fn test_models_and_table_names() {
        let (entities, _) = extract();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].table_name, "posts");
        assert_eq!(entities[1].table_name, "app_users");
    }

    #[test]
    fn test_relation_makes_explicit_reference() {
        let (entities, _) = extract();
        let post = &entities[0];
        assert_eq!(post.field("authorId").unwrap().type_expression(), "ref(User)!");
        let fk = &post.foreign_keys[0];
        assert_eq!(fk.target_column.as_deref(), Some("id"));
        assert_eq!(fk.target_table, "app_users");
    }

    #[test]
    fn test_relation_object_fields_are_references() {
        let (entities, _) = extract();
        let author = entities[0].field("author").unwrap();
        assert_eq!(author.type_expression(), "ref(User)!");
        assert_eq!(author.reference_target.as_deref(), Some("User"));

        let posts = entities[1].field("posts").unwrap();
        assert_eq!(posts.type_expression(), "ref(Post)[]");
        assert!(posts.is_list);
    }

    #[test]
    fn test_scalar_attributes() {
        let (entities, _) = extract();
        let post = &entities[0];
        assert_eq!(post.primary_key(), Some(&["id".to_string()][..]));
        assert_eq!(post.field("title").unwrap().postgres_type, "VARCHAR(255)");
        assert_eq!(post.field("createdAt").unwrap().default.as_deref(), Some("now()"));
        assert_eq!(post.field("createdAt").unwrap().canonical_type, "timestamp");
    }

    #[test]
    fn test_enum_list_and_composite_fields() {
        let (entities, _) = extract();
        let user = &entities[1];
        assert_eq!(user.field("role").unwrap().type_expression(), "enum(USER, ADMIN)!");
        assert_eq!(user.field("nick").unwrap().type_expression(), "text");
        assert_eq!(user.field("address").unwrap().type_tier, TypeTier::Composite);
        assert_eq!(user.field("email").unwrap().canonical_type, "email");
        assert_eq!(user.unique_constraints, vec![vec!["email".to_string()]]);
    }

    #[test]
    fn test_composite_primary_key() {
        let tree = PrismaAdapter::new()
            .parse(
                "model Membership {\n  userId Int\n  teamId Int\n  @@id([userId, teamId])\n}",
                Path::new("m.prisma"),
            )
            .unwrap();
        let mut ctx = ExtractionContext::new("m.prisma", SourceLanguage::Prisma);
        let entity = PrismaExtractor.extract_entity(&tree, &mut ctx).unwrap();
        assert_eq!(
            entity.primary_key(),
            Some(&["userId".to_string(), "teamId".to_string()][..])
        );
        // Primary-key members never take the suffix rule.
        assert_eq!(entity.field("userId").unwrap().type_tier, TypeTier::Basic);
    }
}
