//! PostgreSQL DDL extractor.
//!
//! Tables become entities. Inline and table-level constraints, `COMMENT ON`
//! descriptions, and same-file `ALTER TABLE` foreign keys are folded in.

use revspec_core::FxHashMap;

use super::naming::entity_name;
use super::type_map::{make_field, sql_type};
use super::{ExtractionContext, Extractor};
use crate::adapters::lexer::unquote;
use crate::adapters::{Node, SyntaxTree};
use crate::language::SourceLanguage;
use crate::model::{CanonicalEntity, CanonicalField, ForeignKey};
use crate::relationships::{
    apply_foreign_keys, foreign_keys_from_tree, resolve_reference, split_qualified,
};
use crate::relationships::sql_fk::table_name_of;

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlExtractor;

impl Extractor for SqlExtractor {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Sql
    }

    fn extract_entities(&self, tree: &SyntaxTree, ctx: &mut ExtractionContext) -> Vec<CanonicalEntity> {
        let root = tree.root();
        let mut entities = Vec::new();

        for statement in root.named_children() {
            match statement.kind() {
                "create_table" => {
                    if let Some(entity) = extract_table(statement, ctx) {
                        ctx.register_entity(entity.name.clone());
                        entities.push(entity);
                    }
                }
                "unsupported_statement" => ctx.skip_construct(
                    "CREATE TABLE",
                    statement.line(),
                    "table without a column list (AS / PARTITION OF)",
                ),
                _ => {}
            }
        }

        for comment in root.children_of_kind("comment_on") {
            apply_comment(comment, &mut entities, ctx);
        }

        apply_foreign_keys(&mut entities, &foreign_keys_from_tree(tree));
        entities
    }
}

/// Column facts gathered before reference classification.
#[derive(Default)]
struct TableFacts {
    inline_pk: Vec<String>,
    table_pk: Option<Vec<String>>,
    /// Column name to explicit reference target entity.
    explicit: FxHashMap<String, String>,
}

fn identifiers(node: Node<'_>) -> Vec<String> {
    node.children_of_kind("identifier")
        .iter()
        .map(|n| unquote(n.text()))
        .collect()
}

fn extract_table(node: Node<'_>, ctx: &mut ExtractionContext) -> Option<CanonicalEntity> {
    let (schema, table) = table_name_of(node)?;
    let schema = schema.unwrap_or_else(|| ctx.default_schema().to_string());
    let mut entity = CanonicalEntity::new(entity_name(&table), schema, table, ctx.source_at(node.line()));
    let mut facts = TableFacts::default();

    for element in node.named_children() {
        match element.kind() {
            "column_definition" => column(element, &mut entity, &mut facts, ctx),
            "table_constraint" => table_constraint(element, &mut entity, &mut facts),
            "unsupported_element" => ctx.skip_construct(
                element.text().split_whitespace().next().unwrap_or("element"),
                element.line(),
                "table element has no canonical form",
            ),
            _ => {}
        }
    }

    // A table-level primary key replaces inline markers.
    let pk = facts.table_pk.take().unwrap_or(std::mem::take(&mut facts.inline_pk));
    for column in &pk {
        if let Some(field) = entity.field_mut(column) {
            field.nullable = false;
        }
    }
    if let Err(e) = entity.set_primary_key(pk) {
        ctx.record(e);
    }

    let names: Vec<String> = entity.field_names().map(str::to_string).collect();
    for name in names {
        let is_pk = entity.is_primary_key_column(&name);
        let explicit = facts.explicit.get(&name).cloned();
        if let Some(field) = entity.field_mut(&name) {
            resolve_reference(field, explicit.as_deref(), ctx, is_pk);
        }
    }
    Some(entity)
}

fn column(
    node: Node<'_>,
    entity: &mut CanonicalEntity,
    facts: &mut TableFacts,
    ctx: &mut ExtractionContext,
) {
    let Some(name_node) = node.child_by_field("name") else {
        return;
    };
    let name = unquote(name_node.text());
    let native = node.child_by_field("type").map(|t| t.text()).unwrap_or("TEXT");
    let (ty, is_array) = sql_type(native);

    let mut field: CanonicalField = make_field(&name, native, ty).with_list(is_array);
    field.postgres_type = native.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();

    for constraint in node.named_children() {
        match constraint.kind() {
            "not_null_constraint" => field.nullable = false,
            "null_constraint" => field.nullable = true,
            "primary_key_constraint" => {
                field.nullable = false;
                facts.inline_pk.push(name.clone());
            }
            "unique_constraint" => entity.unique_constraints.push(vec![name.clone()]),
            "default_constraint" => {
                if let Some(value) = constraint.child_by_field("value") {
                    field.default = Some(value.text().to_string());
                }
            }
            "check_constraint" => {
                if let Some(expr) = constraint.child_by_field("expression") {
                    entity.check_constraints.push(expr.text().to_string());
                }
            }
            "references_constraint" => {
                if let Some(fk) = references(constraint, &[name.clone()]).into_iter().next() {
                    facts.explicit.insert(name.clone(), fk.target_entity.clone());
                    entity.foreign_keys.push(fk);
                }
            }
            _ => {}
        }
    }

    if let Err(e) = entity.push_field(field) {
        ctx.record(e);
    }
}

/// Foreign keys for `sources` against a `references_constraint` node.
fn references(node: Node<'_>, sources: &[String]) -> Vec<ForeignKey> {
    let Some(target) = node.child_by_field("table") else {
        return Vec::new();
    };
    let (target_schema, target_table) = split_qualified(target.text());
    let target_columns = node
        .child_by_field("columns")
        .map(identifiers)
        .unwrap_or_default();

    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let mut fk = ForeignKey::new(source.clone(), target_table.clone(), entity_name(&target_table));
            if let Some(s) = &target_schema {
                fk = fk.with_target_schema(s.clone());
            }
            if let Some(c) = target_columns.get(i) {
                fk = fk.with_target_column(c.clone());
            }
            fk
        })
        .collect()
}

fn table_constraint(node: Node<'_>, entity: &mut CanonicalEntity, facts: &mut TableFacts) {
    let constraint_name = node.child_by_field("name").map(|n| unquote(n.text()));
    for inner in node.named_children() {
        let columns = || {
            inner
                .child_by_field("columns")
                .map(identifiers)
                .unwrap_or_default()
        };
        match inner.kind() {
            "primary_key_constraint" => facts.table_pk = Some(columns()),
            "unique_constraint" => entity.unique_constraints.push(columns()),
            "check_constraint" => {
                if let Some(expr) = inner.child_by_field("expression") {
                    entity.check_constraints.push(expr.text().to_string());
                }
            }
            "foreign_key_constraint" => {
                let sources = columns();
                let Some(refs) = inner.child_of_kind("references_constraint") else {
                    continue;
                };
                for mut fk in references(refs, &sources) {
                    if let Some(name) = &constraint_name {
                        fk = fk.with_constraint_name(name.clone());
                    }
                    facts
                        .explicit
                        .insert(fk.source_column.clone(), fk.target_entity.clone());
                    entity.foreign_keys.push(fk);
                }
            }
            _ => {}
        }
    }
}

fn position_of(entities: &[CanonicalEntity], schema: Option<&String>, table: &str) -> Option<usize> {
    entities
        .iter()
        .position(|e| e.table_name == table && schema.map_or(true, |s| &e.schema == s))
}

/// `COMMENT ON TABLE t IS '...'` / `COMMENT ON COLUMN t.c IS '...'`.
fn apply_comment(node: Node<'_>, entities: &mut [CanonicalEntity], ctx: &mut ExtractionContext) {
    let (Some(kind), Some(name), Some(comment)) = (
        node.child_by_field("kind"),
        node.child_by_field("name"),
        node.child_by_field("comment"),
    ) else {
        return;
    };
    let text = unquote(comment.text());
    let parts = identifiers(name);

    match kind.text().to_ascii_uppercase().as_str() {
        "TABLE" => {
            let Some((table, rest)) = parts.split_last() else {
                return;
            };
            if let Some(i) = position_of(entities, rest.last(), table) {
                entities[i].description = Some(text);
            }
        }
        "COLUMN" => {
            let [rest @ .., table, column] = parts.as_slice() else {
                return;
            };
            if let Some(i) = position_of(entities, rest.last(), table) {
                if let Some(field) = entities[i].field_mut(column) {
                    field.description = Some(text);
                }
            }
        }
        other => ctx.skip_construct(
            format!("COMMENT ON {other}"),
            node.line(),
            "only table and column comments are kept",
        ),
    }
}
