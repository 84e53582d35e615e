//! Foreign keys declared by `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY`.

use std::sync::LazyLock;

use regex::Regex;

use crate::adapters::lexer::unquote;
use crate::adapters::{Node, SyntaxTree};
use crate::extractors::naming::entity_name;
use crate::model::ForeignKey;

/// One `ADD [CONSTRAINT c] FOREIGN KEY (cols) REFERENCES [s.]t [(cols)]` clause.
/// Case-insensitive and tolerant of newlines and extra whitespace.
static FK_CLAUSE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)\bADD\s+(?:CONSTRAINT\s+("?[\w$]+"?)\s+)?FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+((?:"?[\w$]+"?\s*\.\s*)?"?[\w$]+"?)\s*(?:\(([^)]*)\))?"#,
    )
    .ok()
});

/// A foreign key together with the table that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableForeignKey {
    pub schema: Option<String>,
    pub table: String,
    pub foreign_key: ForeignKey,
}

/// Split `s.t` / `"s"."t"` / `t` into optional schema and name.
pub fn split_qualified(name: &str) -> (Option<String>, String) {
    let parts: Vec<String> = name
        .split('.')
        .map(|p| unquote(p.trim()))
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => (None, String::new()),
        [table] => (None, table.clone()),
        [.., schema, table] => (Some(schema.clone()), table.clone()),
    }
}

fn column_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|c| unquote(c.trim()))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Every FK clause in the text of one `ALTER TABLE` statement. A multi-column
/// key yields one `ForeignKey` per column pair.
pub fn foreign_keys_in_alter(
    schema: Option<&str>,
    table: &str,
    statement: &str,
) -> Vec<TableForeignKey> {
    let Some(re) = FK_CLAUSE.as_ref() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for caps in re.captures_iter(statement) {
        let constraint = caps.get(1).map(|m| unquote(m.as_str()));
        let sources = caps.get(2).map(|m| column_list(m.as_str())).unwrap_or_default();
        let (target_schema, target_table) = caps
            .get(3)
            .map(|m| split_qualified(m.as_str()))
            .unwrap_or((None, String::new()));
        let targets = caps.get(4).map(|m| column_list(m.as_str())).unwrap_or_default();
        if target_table.is_empty() {
            continue;
        }

        for (i, source) in sources.iter().enumerate() {
            let mut fk = ForeignKey::new(source.clone(), target_table.clone(), entity_name(&target_table));
            if let Some(name) = &constraint {
                fk = fk.with_constraint_name(name.clone());
            }
            if let Some(s) = &target_schema {
                fk = fk.with_target_schema(s.clone());
            }
            if let Some(col) = targets.get(i) {
                fk = fk.with_target_column(col.clone());
            }
            out.push(TableForeignKey {
                schema: schema.map(str::to_string),
                table: table.to_string(),
                foreign_key: fk,
            });
        }
    }
    out
}

/// Qualified name of an `alter_table` or `create_table` node.
pub fn table_name_of(node: Node<'_>) -> Option<(Option<String>, String)> {
    let name = node.child_by_field("name")?;
    let (schema, table) = split_qualified(name.text());
    (!table.is_empty()).then_some((schema, table))
}

/// All `ALTER TABLE` foreign keys in a SQL tree, in document order.
pub fn foreign_keys_from_tree(tree: &SyntaxTree) -> Vec<TableForeignKey> {
    tree.root()
        .children_of_kind("alter_table")
        .into_iter()
        .filter_map(|alter| {
            let (schema, table) = table_name_of(alter)?;
            Some(foreign_keys_in_alter(schema.as_deref(), &table, alter.text()))
        })
        .flatten()
        .collect()
}
