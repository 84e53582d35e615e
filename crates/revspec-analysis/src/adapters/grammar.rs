//! Tree-sitter backed adapter for TypeScript, Rust, Python, and Java.
//!
//! The tree-sitter tree is copied into a `SyntaxTree` arena node by node,
//! keeping kinds, field names, and anonymous tokens.

use std::path::Path;

use revspec_core::errors::ParseError;
use tree_sitter::Parser;

use super::error_tolerant::count_errors;
use super::tree::{SyntaxTree, TreeBuilder};
use super::SourceAdapter;
use crate::language::SourceLanguage;

/// Adapter over one of the bundled tree-sitter grammars.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterAdapter {
    pub(super) language: SourceLanguage,
}

impl TreeSitterAdapter {
    /// Returns `None` for languages that are not parsed by tree-sitter.
    pub fn new(language: SourceLanguage) -> Option<Self> {
        matches!(
            language,
            SourceLanguage::TypeScript
                | SourceLanguage::Rust
                | SourceLanguage::Python
                | SourceLanguage::Java
        )
        .then_some(Self { language })
    }

    fn grammar(&self, path: &Path) -> Option<tree_sitter::Language> {
        match self.language {
            SourceLanguage::TypeScript => {
                let tsx = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("tsx") || e.eq_ignore_ascii_case("jsx"));
                Some(if tsx {
                    tree_sitter_typescript::LANGUAGE_TSX.into()
                } else {
                    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
                })
            }
            SourceLanguage::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            SourceLanguage::Python => Some(tree_sitter_python::LANGUAGE.into()),
            SourceLanguage::Java => Some(tree_sitter_java::LANGUAGE.into()),
            SourceLanguage::Sql | SourceLanguage::Prisma => None,
        }
    }
}

impl SourceAdapter for TreeSitterAdapter {
    fn language(&self) -> SourceLanguage {
        self.language
    }

    fn parse(&self, source: &str, path: &Path) -> Result<SyntaxTree, ParseError> {
        let grammar = self.grammar(path).ok_or_else(|| ParseError::GrammarNotFound {
            language: self.language.name().to_string(),
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|_e| ParseError::GrammarNotFound {
                language: self.language.name().to_string(),
            })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::TreeSitterError {
                path: path.to_path_buf(),
                message: "tree-sitter returned None".to_string(),
            })?;

        let root = tree.root_node();
        let (error_count, first_error_line) = count_errors(root);
        if error_count > 0 {
            return Err(ParseError::Syntax {
                path: path.to_path_buf(),
                line: first_error_line.unwrap_or(1),
                message: format!("{error_count} syntax error(s)"),
            });
        }

        Ok(convert(&tree, self.language, source))
    }
}

/// Copy a tree-sitter tree into the arena with an explicit cursor walk.
fn convert(tree: &tree_sitter::Tree, language: SourceLanguage, source: &str) -> SyntaxTree {
    let root = tree.root_node();
    let mut builder = TreeBuilder::new(root.kind());
    let mut cursor = root.walk();

    if cursor.goto_first_child() {
        let mut depth = 1usize;
        'walk: loop {
            let node = cursor.node();
            builder.open(
                node.kind(),
                cursor.field_name(),
                node.is_named(),
                node.start_byte(),
                node.start_position().row as u32,
            );
            if cursor.goto_first_child() {
                depth += 1;
                continue;
            }
            builder.close(node.end_byte());

            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                depth -= 1;
                if depth == 0 {
                    break 'walk;
                }
                builder.close(cursor.node().end_byte());
            }
        }
    }

    builder.finish(language, source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(language: SourceLanguage, src: &str, file: &str) -> Result<SyntaxTree, ParseError> {
        TreeSitterAdapter::new(language)
            .unwrap()
            .parse(src, Path::new(file))
    }

    #[test]
    fn test_sql_has_no_tree_sitter_adapter() {
        assert!(TreeSitterAdapter::new(SourceLanguage::Sql).is_none());
    }

    #[test]
    fn test_python_tree_conversion() {
        let tree = parse(
            SourceLanguage::Python,
            "@app.get('/users')\nasync def list_users(limit: int):\n    return []\n",
            "api.py",
        )
        .unwrap();
        assert_eq!(tree.root().kind(), "module");
        let func = tree.root().find_first("function_definition").unwrap();
        assert_eq!(func.child_by_field("name").unwrap().text(), "list_users");
        assert_eq!(func.line(), 2);
        let decorated = func.parent().unwrap();
        assert_eq!(decorated.kind(), "decorated_definition");
    }

    #[test]
    fn test_anonymous_tokens_are_kept() {
        let tree = parse(
            SourceLanguage::Python,
            "async def f():\n    pass\n",
            "f.py",
        )
        .unwrap();
        let func = tree.root().find_first("function_definition").unwrap();
        assert!(func.children().any(|c| c.kind() == "async" && !c.is_named()));
    }

    #[test]
    fn test_tsx_extension_selects_tsx_grammar() {
        let src = "export default function Page() { return <div>hi</div>; }\n";
        assert!(parse(SourceLanguage::TypeScript, src, "page.tsx").is_ok());
    }

    #[test]
    fn test_error_nodes_reject_tree() {
        let err = parse(
            SourceLanguage::Java,
            "class A {\n  void f() {\n    int x = ;\n  }\n}\n",
            "A.java",
        )
        .unwrap_err();
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_text_of_matches_source_slice() {
        let src = "pub struct User { pub id: i64 }\n";
        let tree = parse(SourceLanguage::Rust, src, "user.rs").unwrap();
        let item = tree.root().find_first("struct_item").unwrap();
        assert_eq!(tree.text_of(item), &src[item.start_byte()..item.end_byte()]);
        assert_eq!(item.child_by_field("name").unwrap().text(), "User");
    }
}
