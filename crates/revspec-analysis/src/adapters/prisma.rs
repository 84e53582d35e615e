//! Prisma schema adapter.
//!
//! Node kinds: `source_file`, `model_block`, `type_block`, `enum_block`,
//! `config_block`, `identifier`, `model_field`, `field_type`, `list_marker`,
//! `optional_marker`, `field_attribute`, `block_attribute`, `attribute_name`,
//! `arguments`, `argument`, `expression`, `enum_value`.

use std::path::Path;

use revspec_core::errors::ParseError;

use super::lexer::{Dialect, Lexer, Token, TokenKind};
use super::tree::{SyntaxTree, TreeBuilder};
use super::SourceAdapter;
use crate::language::SourceLanguage;

#[derive(Debug, Default, Clone, Copy)]
pub struct PrismaAdapter;

impl PrismaAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for PrismaAdapter {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Prisma
    }

    fn parse(&self, source: &str, path: &Path) -> Result<SyntaxTree, ParseError> {
        let tokens = Lexer::new(source, Dialect::Prisma)
            .tokenize()
            .map_err(|e| ParseError::Syntax {
                path: path.to_path_buf(),
                line: e.row + 1,
                message: e.message,
            })?;
        let mut parser = PrismaParser {
            source,
            tokens: &tokens,
            pos: 0,
            builder: TreeBuilder::new("source_file"),
            path,
        };
        while parser.pos < tokens.len() {
            parser.block()?;
        }
        Ok(parser.builder.finish(SourceLanguage::Prisma, source.to_string()))
    }
}

struct PrismaParser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    builder: TreeBuilder,
    path: &'a Path,
}

impl<'a> PrismaParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        let row = self
            .peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.row)
            .unwrap_or(0);
        ParseError::Syntax {
            path: self.path.to_path_buf(),
            line: row + 1,
            message: message.into(),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Ident => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.err(format!("expected {what}"))),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(t) if t.is_punct(c) => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.err(format!("expected '{c}'"))),
        }
    }

    fn leaf(&mut self, kind: &'static str, field: Option<&'static str>, first: &Token, last: &Token) {
        self.builder.leaf(kind, field, first.start, last.end, first.row);
    }

    fn block(&mut self) -> Result<(), ParseError> {
        let keyword = self.expect_ident("a block keyword")?;
        let kind = match keyword.text(self.source) {
            "model" | "view" => "model_block",
            "type" => "type_block",
            "enum" => "enum_block",
            "datasource" | "generator" => "config_block",
            other => return Err(self.err(format!("unknown block `{other}`"))),
        };
        self.builder.open(kind, None, true, keyword.start, keyword.row);
        let name = self.expect_ident("a block name")?;
        self.leaf("identifier", Some("name"), name, name);
        let open = self.expect_punct('{')?;

        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError::Syntax {
                    path: self.path.to_path_buf(),
                    line: open.row + 1,
                    message: "unclosed '{'".to_string(),
                });
            };
            if token.is_punct('}') {
                self.pos += 1;
                self.builder.close(token.end);
                return Ok(());
            }
            match kind {
                "enum_block" => self.enum_member()?,
                "config_block" => self.config_entry()?,
                _ => self.model_member()?,
            }
        }
    }

    fn enum_member(&mut self) -> Result<(), ParseError> {
        if self.at_punct('@') {
            return self.attribute(true);
        }
        let value = self.expect_ident("an enum value")?;
        self.leaf("enum_value", None, value, value);
        while self.at_punct('@') && !self.peek_at(1).is_some_and(|t| t.is_punct('@')) {
            self.attribute(false)?;
        }
        Ok(())
    }

    /// `key = value` lines are skipped wholesale.
    fn config_entry(&mut self) -> Result<(), ParseError> {
        let first = self.expect_ident("a config key")?;
        while let Some(t) = self.peek() {
            if t.row != first.row || t.is_punct('}') {
                break;
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn model_member(&mut self) -> Result<(), ParseError> {
        if self.at_punct('@') {
            return self.attribute(true);
        }
        let name = self.expect_ident("a field name")?;
        self.builder.open("model_field", None, true, name.start, name.row);
        self.leaf("identifier", Some("name"), name, name);

        let type_name = match self.peek() {
            Some(t) if t.kind == TokenKind::Ident && t.row == name.row => {
                self.pos += 1;
                t
            }
            _ => return Err(self.err(format!("field `{}` has no type", name.text(self.source)))),
        };
        self.builder
            .open("field_type", Some("type"), true, type_name.start, type_name.row);
        self.leaf("identifier", Some("name"), type_name, type_name);
        let mut type_end = type_name.end;
        if self.at_punct('(') {
            // Unsupported("...")
            let close = self.skip_parens()?;
            type_end = close.end;
        }
        if self.at_punct('[') {
            let open = self.expect_punct('[')?;
            let close = self.expect_punct(']')?;
            self.leaf("list_marker", None, open, close);
            type_end = close.end;
        }
        if self.at_punct('?') {
            let mark = self.expect_punct('?')?;
            self.leaf("optional_marker", None, mark, mark);
            type_end = mark.end;
        }
        self.builder.close(type_end);

        let mut end = type_end;
        while self.at_punct('@') && !self.peek_at(1).is_some_and(|t| t.is_punct('@')) {
            self.attribute(false)?;
            end = self.tokens[self.pos - 1].end;
        }
        self.builder.close(end);
        Ok(())
    }

    /// Consume a balanced `( ... )` group at the cursor; returns the closing token.
    fn skip_parens(&mut self) -> Result<&'a Token, ParseError> {
        let open = self.expect_punct('(')?;
        let mut depth = 1;
        while let Some(t) = self.peek() {
            self.pos += 1;
            match t.kind {
                TokenKind::Punct('(') => depth += 1,
                TokenKind::Punct(')') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(t);
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::Syntax {
            path: self.path.to_path_buf(),
            line: open.row + 1,
            message: "unclosed '('".to_string(),
        })
    }

    /// `@name(args)` or, with `block`, `@@name(args)`.
    fn attribute(&mut self, block: bool) -> Result<(), ParseError> {
        let at = self.expect_punct('@')?;
        if block {
            self.expect_punct('@')?;
        }
        let kind = if block { "block_attribute" } else { "field_attribute" };
        self.builder.open(kind, None, true, at.start, at.row);

        // Namespaced attributes such as `@db.VarChar(255)`.
        let first = self.expect_ident("an attribute name")?;
        let mut last = first;
        while self.at_punct('.') && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident) {
            self.pos += 1;
            last = self.expect_ident("an attribute name")?;
        }
        self.leaf("attribute_name", Some("name"), first, last);

        let mut end = last.end;
        if self.at_punct('(') {
            end = self.arguments()?;
        }
        self.builder.close(end);
        Ok(())
    }

    /// Parse `( arg, key: value, ... )`; returns the end byte of `)`.
    fn arguments(&mut self) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let open_pos = self.pos;
        let close = self.skip_parens()?;
        let close_pos = self.pos - 1;
        let open = &tokens[open_pos];
        self.builder
            .open("arguments", Some("arguments"), true, open.start, open.row);

        let mut start = open_pos + 1;
        let mut depth = 0;
        for i in open_pos + 1..=close_pos {
            let t = &tokens[i];
            let boundary = match t.kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') => {
                    depth += 1;
                    false
                }
                TokenKind::Punct(')') if i == close_pos => true,
                TokenKind::Punct(')') | TokenKind::Punct(']') => {
                    depth -= 1;
                    false
                }
                TokenKind::Punct(',') => depth == 0,
                _ => false,
            };
            if boundary {
                if i > start {
                    self.argument(start, i);
                }
                start = i + 1;
            }
        }
        self.builder.close(close.end);
        Ok(close.end)
    }

    fn argument(&mut self, start: usize, end: usize) {
        let tokens = self.tokens;
        let first = &tokens[start];
        let last = &tokens[end - 1];
        self.builder.open("argument", None, true, first.start, first.row);
        let keyed = end - start >= 3
            && first.kind == TokenKind::Ident
            && tokens[start + 1].is_punct(':');
        if keyed {
            self.leaf("identifier", Some("key"), first, first);
            let value = &tokens[start + 2];
            self.leaf("expression", Some("value"), value, last);
        } else {
            self.leaf("expression", Some("value"), first, last);
        }
        self.builder.close(last.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

enum Role {
  USER
  ADMIN @map("admin")
}

model User {
  id        Int      @id @default(autoincrement())
  email     String   @unique @db.VarChar(255)
  role      Role     @default(USER)
  posts     Post[]
  bio       String?
  @@map("users")
}
"#;

    fn parse(src: &str) -> SyntaxTree {
        PrismaAdapter::new().parse(src, Path::new("schema.prisma")).unwrap()
    }

    #[test]
    fn test_blocks_and_fields() {
        let tree = parse(SCHEMA);
        let model = tree.root().find_first("model_block").unwrap();
        assert_eq!(model.child_by_field("name").unwrap().text(), "User");
        let fields = model.children_of_kind("model_field");
        assert_eq!(fields.len(), 5);

        let posts = fields[3].child_by_field("type").unwrap();
        assert!(posts.child_of_kind("list_marker").is_some());
        let bio = fields[4].child_by_field("type").unwrap();
        assert!(bio.child_of_kind("optional_marker").is_some());
    }

    #[test]
    fn test_attributes_and_arguments() {
        let tree = parse(SCHEMA);
        let model = tree.root().find_first("model_block").unwrap();
        let fields = model.children_of_kind("model_field");
        let attrs = fields[1].children_of_kind("field_attribute");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].child_by_field("name").unwrap().text(), "db.VarChar");

        let map = model.child_of_kind("block_attribute").unwrap();
        let args = map.child_by_field("arguments").unwrap();
        let arg = args.child_of_kind("argument").unwrap();
        assert_eq!(arg.child_by_field("value").unwrap().text(), "\"users\"");
    }

    #[test]
    fn test_enum_values() {
        let tree = parse(SCHEMA);
        let values: Vec<&str> = tree
            .root()
            .find_all("enum_value")
            .iter()
            .map(|n| n.text())
            .collect();
        assert_eq!(values, vec!["USER", "ADMIN"]);
    }

    #[test]
    fn test_keyed_relation_arguments() {
        let tree = parse(
            "model Post {\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n}",
        );
        let args = tree.root().find_all("argument");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].child_by_field("key").unwrap().text(), "fields");
        assert_eq!(args[0].child_by_field("value").unwrap().text(), "[authorId]");
    }

    #[test]
    fn test_unclosed_block_fails() {
        let err = PrismaAdapter::new()
            .parse("model User {\n  id Int @id\n", Path::new("bad.prisma"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_field_without_type_fails() {
        let err = PrismaAdapter::new()
            .parse("model User {\n  id\n}", Path::new("bad.prisma"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }
}
