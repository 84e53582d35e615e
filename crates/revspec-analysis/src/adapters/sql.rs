//! PostgreSQL DDL adapter.
//!
//! A recursive-descent reader for the statement shapes the SQL extractor
//! consumes (`CREATE TABLE`, `ALTER TABLE`, `COMMENT ON`). Every other
//! statement is kept as an opaque `statement` node so that byte ranges and
//! line numbers stay intact.
//!
//! Node kinds: `source_file`, `create_table`, `alter_table`, `comment_on`,
//! `statement`, `unsupported_statement`, `qualified_name`, `identifier`,
//! `column_definition`, `data_type`, `table_constraint`, `constraint_name`,
//! `not_null_constraint`, `null_constraint`, `primary_key_constraint`,
//! `unique_constraint`, `default_constraint`, `check_constraint`,
//! `references_constraint`, `foreign_key_constraint`, `column_list`,
//! `expression`, `string`, `object_kind`, `unsupported_element`.

use std::path::Path;

use revspec_core::errors::ParseError;

use super::lexer::{Dialect, Lexer, Token, TokenKind};
use super::tree::{SyntaxTree, TreeBuilder};
use super::SourceAdapter;
use crate::language::SourceLanguage;

/// Keywords that end a column's type and start its constraint list.
const COLUMN_CONSTRAINT_STARTS: &[&str] = &[
    "CONSTRAINT",
    "NOT",
    "NULL",
    "PRIMARY",
    "UNIQUE",
    "DEFAULT",
    "REFERENCES",
    "CHECK",
    "COLLATE",
    "GENERATED",
];

const TABLE_CONSTRAINT_STARTS: &[&str] = &["PRIMARY", "UNIQUE", "CHECK", "FOREIGN", "EXCLUDE"];

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlAdapter;

impl SqlAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for SqlAdapter {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Sql
    }

    fn parse(&self, source: &str, path: &Path) -> Result<SyntaxTree, ParseError> {
        let tokens = Lexer::new(source, Dialect::Sql)
            .tokenize()
            .map_err(|e| ParseError::Syntax {
                path: path.to_path_buf(),
                line: e.row + 1,
                message: e.message,
            })?;

        let mut parser = SqlParser {
            source,
            tokens: &tokens,
            builder: TreeBuilder::new("source_file"),
            path,
        };
        for (start, end) in split_statements(source, &tokens, path)? {
            parser.statement(start, end)?;
        }
        Ok(parser.builder.finish(SourceLanguage::Sql, source.to_string()))
    }
}

/// Split token indices into `;`-terminated statements, checking paren balance.
fn split_statements(
    source: &str,
    tokens: &[Token],
    path: &Path,
) -> Result<Vec<(usize, usize)>, ParseError> {
    let mut statements = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    let mut open_row = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('(') => {
                if depth == 0 {
                    open_row = token.row;
                }
                depth += 1;
            }
            TokenKind::Punct(')') => {
                depth -= 1;
                if depth < 0 {
                    return Err(syntax(path, token.row, "unexpected ')'"));
                }
            }
            TokenKind::Punct(';') if depth == 0 => {
                if i > start {
                    statements.push((start, i));
                }
                start = i + 1;
            }
            TokenKind::Punct(';') => {
                return Err(syntax(
                    path,
                    open_row,
                    &format!(
                        "unclosed '(' before ';' near `{}`",
                        token_context(source, tokens, i)
                    ),
                ));
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax(path, open_row, "unclosed '('"));
    }
    if start < tokens.len() {
        statements.push((start, tokens.len()));
    }
    Ok(statements)
}

fn token_context(source: &str, tokens: &[Token], i: usize) -> String {
    let from = i.saturating_sub(3);
    tokens[from..=i]
        .iter()
        .map(|t| t.text(source))
        .collect::<Vec<_>>()
        .join(" ")
}

fn syntax(path: &Path, row: u32, message: &str) -> ParseError {
    ParseError::Syntax {
        path: path.to_path_buf(),
        line: row + 1,
        message: message.to_string(),
    }
}

struct SqlParser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    builder: TreeBuilder,
    path: &'a Path,
}

impl<'a> SqlParser<'a> {
    fn tok(&self, i: usize) -> &'a Token {
        &self.tokens[i]
    }

    fn is_kw(&self, i: usize, end: usize, kw: &str) -> bool {
        i < end && self.tokens[i].is_keyword(self.source, kw)
    }

    fn is_punct(&self, i: usize, end: usize, c: char) -> bool {
        i < end && self.tokens[i].is_punct(c)
    }

    fn is_any_kw(&self, i: usize, end: usize, kws: &[&str]) -> bool {
        kws.iter().any(|kw| self.is_kw(i, end, kw))
    }

    fn err(&self, i: usize, message: &str) -> ParseError {
        let row = self
            .tokens
            .get(i)
            .or_else(|| self.tokens.last())
            .map(|t| t.row)
            .unwrap_or(0);
        syntax(self.path, row, message)
    }

    /// Index of the `)` matching the `(` at `open`, bounded by `end`.
    fn matching_paren(&self, open: usize, end: usize) -> Result<usize, ParseError> {
        let mut depth = 0;
        for i in open..end {
            match self.tokens[i].kind {
                TokenKind::Punct('(') => depth += 1,
                TokenKind::Punct(')') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.err(open, "unclosed '('"))
    }

    /// Advance past one token, skipping a whole parenthesized group if it opens one.
    fn skip_group(&self, i: usize, end: usize) -> Result<usize, ParseError> {
        if self.is_punct(i, end, '(') {
            Ok(self.matching_paren(i, end)? + 1)
        } else {
            Ok(i + 1)
        }
    }

    fn open_at(&mut self, kind: &'static str, field: Option<&'static str>, i: usize) {
        let t = self.tok(i);
        self.builder.open(kind, field, true, t.start, t.row);
    }

    /// Close the innermost node at the end of token `last`.
    fn close_at(&mut self, last: usize) {
        let end = self.tok(last).end;
        self.builder.close(end);
    }

    fn span(&mut self, kind: &'static str, field: Option<&'static str>, first: usize, last: usize) {
        let (start, row) = (self.tok(first).start, self.tok(first).row);
        let end = self.tok(last).end;
        self.builder.leaf(kind, field, start, end, row);
    }

    fn statement(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        if self.is_kw(start, end, "CREATE") {
            let mut i = start + 1;
            if self.is_kw(i, end, "OR") && self.is_kw(i + 1, end, "REPLACE") {
                i += 2;
            }
            while self.is_any_kw(i, end, &["GLOBAL", "LOCAL", "TEMP", "TEMPORARY", "UNLOGGED"]) {
                i += 1;
            }
            if self.is_kw(i, end, "TABLE") {
                return self.create_table(start, i + 1, end);
            }
        } else if self.is_kw(start, end, "ALTER") && self.is_kw(start + 1, end, "TABLE") {
            return self.alter_table(start, end);
        } else if self.is_kw(start, end, "COMMENT") && self.is_kw(start + 1, end, "ON") {
            return self.comment_on(start, end);
        }
        self.span("statement", None, start, end - 1);
        Ok(())
    }

    fn create_table(&mut self, start: usize, mut i: usize, end: usize) -> Result<(), ParseError> {
        if self.is_kw(i, end, "IF") && self.is_kw(i + 1, end, "NOT") && self.is_kw(i + 2, end, "EXISTS")
        {
            i += 3;
        }
        if i >= end {
            return Err(self.err(i, "CREATE TABLE without a table name"));
        }

        // Forms without a column list are valid DDL the extractor does not model.
        let name_end = self.qualified_name_end(i, end);
        if !self.is_punct(name_end, end, '(')
            || self.is_any_kw(name_end, end, &["AS", "PARTITION", "OF"])
        {
            if name_end == i {
                return Err(self.err(i, "CREATE TABLE without a table name"));
            }
            if name_end >= end {
                return Err(self.err(end - 1, "CREATE TABLE without a column list"));
            }
            self.open_at("unsupported_statement", None, start);
            self.qualified_name(i, name_end, Some("name"));
            self.close_at(end - 1);
            return Ok(());
        }

        self.open_at("create_table", None, start);
        self.qualified_name(i, name_end, Some("name"));

        let open = name_end;
        let close = self.matching_paren(open, end)?;
        let mut element_start = open + 1;
        let mut depth = 0;
        for j in open + 1..=close {
            match self.tok(j).kind {
                TokenKind::Punct('(') => depth += 1,
                TokenKind::Punct(')') if j < close => depth -= 1,
                TokenKind::Punct(',') if depth == 0 => {
                    self.table_element(element_start, j)?;
                    element_start = j + 1;
                }
                _ => {}
            }
            if j == close && element_start < close {
                self.table_element(element_start, close)?;
            }
        }
        self.close_at(end - 1);
        Ok(())
    }

    /// One past the last token of a dotted, possibly quoted name starting at `i`.
    fn qualified_name_end(&self, i: usize, end: usize) -> usize {
        let mut j = i;
        loop {
            if j >= end {
                return j;
            }
            match self.tok(j).kind {
                TokenKind::Ident | TokenKind::QuotedIdent => j += 1,
                _ => return j,
            }
            if self.is_punct(j, end, '.') {
                j += 1;
            } else {
                return j;
            }
        }
    }

    fn qualified_name(&mut self, first: usize, end: usize, field: Option<&'static str>) {
        if first >= end {
            return;
        }
        self.open_at("qualified_name", field, first);
        for j in first..end {
            if matches!(self.tok(j).kind, TokenKind::Ident | TokenKind::QuotedIdent) {
                self.span("identifier", None, j, j);
            }
        }
        self.close_at(end - 1);
    }

    fn table_element(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        if start >= end {
            return Err(self.err(start, "empty table element"));
        }
        if self.is_kw(start, end, "CONSTRAINT") || self.is_any_kw(start, end, TABLE_CONSTRAINT_STARTS)
        {
            return self.table_constraint(start, end);
        }
        if self.is_kw(start, end, "LIKE") {
            self.span("unsupported_element", None, start, end - 1);
            return Ok(());
        }
        if !matches!(self.tok(start).kind, TokenKind::Ident | TokenKind::QuotedIdent) {
            return Err(self.err(start, "expected a column name"));
        }

        self.open_at("column_definition", None, start);
        self.span("identifier", Some("name"), start, start);

        let mut i = start + 1;
        let type_start = i;
        while i < end && !self.is_any_kw(i, end, COLUMN_CONSTRAINT_STARTS) {
            i = self.skip_group(i, end)?;
        }
        if i == type_start {
            return Err(self.err(start, "column definition without a type"));
        }
        self.span("data_type", Some("type"), type_start, i - 1);

        while i < end {
            i = self.column_constraint(i, end)?;
        }
        self.close_at(end - 1);
        Ok(())
    }

    /// Parse one column constraint at `i`; returns the index after it.
    fn column_constraint(&mut self, i: usize, end: usize) -> Result<usize, ParseError> {
        if self.is_kw(i, end, "CONSTRAINT") {
            if i + 1 >= end {
                return Err(self.err(i, "CONSTRAINT without a name"));
            }
            self.span("constraint_name", None, i + 1, i + 1);
            return Ok(i + 2);
        }
        if self.is_kw(i, end, "NOT") && self.is_kw(i + 1, end, "NULL") {
            self.span("not_null_constraint", None, i, i + 1);
            return Ok(i + 2);
        }
        if self.is_kw(i, end, "NULL") {
            self.span("null_constraint", None, i, i);
            return Ok(i + 1);
        }
        if self.is_kw(i, end, "PRIMARY") && self.is_kw(i + 1, end, "KEY") {
            self.span("primary_key_constraint", None, i, i + 1);
            return Ok(i + 2);
        }
        if self.is_kw(i, end, "UNIQUE") {
            self.span("unique_constraint", None, i, i);
            return Ok(i + 1);
        }
        if self.is_kw(i, end, "DEFAULT") {
            if i + 1 >= end {
                return Err(self.err(i, "DEFAULT without an expression"));
            }
            // The first unit always belongs to the expression, so `DEFAULT NULL` is a value.
            let mut j = self.skip_group(i + 1, end)?;
            while j < end && !self.is_any_kw(j, end, COLUMN_CONSTRAINT_STARTS) {
                j = self.skip_group(j, end)?;
            }
            self.open_at("default_constraint", None, i);
            self.span("expression", Some("value"), i + 1, j - 1);
            self.close_at(j - 1);
            return Ok(j);
        }
        if self.is_kw(i, end, "CHECK") && self.is_punct(i + 1, end, '(') {
            let close = self.matching_paren(i + 1, end)?;
            self.check_constraint(i, close);
            return Ok(close + 1);
        }
        if self.is_kw(i, end, "REFERENCES") {
            return self.references(i, end);
        }
        // COLLATE x, GENERATED ..., and anything unrecognised: skip one unit.
        self.skip_group(i, end)
    }

    fn check_constraint(&mut self, check: usize, close: usize) {
        self.open_at("check_constraint", None, check);
        if close > check + 2 {
            self.span("expression", Some("expression"), check + 2, close - 1);
        }
        self.close_at(close);
    }

    /// `REFERENCES name [(cols)] [ON DELETE ...]`; returns the index after it.
    fn references(&mut self, i: usize, end: usize) -> Result<usize, ParseError> {
        let name_end = self.qualified_name_end(i + 1, end);
        if name_end == i + 1 {
            return Err(self.err(i, "REFERENCES without a target table"));
        }
        self.open_at("references_constraint", None, i);
        self.qualified_name(i + 1, name_end, Some("table"));
        let mut last = name_end - 1;
        let mut j = name_end;
        if self.is_punct(j, end, '(') {
            let close = self.matching_paren(j, end)?;
            self.column_list(j, close, Some("columns"));
            last = close;
            j = close + 1;
        }
        // Referential actions belong to this constraint.
        while j < end && self.is_any_kw(j, end, &["ON", "MATCH", "DEFERRABLE", "INITIALLY"]) {
            j += 1;
            while j < end
                && self.is_any_kw(
                    j,
                    end,
                    &[
                        "DELETE", "UPDATE", "CASCADE", "RESTRICT", "SET", "NO", "ACTION", "NULL",
                        "DEFAULT", "FULL", "PARTIAL", "SIMPLE", "IMMEDIATE", "DEFERRED",
                    ],
                )
            {
                j += 1;
            }
            last = j - 1;
        }
        self.close_at(last);
        Ok(j)
    }

    fn column_list(&mut self, open: usize, close: usize, field: Option<&'static str>) {
        self.open_at("column_list", field, open);
        for j in open + 1..close {
            if matches!(self.tok(j).kind, TokenKind::Ident | TokenKind::QuotedIdent) {
                self.span("identifier", None, j, j);
            }
        }
        self.close_at(close);
    }

    fn table_constraint(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        self.open_at("table_constraint", None, start);
        let mut i = start;
        if self.is_kw(i, end, "CONSTRAINT") {
            if i + 1 >= end {
                return Err(self.err(i, "CONSTRAINT without a name"));
            }
            self.span("constraint_name", Some("name"), i + 1, i + 1);
            i += 2;
        }

        if self.is_kw(i, end, "PRIMARY") && self.is_kw(i + 1, end, "KEY") {
            let close = self.expect_list(i + 2, end)?;
            self.open_at("primary_key_constraint", None, i);
            self.column_list(i + 2, close, Some("columns"));
            self.close_at(close);
        } else if self.is_kw(i, end, "UNIQUE") {
            let close = self.expect_list(i + 1, end)?;
            self.open_at("unique_constraint", None, i);
            self.column_list(i + 1, close, Some("columns"));
            self.close_at(close);
        } else if self.is_kw(i, end, "CHECK") {
            let close = self.expect_list(i + 1, end)?;
            self.check_constraint(i, close);
        } else if self.is_kw(i, end, "FOREIGN") && self.is_kw(i + 1, end, "KEY") {
            let close = self.expect_list(i + 2, end)?;
            if !self.is_kw(close + 1, end, "REFERENCES") {
                return Err(self.err(close, "FOREIGN KEY without REFERENCES"));
            }
            self.open_at("foreign_key_constraint", None, i);
            self.column_list(i + 2, close, Some("columns"));
            let after = self.references(close + 1, end)?;
            self.close_at(after.saturating_sub(1).max(close + 1));
        } else if i < end {
            self.span("unsupported_element", None, i, end - 1);
        }
        self.close_at(end - 1);
        Ok(())
    }

    /// Require a `(` at `i` and return the index of its closing `)`.
    fn expect_list(&self, i: usize, end: usize) -> Result<usize, ParseError> {
        if !self.is_punct(i, end, '(') {
            return Err(self.err(i.min(end.saturating_sub(1)), "expected '('"));
        }
        self.matching_paren(i, end)
    }

    fn alter_table(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let mut i = start + 2;
        if self.is_kw(i, end, "IF") && self.is_kw(i + 1, end, "EXISTS") {
            i += 2;
        }
        if self.is_kw(i, end, "ONLY") {
            i += 1;
        }
        let name_end = self.qualified_name_end(i, end);
        if name_end == i {
            return Err(self.err(i, "ALTER TABLE without a table name"));
        }
        self.open_at("alter_table", None, start);
        self.qualified_name(i, name_end, Some("name"));
        self.close_at(end - 1);
        Ok(())
    }

    fn comment_on(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let kind = start + 2;
        let name_start = kind + 1;
        let name_end = self.qualified_name_end(name_start, end);
        if kind >= end || name_end == name_start {
            return Err(self.err(start, "COMMENT ON without a target"));
        }
        self.open_at("comment_on", None, start);
        self.span("object_kind", Some("kind"), kind, kind);
        self.qualified_name(name_start, name_end, Some("name"));
        if self.is_kw(name_end, end, "IS") && name_end + 1 < end {
            let value = name_end + 1;
            if self.tok(value).kind == TokenKind::Str {
                self.span("string", Some("comment"), value, value);
            }
        }
        self.close_at(end - 1);
        Ok(())
    }
}
