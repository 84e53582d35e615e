//! Shared tokenizer for the hand-written SQL DDL and Prisma adapters.

/// Token categories produced by [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare identifier or keyword.
    Ident,
    /// `"quoted"` identifier (SQL dialect only).
    QuotedIdent,
    /// String literal: `'...'` in SQL, `"..."` in Prisma, `$tag$...$tag$` in SQL.
    Str,
    Number,
    /// Any other single character (`(`, `,`, `;`, `@`, `?`, `[`, ...).
    Punct(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// 0-based row of `start`.
    pub row: u32,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// Case-insensitive keyword comparison for bare identifiers.
    pub fn is_keyword(&self, source: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source).eq_ignore_ascii_case(keyword)
    }
}

/// Lexical dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sql,
    Prisma,
}

/// Lexical failure, reported by adapters as a `ParseError::Syntax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub row: u32,
    pub message: String,
}

pub struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    row: u32,
    dialect: Dialect,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str, dialect: Dialect) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            row: 0,
            dialect,
        }
    }

    /// Tokenize the whole source, skipping whitespace and comments.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if self.peek(0) == Some(b'\n') {
            self.row += 1;
        }
        self.pos += 1;
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(c), _) if c.is_ascii_whitespace() => self.bump(),
                (Some(b'-'), Some(b'-')) if self.dialect == Dialect::Sql => self.skip_line(),
                (Some(b'/'), Some(b'/')) if self.dialect == Dialect::Prisma => self.skip_line(),
                (Some(b'/'), Some(b'*')) => {
                    let start_row = self.row;
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(0), self.peek(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => self.bump(),
                            (None, _) => {
                                return Err(LexError {
                                    row: start_row,
                                    message: "unterminated block comment".to_string(),
                                })
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia()?;
        let Some(c) = self.peek(0) else {
            return Ok(None);
        };
        let start = self.pos;
        let row = self.row;

        let kind = match c {
            b'\'' if self.dialect == Dialect::Sql => {
                self.quoted(b'\'', true)?;
                TokenKind::Str
            }
            b'"' => {
                self.quoted(b'"', self.dialect == Dialect::Sql)?;
                match self.dialect {
                    Dialect::Sql => TokenKind::QuotedIdent,
                    Dialect::Prisma => TokenKind::Str,
                }
            }
            b'$' if self.dialect == Dialect::Sql && self.dollar_tag().is_some() => {
                self.dollar_quoted()?;
                TokenKind::Str
            }
            c if c.is_ascii_digit() => {
                while matches!(self.peek(0), Some(d) if d.is_ascii_digit() || d == b'.') {
                    self.bump();
                }
                TokenKind::Number
            }
            c if is_ident_start(c) => {
                while matches!(self.peek(0), Some(d) if is_ident_continue(d)) {
                    self.bump();
                }
                TokenKind::Ident
            }
            _ => {
                // Advance a whole UTF-8 scalar so token boundaries stay valid.
                let ch = self.source[start..].chars().next().unwrap_or('\0');
                for _ in 0..ch.len_utf8() {
                    self.bump();
                }
                TokenKind::Punct(ch)
            }
        };

        Ok(Some(Token {
            kind,
            start,
            end: self.pos,
            row,
        }))
    }

    /// Consume a quoted run. With `doubled_escape`, a doubled quote is literal;
    /// otherwise a backslash escapes the next byte.
    fn quoted(&mut self, quote: u8, doubled_escape: bool) -> Result<(), LexError> {
        let start_row = self.row;
        self.bump();
        loop {
            match self.peek(0) {
                Some(c) if c == quote => {
                    if doubled_escape && self.peek(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        continue;
                    }
                    self.bump();
                    return Ok(());
                }
                Some(b'\\') if !doubled_escape => {
                    self.bump();
                    self.bump();
                }
                Some(_) => self.bump(),
                None => {
                    return Err(LexError {
                        row: start_row,
                        message: "unterminated quoted literal".to_string(),
                    })
                }
            }
        }
    }

    /// Returns the `$tag$` opener at the cursor, if any.
    fn dollar_tag(&self) -> Option<&'s str> {
        let rest = &self.source[self.pos..];
        let inner_end = rest[1..].find('$')? + 1;
        let tag = &rest[..=inner_end];
        tag[1..tag.len() - 1]
            .bytes()
            .all(is_ident_continue)
            .then_some(tag)
    }

    fn dollar_quoted(&mut self) -> Result<(), LexError> {
        let start_row = self.row;
        let Some(tag) = self.dollar_tag() else {
            return Ok(());
        };
        for _ in 0..tag.len() {
            self.bump();
        }
        match self.source[self.pos..].find(tag) {
            Some(offset) => {
                for _ in 0..offset + tag.len() {
                    self.bump();
                }
                Ok(())
            }
            None => Err(LexError {
                row: start_row,
                message: format!("unterminated {tag} quoted body"),
            }),
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

/// Strip the surrounding quotes from a string token and undo escaping.
pub fn unquote(text: &str) -> String {
    if text.len() >= 2 {
        let first = text.as_bytes()[0];
        let last = text.as_bytes()[text.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            let quote = first as char;
            let inner = &text[1..text.len() - 1];
            let doubled: String = [quote, quote].iter().collect();
            return inner.replace(&doubled, &quote.to_string());
        }
    }
    text.to_string()
}
