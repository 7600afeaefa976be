//! PHP array literal files: the static associative-data format used by the
//! host framework for translation namespaces and published configuration.
//!
//! Only the subset such files actually use is understood: an open tag, an
//! optional `declare(...)`, a single `return` of an array literal made of
//! strings, numbers, booleans, `null` and nested arrays. Nothing is evaluated.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use thiserror::Error;

/// Key -> text mapping of one translation namespace, ordered by key.
pub type Translations = BTreeMap<String, String>;

/// Location-tagged failure while reading a PHP array literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Entries in source order; duplicate keys are kept and the last one wins on lookup
    Array(Vec<(PhpKey, PhpValue)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for PhpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpKey::Int(i) => write!(f, "{}", i),
            PhpKey::Str(s) => f.write_str(s),
        }
    }
}

impl PhpValue {
    /// Look up a direct child of an array by key.
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k.to_string() == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String conversion of a scalar, following PHP's `(string)` cast.
    ///
    /// Returns `None` for `null` and arrays.
    pub fn to_text(&self) -> Option<String> {
        match self {
            PhpValue::Null | PhpValue::Array(_) => None,
            PhpValue::Bool(true) => Some("1".to_string()),
            PhpValue::Bool(false) => Some(String::new()),
            PhpValue::Int(i) => Some(i.to_string()),
            PhpValue::Float(f) => Some(f.to_string()),
            PhpValue::Str(s) => Some(s.clone()),
        }
    }

    /// Flatten an array into dotted keys (`['a' => ['b' => 'x']]` becomes `a.b => x`).
    ///
    /// Non-array values flatten to an empty mapping.
    pub fn flatten(&self) -> Translations {
        let mut out = Translations::new();
        if let PhpValue::Array(entries) = self {
            flatten_into(entries, None, &mut out);
        }
        out
    }
}

fn flatten_into(entries: &[(PhpKey, PhpValue)], prefix: Option<&str>, out: &mut Translations) {
    for (key, value) in entries {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.to_string(),
        };
        match value {
            PhpValue::Array(children) => flatten_into(children, Some(&full_key), out),
            scalar => {
                if let Some(text) = scalar.to_text() {
                    out.insert(full_key, text);
                }
            }
        }
    }
}

/// Parse a whole PHP file that returns an array literal.
pub fn parse(source: &str) -> Result<PhpValue, ParseError> {
    let mut parser = Parser::new(source);
    parser.parse_document()
}

/// Escape text for a single-quoted PHP literal: `\` becomes `\\` and `'` becomes `\'`.
pub fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render translations in the persisted file layout.
pub fn render_translations(translations: &Translations) -> String {
    let mut out = String::from("<?php\n\n return [\n\n");
    for (key, value) in translations {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "     '{}' => '{}',",
            escape_single_quoted(key),
            escape_single_quoted(value)
        );
    }
    out.push_str("\n ];\n");
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn parse_document(&mut self) -> Result<PhpValue, ParseError> {
        self.eat('\u{feff}');
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        if !self.eat_keyword("<?php") {
            return Err(self.error("expected `<?php` open tag"));
        }

        self.skip_trivia()?;
        while self.eat_keyword("declare") {
            self.skip_declare()?;
            self.skip_trivia()?;
        }

        if !self.eat_keyword("return") {
            return Err(self.error("expected `return` statement"));
        }
        self.skip_trivia()?;
        let value = self.parse_value()?;

        self.skip_trivia()?;
        self.eat(';');
        self.skip_trivia()?;
        if self.rest().starts_with("?>") {
            // Anything after the close tag is inline output, not data
            return Ok(value);
        }
        if !self.at_end() {
            return Err(self.error("unexpected content after return statement"));
        }
        Ok(value)
    }

    fn skip_declare(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.bump() {
            if c == ';' {
                return Ok(());
            }
        }
        Err(self.error("unterminated declare statement"))
    }

    fn parse_value(&mut self) -> Result<PhpValue, ParseError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                self.parse_array_items(']')
            }
            Some('\'') => self.parse_single_quoted().map(PhpValue::Str),
            Some('"') => self.parse_double_quoted().map(PhpValue::Str),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.parse_number()
            }
            Some(_) if self.eat_keyword("array") => {
                self.skip_trivia()?;
                if !self.eat('(') {
                    return Err(self.error("expected `(` after `array`"));
                }
                self.parse_array_items(')')
            }
            Some(_) if self.eat_keyword("true") => Ok(PhpValue::Bool(true)),
            Some(_) if self.eat_keyword("false") => Ok(PhpValue::Bool(false)),
            Some(_) if self.eat_keyword("null") => Ok(PhpValue::Null),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
        }
    }

    fn parse_array_items(&mut self, close: char) -> Result<PhpValue, ParseError> {
        let mut entries = Vec::new();
        let mut next_index: i64 = 0;

        loop {
            self.skip_trivia()?;
            if self.eat(close) {
                break;
            }

            let first_pos = self.pos;
            let first = self.parse_value()?;
            self.skip_trivia()?;

            let (key, value) = if self.rest().starts_with("=>") {
                self.pos += 2;
                self.skip_trivia()?;
                let key = self.to_key(first, first_pos)?;
                (key, self.parse_value()?)
            } else {
                (PhpKey::Int(next_index), first)
            };

            if let PhpKey::Int(index) = key {
                next_index = next_index.max(index.saturating_add(1));
            }
            entries.push((key, value));

            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            return Err(self.error(format!("expected `,` or `{}`", close)));
        }

        Ok(PhpValue::Array(entries))
    }

    fn to_key(&self, value: PhpValue, at: usize) -> Result<PhpKey, ParseError> {
        match value {
            PhpValue::Str(s) => Ok(PhpKey::Str(s)),
            PhpValue::Int(i) => Ok(PhpKey::Int(i)),
            PhpValue::Bool(b) => Ok(PhpKey::Int(i64::from(b))),
            PhpValue::Float(f) => Ok(PhpKey::Int(f as i64)),
            PhpValue::Null => Ok(PhpKey::Str(String::new())),
            PhpValue::Array(_) => Err(self.error_at(at, "an array cannot be used as a key")),
        }
    }

    fn parse_single_quoted(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated string literal")),
                Some('\'') => return Ok(out),
                Some('\\') => match self.peek() {
                    Some(c @ ('\\' | '\'')) => {
                        self.bump();
                        out.push(c);
                    }
                    _ => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_double_quoted(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let c = match self.bump() {
                None => return Err(self.error_at(start, "unterminated string literal")),
                Some('"') => return Ok(out),
                Some(c) => c,
            };
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated string literal")),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('v') => out.push('\u{0B}'),
                Some('e') => out.push('\u{1B}'),
                Some('f') => out.push('\u{0C}'),
                Some(c @ ('\\' | '$' | '"')) => out.push(c),
                Some(first @ '0'..='7') => {
                    let mut code = first.to_digit(8).unwrap_or(0);
                    for _ in 0..2 {
                        match self.peek().and_then(|c| c.to_digit(8)) {
                            Some(d) => {
                                self.bump();
                                code = code * 8 + d;
                            }
                            None => break,
                        }
                    }
                    out.push(char::from((code & 0xFF) as u8));
                }
                Some('x') if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) => {
                    let mut code = 0;
                    for _ in 0..2 {
                        match self.peek().and_then(|c| c.to_digit(16)) {
                            Some(d) => {
                                self.bump();
                                code = code * 16 + d;
                            }
                            None => break,
                        }
                    }
                    out.push(char::from(code as u8));
                }
                Some('u') if self.peek() == Some('{') => {
                    let escape_start = self.pos;
                    self.bump();
                    let digits_start = self.pos;
                    while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.bump();
                    }
                    let digits = &self.src[digits_start..self.pos];
                    if !self.eat('}') {
                        return Err(self.error_at(escape_start, "unterminated unicode escape"));
                    }
                    let ch = u32::from_str_radix(digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| self.error_at(escape_start, "invalid unicode escape"))?;
                    out.push(ch);
                }
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<PhpValue, ParseError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.bump();
            }
            let digits = self.src[digits_start..self.pos].replace('_', "");
            let value = i64::from_str_radix(&digits, 16)
                .map_err(|_| self.error_at(start, "invalid hexadecimal literal"))?;
            return Ok(PhpValue::Int(if negative { -value } else { value }));
        }

        let body_start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }
        let body = self.src[body_start..self.pos].replace('_', "");
        if body.is_empty() || body == "." {
            return Err(self.error_at(start, "invalid numeric literal"));
        }

        if is_float {
            let value: f64 = body
                .parse()
                .map_err(|_| self.error_at(start, "invalid float literal"))?;
            return Ok(PhpValue::Float(if negative { -value } else { value }));
        }

        let value = if body.len() > 1 && body.starts_with('0') {
            i64::from_str_radix(&body[1..], 8)
        } else {
            body.parse()
        }
        .map_err(|_| self.error_at(start, "invalid integer literal"))?;
        Ok(PhpValue::Int(if negative { -value } else { value }))
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            if rest.starts_with(char::is_whitespace) {
                self.bump();
            } else if rest.starts_with("//") || rest.starts_with('#') {
                // Line comments also end at a close tag
                let end = rest
                    .find('\n')
                    .into_iter()
                    .chain(rest.find("?>"))
                    .min()
                    .unwrap_or(rest.len());
                self.pos += end;
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error("unterminated block comment")),
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Consume a case-insensitive keyword that is not followed by an identifier character.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, at: usize, message: impl Into<String>) -> ParseError {
        let before = &self.src[..at.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before, |nl| &before[nl + 1..])
            .chars()
            .count()
            + 1;
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}
