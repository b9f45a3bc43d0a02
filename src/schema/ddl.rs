//! CREATE TABLE parsing
//!
//! Reads a SQL file, strips surrounding noise, and parses a MySQL-style
//! `CREATE TABLE` statement into a [`TableInfo`]. Only the pieces the
//! generator consumes are modeled: column names, type tags with their
//! length/precision arguments, comments, and primary/unique key coverage.
//! Everything else (`DEFAULT`, `NOT NULL`, collations, engines, ...) is
//! skipped.

use crate::error::{SchemaError, SchemaResult};
use std::path::Path;

/// Parsed table description consumed by spec building.
#[derive(Debug, Clone, Default)]
pub struct TableInfo {
    /// Table name (identifier quoting stripped)
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>,
    /// Table-level index definitions
    pub indexes: Vec<IndexInfo>,
}

/// One column of the table definition.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Column name (quoting stripped, original case)
    pub name: String,
    /// Lowercased type tag, e.g. "varchar", "decimal"
    pub type_name: String,
    /// Declared length / decimal precision
    pub flen: Option<u32>,
    /// Decimal scale
    pub decimal_digits: Option<i32>,
    /// COMMENT string (unquoted)
    pub comment: String,
    /// Inline PRIMARY KEY flag
    pub primary_key: bool,
    /// Inline UNIQUE flag
    pub unique: bool,
}

/// A table-level key definition.
#[derive(Debug, Clone, Default)]
pub struct IndexInfo {
    pub primary: bool,
    pub unique: bool,
    /// Covered column names in key order
    pub columns: Vec<String>,
}

/// Read a SQL file and parse the CREATE TABLE inside.
pub fn table_info_from_file(path: &Path) -> SchemaResult<TableInfo> {
    let text = std::fs::read_to_string(path).map_err(|e| SchemaError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let cleaned = clean_sql(&text);
    parse_create_table(&cleaned)
}

/// Clean up a SQL dump fragment before parsing.
///
/// Dump tools prepend `/*!...*/` directives; those leading lines are dropped.
/// Anything trailing the final closing parenthesis (engine/charset clauses,
/// extra statements) is truncated and a `;` re-appended.
pub fn clean_sql(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut start_index = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if !trimmed.starts_with("/*") && !trimmed.is_empty() {
            start_index = i;
            break;
        }
    }

    let mut query = lines[start_index..].join("\n");
    if let Some(last_paren) = query.rfind(')') {
        query.truncate(last_paren + 1);
        query.push(';');
    }
    query
}

/// Parse a cleaned `CREATE TABLE` statement.
pub fn parse_create_table(sql: &str) -> SchemaResult<TableInfo> {
    let mut cur = Cursor::new(sql);

    if !cur.eat_keyword("CREATE") || !cur.eat_keyword("TABLE") {
        return Err(SchemaError::NotCreateTable);
    }
    // Optional IF NOT EXISTS
    if cur.eat_keyword("IF") {
        cur.eat_keyword("NOT");
        cur.eat_keyword("EXISTS");
    }

    let mut name = cur
        .read_identifier()
        .ok_or_else(|| SchemaError::Parse("missing table name".to_string()))?;
    // Possibly db-qualified: db.table, `db`.`table`
    while cur.eat_char(b'.') {
        name = cur
            .read_identifier()
            .ok_or_else(|| SchemaError::Parse("missing table name".to_string()))?;
    }
    let name = match name.split('.').next_back() {
        Some(last) => last.to_string(),
        None => name,
    };

    cur.skip_whitespace();
    if !cur.eat_char(b'(') {
        return Err(SchemaError::Parse(
            "expected '(' after table name".to_string(),
        ));
    }

    let body = cur.read_until_matching_paren()?;
    let items = split_top_level(&body)?;

    let mut table = TableInfo {
        name,
        ..Default::default()
    };

    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if let Some(index) = parse_key_definition(item)? {
            table.indexes.push(index);
        } else if is_skippable_constraint(item) {
            continue;
        } else {
            table.columns.push(parse_column_definition(item)?);
        }
    }

    if table.columns.is_empty() {
        return Err(SchemaError::Parse("table defines no columns".to_string()));
    }

    Ok(table)
}

/// Split the table body on top-level commas, respecting parens and quotes.
fn split_top_level(body: &str) -> SchemaResult<Vec<String>> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let bytes = body.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // Doubled quote is an escape inside the literal
                        if i + 1 < bytes.len() && bytes[i + 1] == quote {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(SchemaError::Parse(format!(
                        "unterminated quote in table body: {body:?}"
                    )));
                }
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SchemaError::Parse(format!(
                        "unbalanced parentheses in table body: {body:?}"
                    )));
                }
            }
            b',' if depth == 0 => {
                items.push(body[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if depth != 0 {
        return Err(SchemaError::Parse(format!(
            "unbalanced parentheses in table body: {body:?}"
        )));
    }
    if start < body.len() {
        items.push(body[start..].to_string());
    }
    Ok(items)
}

/// Recognize table-level key definitions; returns None for column items.
fn parse_key_definition(item: &str) -> SchemaResult<Option<IndexInfo>> {
    let upper = item.to_uppercase();
    let mut rest = item;

    // CONSTRAINT [name] prefix
    if upper.starts_with("CONSTRAINT") {
        let mut cur = Cursor::new(item);
        cur.eat_keyword("CONSTRAINT");
        cur.skip_whitespace();
        // The next token is either the constraint name or the key kind
        let save = cur.pos;
        if let Some(tok) = cur.read_identifier() {
            let tok_upper = tok.to_uppercase();
            if tok_upper != "PRIMARY" && tok_upper != "UNIQUE" && tok_upper != "FOREIGN" {
                // Was a name; keep going from here
            } else {
                cur.pos = save;
            }
        }
        rest = &item[cur.pos..];
    }

    let trimmed = rest.trim_start();
    let (primary, unique) = if starts_with_word(trimmed, "PRIMARY") {
        (true, true)
    } else if starts_with_word(trimmed, "UNIQUE") {
        (false, true)
    } else if starts_with_word(trimmed, "KEY")
        || starts_with_word(trimmed, "INDEX")
        || starts_with_word(trimmed, "FULLTEXT")
    {
        // Non-unique secondary indexes do not affect generation
        (false, false)
    } else {
        return Ok(None);
    };

    let columns = key_column_list(rest)?;
    Ok(Some(IndexInfo {
        primary,
        unique,
        columns,
    }))
}

/// Case-insensitive keyword match with a word boundary after it.
fn starts_with_word(s: &str, word: &str) -> bool {
    if s.len() < word.len() || !s[..word.len()].eq_ignore_ascii_case(word) {
        return false;
    }
    match s.as_bytes().get(word.len()) {
        Some(&b) => !(b.is_ascii_alphanumeric() || b == b'_'),
        None => true,
    }
}

fn is_skippable_constraint(item: &str) -> bool {
    let upper = item.trim_start().to_uppercase();
    upper.starts_with("FOREIGN KEY") || upper.starts_with("CHECK")
}

/// Extract the column names from a key definition's parenthesized list.
fn key_column_list(item: &str) -> SchemaResult<Vec<String>> {
    let open = item
        .find('(')
        .ok_or_else(|| SchemaError::Parse(format!("key definition without columns: {item:?}")))?;
    let mut cur = Cursor::new(&item[open + 1..]);
    let inner = cur.read_until_matching_paren()?;

    let mut columns = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        // Strip a prefix length like `name(10)` and any ASC/DESC
        let ident = part
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or(part);
        columns.push(unquote_identifier(ident));
    }
    if columns.is_empty() {
        return Err(SchemaError::Parse(format!(
            "key definition without columns: {item:?}"
        )));
    }
    Ok(columns)
}

/// Parse a single column definition item.
fn parse_column_definition(item: &str) -> SchemaResult<ColumnInfo> {
    let mut cur = Cursor::new(item);
    let name = cur
        .read_identifier()
        .ok_or_else(|| SchemaError::Parse(format!("missing column name in {item:?}")))?;
    let name = unquote_identifier(&name);

    let type_name = cur
        .read_bare_word()
        .ok_or_else(|| SchemaError::Parse(format!("missing type for column '{name}'")))?
        .to_lowercase();

    let mut col = ColumnInfo {
        name: name.clone(),
        type_name,
        ..Default::default()
    };

    // Optional (len) or (precision, scale) arguments
    cur.skip_whitespace();
    if cur.eat_char(b'(') {
        let args = cur.read_until_matching_paren()?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if let Some(first) = parts.first() {
            col.flen = first.parse::<u32>().ok();
        }
        if let Some(second) = parts.get(1) {
            col.decimal_digits = second.parse::<i32>().ok();
        }
    }

    // Remaining column options
    loop {
        cur.skip_whitespace();
        if cur.at_end() {
            break;
        }
        let Some(word) = cur.read_bare_word() else {
            // Quoted literal or punctuation with no keyword meaning here
            cur.skip_token()?;
            continue;
        };
        match word.to_uppercase().as_str() {
            "UNSIGNED" => {
                return Err(SchemaError::UnsupportedType {
                    column: name,
                    sql_type: format!("{} unsigned", col.type_name),
                });
            }
            "PRIMARY" => {
                cur.eat_keyword("KEY");
                col.primary_key = true;
            }
            "UNIQUE" => {
                cur.eat_keyword("KEY");
                col.unique = true;
            }
            "COMMENT" => {
                cur.skip_whitespace();
                col.comment = cur.read_quoted_string().ok_or_else(|| {
                    SchemaError::Parse(format!("COMMENT without string for column '{name}'"))
                })?;
            }
            _ => {
                // NOT NULL, DEFAULT ..., AUTO_INCREMENT, COLLATE, etc.
            }
        }
    }

    Ok(col)
}

fn unquote_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'`' && last == b'`') || (first == b'"' && last == b'"') {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Character cursor over a SQL fragment.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat_char(&mut self, c: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a keyword case-insensitively, requiring a word boundary.
    fn eat_keyword(&mut self, word: &str) -> bool {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        if rest.len() < word.len() {
            return false;
        }
        if !rest[..word.len()].eq_ignore_ascii_case(word) {
            return false;
        }
        let after = rest.as_bytes().get(word.len());
        if let Some(&b) = after {
            if b.is_ascii_alphanumeric() || b == b'_' {
                return false;
            }
        }
        self.pos += word.len();
        true
    }

    /// Read an identifier: backquoted, double-quoted, or bare (may be
    /// dot-qualified).
    fn read_identifier(&mut self) -> Option<String> {
        self.skip_whitespace();
        let bytes = self.text.as_bytes();
        if self.at_end() {
            return None;
        }
        let first = bytes[self.pos];
        if first == b'`' || first == b'"' {
            let quote = first;
            let mut out = Vec::new();
            let mut i = self.pos + 1;
            while i < bytes.len() {
                if bytes[i] == quote {
                    if i + 1 < bytes.len() && bytes[i + 1] == quote {
                        out.push(quote);
                        i += 2;
                        continue;
                    }
                    self.pos = i + 1;
                    return Some(String::from_utf8_lossy(&out).into_owned());
                }
                out.push(bytes[i]);
                i += 1;
            }
            return None;
        }

        let start = self.pos;
        let mut i = self.pos;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'$' {
                i += 1;
            } else {
                break;
            }
        }
        if i == start {
            return None;
        }
        self.pos = i;
        Some(self.text[start..i].to_string())
    }

    /// Read a bare word (letters/digits/underscore only).
    fn read_bare_word(&mut self) -> Option<String> {
        self.skip_whitespace();
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut i = self.pos;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_alphanumeric() || b == b'_' {
                i += 1;
            } else {
                break;
            }
        }
        if i == start {
            return None;
        }
        self.pos = i;
        Some(self.text[start..i].to_string())
    }

    /// Read a single-quoted string with `''` escapes; cursor must be at `'`.
    fn read_quoted_string(&mut self) -> Option<String> {
        if self.peek() != Some(b'\'') {
            return None;
        }
        let bytes = self.text.as_bytes();
        let mut out = Vec::new();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                    out.push(b'\'');
                    i += 2;
                    continue;
                }
                self.pos = i + 1;
                return Some(String::from_utf8_lossy(&out).into_owned());
            }
            out.push(bytes[i]);
            i += 1;
        }
        None
    }

    /// Skip one uninteresting token: a quoted literal, a parenthesized
    /// group, or a single punctuation byte.
    fn skip_token(&mut self) -> SchemaResult<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'\'') => {
                self.read_quoted_string().ok_or_else(|| {
                    SchemaError::Parse(format!("unterminated string in {:?}", self.text))
                })?;
            }
            Some(b'(') => {
                self.pos += 1;
                self.read_until_matching_paren()?;
            }
            Some(_) => self.pos += 1,
            None => {}
        }
        Ok(())
    }

    /// Consume until the parenthesis matching an already-consumed `(`,
    /// returning the inner text (quotes respected).
    fn read_until_matching_paren(&mut self) -> SchemaResult<String> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut depth = 1i32;
        let mut i = self.pos;
        while i < bytes.len() {
            match bytes[i] {
                b'\'' | b'"' | b'`' => {
                    let quote = bytes[i];
                    i += 1;
                    while i < bytes.len() {
                        if bytes[i] == quote {
                            if i + 1 < bytes.len() && bytes[i + 1] == quote {
                                i += 2;
                                continue;
                            }
                            break;
                        }
                        i += 1;
                    }
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.text[start..i].to_string();
                        self.pos = i + 1;
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(SchemaError::Parse(format!(
            "unbalanced parentheses in {:?}",
            self.text
        )))
    }
}
