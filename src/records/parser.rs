// This module parses the declarative grammar text format into a RecordStore.
// The format is line-oriented only for humans; the parser is a plain
// character cursor that tracks the current line for error reporting.
// Records look like:
//
//   ; storage classes
//   def enum SC_Function {
//     section StorageClass
//     name "Function"
//     opcode 7
//     ocl_as 0
//   }
//
// Field values are integers (decimal or 0x hex), double-quoted strings,
// bracketed lists, or bare identifiers which read as references to other
// entries. Parse errors carry the line number and abort the run before any
// population happens.

//! Grammar record text parser.

use crate::core::error::{TableGenError, TableGenResult};
use crate::records::store::{FieldValue, Record, RecordStore};

/// Parse grammar record text into a store.
pub fn parse_records(text: &str) -> TableGenResult<RecordStore> {
    Parser::new(text).parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    store: RecordStore,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            store: RecordStore::new(),
        }
    }

    fn parse(mut self) -> TableGenResult<RecordStore> {
        loop {
            self.skip_whitespace();
            if self.is_eof() {
                break;
            }
            self.parse_def()?;
        }
        Ok(self.store)
    }

    fn err(&self, message: impl Into<String>) -> TableGenError {
        TableGenError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ';' {
                // Skip comment line
                while let Some(ch) = self.current_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn try_read(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.current_char() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> TableGenResult<()> {
        if !self.try_read(ch) {
            return Err(self.err(format!(
                "expected `{}` but found {:?}",
                ch,
                self.current_char()
            )));
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> TableGenResult<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.err(format!(
                "expected identifier but found {:?}",
                self.current_char()
            )));
        }
        let ident = &self.text[start..self.pos];
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.err(format!("identifier `{ident}` starts with a digit")));
        }
        Ok(ident)
    }

    fn parse_def(&mut self) -> TableGenResult<()> {
        let keyword = self.read_identifier()?;
        if keyword != "def" {
            return Err(self.err(format!("expected `def`, found `{keyword}`")));
        }
        let class = self.read_identifier()?.to_string();
        let name = self.read_identifier()?.to_string();
        self.expect('{')?;

        let mut record = Record::new(&class, &name);
        loop {
            self.skip_whitespace();
            if self.try_read('}') {
                break;
            }
            if self.is_eof() {
                return Err(self.err(format!("unterminated record `{name}`")));
            }
            let field = self.read_identifier()?.to_string();
            let value = self.read_value()?;
            if !record.set(&field, value) {
                return Err(self.err(format!("duplicate field `{field}` in `{name}`")));
            }
        }

        // A duplicate entry name is the store's error; keep its message but
        // report it at the current line.
        self.store
            .add(record)
            .map_err(|e| self.err(e.to_string()))?;
        Ok(())
    }

    fn read_value(&mut self) -> TableGenResult<FieldValue> {
        self.skip_whitespace();
        match self.current_char() {
            Some('"') => self.read_string(),
            Some('[') => self.read_list(),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.read_int(),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                Ok(FieldValue::Ref(self.read_identifier()?.to_string()))
            }
            found => Err(self.err(format!("expected field value but found {found:?}"))),
        }
    }

    fn read_string(&mut self) -> TableGenResult<FieldValue> {
        self.advance(); // opening quote
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if ch == '"' {
                let s = self.text[start..self.pos].to_string();
                self.advance();
                return Ok(FieldValue::Str(s));
            }
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        Err(self.err("unterminated string literal"))
    }

    fn read_list(&mut self) -> TableGenResult<FieldValue> {
        self.advance(); // opening bracket
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.try_read(']') {
                return Ok(FieldValue::List(items));
            }
            if self.is_eof() {
                return Err(self.err("unterminated list"));
            }
            items.push(self.read_value()?);
        }
    }

    fn read_int(&mut self) -> TableGenResult<FieldValue> {
        let start = self.pos;
        if self.current_char() == Some('-') {
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }
        let token = &self.text[start..self.pos];
        let parsed = if let Some(hex) = token.strip_prefix("0x") {
            i64::from_str_radix(hex, 16).ok()
        } else {
            token.parse::<i64>().ok()
        };
        match parsed {
            Some(v) => Ok(FieldValue::Int(v)),
            None => Err(self.err(format!("invalid integer literal `{token}`"))),
        }
    }
}
