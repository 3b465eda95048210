use memchr::memchr2;

use crate::num::number::scan_number;
use crate::value::{Map, Number, Value};
use crate::{Error, Result};

pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parses a complete JSON document.
pub fn parse(input: &str) -> Result<Value> {
    parse_with_depth(input, DEFAULT_MAX_DEPTH)
}

/// Parses a complete JSON document, rejecting arrays and objects nested
/// deeper than `max_depth`.
pub fn parse_with_depth(input: &str, max_depth: usize) -> Result<Value> {
    let mut parser = Parser::new(input, max_depth);
    parser.parse_document()
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, max_depth: usize) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    fn parse_document(&mut self) -> Result<Value> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            return Err(self.error("end of input"));
        }
        Ok(value)
    }

    fn error(&self, expected: &'static str) -> Error {
        self.error_at(self.pos, expected)
    }

    fn error_at(&self, offset: usize, expected: &'static str) -> Error {
        Error::parse(self.input, offset, expected)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect_byte(&mut self, byte: u8, expected: &'static str) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            _ => Err(self.error("value")),
        }
    }

    fn parse_literal(&mut self, literal: &'static str, value: Value) -> Result<Value> {
        let end = self.pos + literal.len();
        if self.bytes.get(self.pos..end) == Some(literal.as_bytes()) {
            self.pos = end;
            Ok(value)
        } else {
            Err(self.error(literal))
        }
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        match scan_number(self.bytes, start) {
            Ok(end) => {
                self.pos = end;
                Ok(Value::Number(Number::from_validated(&self.input[start..end])))
            }
            Err(offset) => Err(self.error_at(offset, "digit")),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error("shallower nesting"));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("',' or ']'")),
            }
        }
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.enter()?;
        self.pos += 1;
        let mut map = Map::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(self.error("string key"));
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect_byte(b':', "':'")?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("',' or '}'")),
            }
        }
        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_string(&mut self) -> Result<String> {
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.bytes[self.pos..];
            let Some(hit) = memchr2(b'"', b'\\', rest) else {
                return Err(self.error_at(open, "closing quote"));
            };
            let segment_end = self.pos + hit;
            if let Some(ctrl) = rest[..hit].iter().position(|b| *b < 0x20) {
                return Err(self.error_at(self.pos + ctrl, "escaped control character"));
            }
            out.push_str(&self.input[self.pos..segment_end]);
            self.pos = segment_end + 1;
            if self.bytes[segment_end] == b'"' {
                return Ok(out);
            }
            self.parse_escape(&mut out)?;
        }
    }

    // called with `pos` just past the backslash
    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let escape_start = self.pos - 1;
        let ch = match self.peek() {
            Some(b'"') => '"',
            Some(b'\\') => '\\',
            Some(b'/') => '/',
            Some(b'b') => '\u{8}',
            Some(b'f') => '\u{c}',
            Some(b'n') => '\n',
            Some(b'r') => '\r',
            Some(b't') => '\t',
            Some(b'u') => {
                self.pos += 1;
                let ch = self.parse_unicode_escape(escape_start)?;
                out.push(ch);
                return Ok(());
            }
            _ => return Err(self.error_at(escape_start, "valid escape sequence")),
        };
        self.pos += 1;
        out.push(ch);
        Ok(())
    }

    fn parse_unicode_escape(&mut self, escape_start: usize) -> Result<char> {
        let first = self.parse_hex4()?;
        let code = match first {
            0xD800..=0xDBFF => {
                if self.bytes.get(self.pos..self.pos + 2) != Some(b"\\u") {
                    return Err(self.error_at(escape_start, "low surrogate escape"));
                }
                self.pos += 2;
                let second = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.error_at(escape_start, "low surrogate escape"));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.error_at(escape_start, "high surrogate before low surrogate"))
            }
            other => other,
        };
        char::from_u32(code).ok_or_else(|| self.error_at(escape_start, "unicode scalar value"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(b @ b'0'..=b'9') => b - b'0',
                Some(b @ b'a'..=b'f') => b - b'a' + 10,
                Some(b @ b'A'..=b'F') => b - b'A' + 10,
                _ => return Err(self.error("hex digit")),
            };
            code = code * 16 + digit as u32;
            self.pos += 1;
        }
        Ok(code)
    }
}
