//! Detection and decoding of the PHP `serialize()` wire format.
//!
//! Legacy applications routinely store serialized PHP arrays in text
//! columns. [`is_serialized`] is a heuristic detector; [`unserialize`] is a
//! recursive-descent parser producing [`serde_json::Value`]. String payload
//! lengths are byte counts, and class names on `O:` records are discarded.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::SqlScribeError;

lazy_static! {
    static ref CONTAINER_HEAD: Regex = Regex::new(r"^[saO]:[0-9]+:").unwrap();
    static ref SCALAR_LOOSE: Regex = Regex::new(r"^[bid]:[0-9.E+-]+;").unwrap();
    static ref SCALAR_STRICT: Regex = Regex::new(r"^[bid]:[0-9.E+-]+;$").unwrap();
}

/// Heuristic check for PHP-serialized data.
///
/// In strict mode the value must also end like a complete serialized
/// payload; the loose mode tolerates trailing garbage, which matches how
/// such values tend to survive copy-paste and truncation in the wild.
#[must_use]
pub fn is_serialized(data: &str, strict: bool) -> bool {
    let data = data.trim();
    if data == "N;" {
        return true;
    }
    if data.chars().count() < 4 {
        return false;
    }
    if data.as_bytes().get(1) != Some(&b':') {
        return false;
    }
    if strict {
        match data.chars().last() {
            Some(';' | '}') => {}
            _ => return false,
        }
    } else {
        let semicolon = data.find(';');
        let brace = data.find('}');
        if semicolon.is_none() && brace.is_none() {
            return false;
        }
        if let Some(pos) = semicolon
            && pos < 3
        {
            return false;
        }
        if let Some(pos) = brace
            && pos < 4
        {
            return false;
        }
    }
    match data.as_bytes()[0] {
        b's' => {
            if strict {
                if data.chars().rev().nth(1) != Some('"') {
                    return false;
                }
            } else if !data.contains('"') {
                return false;
            }
            CONTAINER_HEAD.is_match(data)
        }
        b'a' | b'O' => CONTAINER_HEAD.is_match(data),
        b'b' | b'i' | b'd' => {
            if strict {
                SCALAR_STRICT.is_match(data)
            } else {
                SCALAR_LOOSE.is_match(data)
            }
        }
        _ => false,
    }
}

/// Parse PHP-serialized data into a JSON value.
///
/// Arrays with dense `0..n-1` integer keys become JSON arrays; every other
/// array, and every object, becomes a JSON object with stringified keys.
///
/// # Errors
/// Returns `DecodeError` on malformed input, unsupported key types, or
/// non-finite floats (which JSON cannot represent).
pub fn unserialize(data: &str) -> Result<JsonValue, SqlScribeError> {
    let mut parser = Parser {
        input: data.trim().as_bytes(),
        pos: 0,
    };
    parser.value()
}

enum PhpKey {
    Int(i64),
    Str(String),
}

fn key_string(key: PhpKey) -> String {
    match key {
        PhpKey::Int(n) => n.to_string(),
        PhpKey::Str(s) => s,
    }
}

fn assemble(entries: Vec<(PhpKey, JsonValue)>) -> JsonValue {
    let sequential = entries
        .iter()
        .enumerate()
        .all(|(i, (key, _))| matches!(key, PhpKey::Int(n) if *n == i as i64));
    if sequential {
        JsonValue::Array(entries.into_iter().map(|(_, value)| value).collect())
    } else {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key_string(key), value);
        }
        JsonValue::Object(map)
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn fail<T>(&self, msg: &str) -> Result<T, SqlScribeError> {
        Err(SqlScribeError::DecodeError(format!(
            "{msg} at byte {}",
            self.pos
        )))
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn expect(&mut self, wanted: u8) -> Result<(), SqlScribeError> {
        match self.bump() {
            Some(b) if b == wanted => Ok(()),
            _ => self.fail(&format!("expected '{}'", wanted as char)),
        }
    }

    /// Consume bytes up to (and including) the delimiter; return the body.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], SqlScribeError> {
        let start = self.pos;
        while let Some(&b) = self.input.get(self.pos) {
            if b == delim {
                let body = &self.input[start..self.pos];
                self.pos += 1;
                return Ok(body);
            }
            self.pos += 1;
        }
        self.fail("unterminated token")
    }

    fn parse_ascii<T: std::str::FromStr>(
        &self,
        body: &[u8],
        what: &str,
    ) -> Result<T, SqlScribeError> {
        std::str::from_utf8(body)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                SqlScribeError::DecodeError(format!("invalid {what} at byte {}", self.pos))
            })
    }

    /// Digits up to a `:` separator.
    fn length(&mut self) -> Result<usize, SqlScribeError> {
        let body = self.take_until(b':')?;
        self.parse_ascii(body, "length")
    }

    /// `:LEN:"BYTES"` as used by both `s:` payloads and `O:` class names.
    fn quoted_len_string(&mut self) -> Result<String, SqlScribeError> {
        self.expect(b':')?;
        let len = self.length()?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| {
                SqlScribeError::DecodeError(format!(
                    "string length runs past input at byte {}",
                    self.pos
                ))
            })?;
        let raw = &self.input[self.pos..end];
        self.pos = end;
        self.expect(b'"')?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    fn string_body(&mut self) -> Result<String, SqlScribeError> {
        let s = self.quoted_len_string()?;
        self.expect(b';')?;
        Ok(s)
    }

    fn entries(&mut self, count: usize) -> Result<Vec<(PhpKey, JsonValue)>, SqlScribeError> {
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = match self.bump() {
                Some(b'i') => {
                    self.expect(b':')?;
                    let body = self.take_until(b';')?;
                    PhpKey::Int(self.parse_ascii(body, "integer key")?)
                }
                Some(b's') => PhpKey::Str(self.string_body()?),
                _ => return self.fail("unsupported key type"),
            };
            let value = self.value()?;
            out.push((key, value));
        }
        Ok(out)
    }

    fn value(&mut self) -> Result<JsonValue, SqlScribeError> {
        match self.bump() {
            Some(b'N') => {
                self.expect(b';')?;
                Ok(JsonValue::Null)
            }
            Some(b'b') => {
                self.expect(b':')?;
                match self.take_until(b';')? {
                    b"1" => Ok(JsonValue::Bool(true)),
                    b"0" => Ok(JsonValue::Bool(false)),
                    _ => self.fail("invalid boolean"),
                }
            }
            Some(b'i') => {
                self.expect(b':')?;
                let body = self.take_until(b';')?;
                let n: i64 = self.parse_ascii(body, "integer")?;
                Ok(JsonValue::Number(Number::from(n)))
            }
            Some(b'd') => {
                self.expect(b':')?;
                let body = self.take_until(b';')?;
                let f: f64 = self.parse_ascii(body, "float")?;
                Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| SqlScribeError::DecodeError("non-finite float".to_string()))
            }
            Some(b's') => Ok(JsonValue::String(self.string_body()?)),
            Some(b'a') => {
                self.expect(b':')?;
                let count = self.length()?;
                self.expect(b'{')?;
                let entries = self.entries(count)?;
                self.expect(b'}')?;
                Ok(assemble(entries))
            }
            Some(b'O') => {
                let _class = self.quoted_len_string()?;
                self.expect(b':')?;
                let count = self.length()?;
                self.expect(b'{')?;
                let entries = self.entries(count)?;
                self.expect(b'}')?;
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key_string(key), value);
                }
                Ok(JsonValue::Object(map))
            }
            Some(_) => self.fail("unknown token"),
            None => self.fail("empty input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_scalars_and_containers() {
        assert!(is_serialized("N;", false));
        assert!(is_serialized("b:1;", false));
        assert!(is_serialized("i:42;", false));
        assert!(is_serialized("d:1.5;", false));
        assert!(is_serialized("s:3:\"abc\";", false));
        assert!(is_serialized("a:0:{}", false));
        assert!(is_serialized("O:8:\"stdClass\":0:{}", false));
    }

    #[test]
    fn rejects_ordinary_text() {
        assert!(!is_serialized("hello", false));
        assert!(!is_serialized("{\"a\":1}", false));
        assert!(!is_serialized("a:b", false));
        assert!(!is_serialized("x;", false));
        assert!(!is_serialized("", false));
    }

    #[test]
    fn strict_mode_requires_a_complete_tail() {
        assert!(is_serialized("i:42;", true));
        assert!(!is_serialized("i:42;trailing", true));
        assert!(is_serialized("i:42;trailing;", false));
        assert!(is_serialized("s:3:\"abc\";", true));
        assert!(!is_serialized("s:3:\"abc\";x", true));
    }

    #[test]
    fn unserialize_scalars() {
        assert_eq!(unserialize("N;").unwrap(), JsonValue::Null);
        assert_eq!(unserialize("b:1;").unwrap(), json!(true));
        assert_eq!(unserialize("i:-7;").unwrap(), json!(-7));
        assert_eq!(unserialize("d:2.5;").unwrap(), json!(2.5));
        assert_eq!(unserialize("s:5:\"hello\";").unwrap(), json!("hello"));
    }

    #[test]
    fn unserialize_sequential_array_to_json_array() {
        let value = unserialize("a:2:{i:0;s:3:\"foo\";i:1;s:3:\"bar\";}").unwrap();
        assert_eq!(value, json!(["foo", "bar"]));
    }

    #[test]
    fn unserialize_keyed_array_to_json_object() {
        let value = unserialize("a:2:{s:4:\"name\";s:5:\"alice\";s:5:\"score\";i:40;}").unwrap();
        assert_eq!(value, json!({"name": "alice", "score": 40}));
    }

    #[test]
    fn unserialize_sparse_integer_keys_to_json_object() {
        let value = unserialize("a:1:{i:3;s:1:\"x\";}").unwrap();
        assert_eq!(value, json!({"3": "x"}));
    }

    #[test]
    fn unserialize_nested_containers() {
        let value = unserialize("a:1:{s:4:\"tags\";a:2:{i:0;s:1:\"a\";i:1;s:1:\"b\";}}").unwrap();
        assert_eq!(value, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn unserialize_object_drops_class_name() {
        let value = unserialize("O:8:\"stdClass\":2:{s:1:\"a\";i:1;s:1:\"b\";b:0;}").unwrap();
        assert_eq!(value, json!({"a": 1, "b": false}));
    }

    #[test]
    fn unserialize_multibyte_string_uses_byte_length() {
        // "héllo" is six bytes in UTF-8
        let value = unserialize("s:6:\"h\u{e9}llo\";").unwrap();
        assert_eq!(value, json!("héllo"));
    }

    #[test]
    fn unserialize_rejects_malformed_input() {
        assert!(unserialize("i:notanumber;").is_err());
        assert!(unserialize("s:99:\"short\";").is_err());
        assert!(unserialize("a:1:{i:0;").is_err());
        assert!(unserialize("d:INF;").is_err());
        assert!(unserialize("q:1;").is_err());
    }
}
