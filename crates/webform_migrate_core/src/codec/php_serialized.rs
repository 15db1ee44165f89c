//! Decoder for the legacy `extra` blob (PHP `serialize()` output).
//!
//! # Responsibility
//! - Parse scalar, array and object values into [`PhpValue`].
//! - Expose the top-level array as [`ExtraData`] with PHP truthiness.
//!
//! # Invariants
//! - String lengths are byte lengths, as written by the legacy system.
//! - References (`r:`/`R:`) and custom-serialized objects (`C:`) are rejected.
//! - Trailing bytes after the top-level value are rejected.
//! - Arrays and objects nest at most [`MAX_NESTING_DEPTH`] levels deep.

use super::CodecError;

/// Deepest array/object nesting accepted in one blob.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Array key: PHP arrays are keyed by integers or strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

impl PhpKey {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Str(value) => value == name,
            Self::Int(value) => name.parse::<i64>().is_ok_and(|parsed| parsed == *value),
        }
    }
}

/// Decoded PHP value.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(PhpKey, PhpValue)>),
    Object {
        class: String,
        properties: Vec<(PhpKey, PhpValue)>,
    },
}

impl PhpValue {
    /// PHP `!empty()` semantics.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Str(value) => !(value.is_empty() || value == "0"),
            Self::Array(entries) => !entries.is_empty(),
            Self::Object { .. } => true,
        }
    }
}

/// Top-level key/value settings of one legacy component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraData {
    entries: Vec<(PhpKey, PhpValue)>,
}

impl ExtraData {
    /// Decodes a serialized blob.
    ///
    /// A blank blob decodes to empty settings; any other top-level value must
    /// be an array or an object.
    pub fn from_blob(blob: &str) -> Result<Self, CodecError> {
        if blob.trim().is_empty() {
            return Ok(Self::default());
        }
        match decode(blob)? {
            PhpValue::Array(entries) => Ok(Self { entries }),
            PhpValue::Object { properties, .. } => Ok(Self {
                entries: properties,
            }),
            _ => Err(CodecError::Php {
                offset: 0,
                message: "top-level value is not an array".to_string(),
            }),
        }
    }

    /// Returns the top-level setting whose key matches `name`.
    ///
    /// Integer keys match their decimal spelling.
    pub fn get(&self, name: &str) -> Option<&PhpValue> {
        self.entries
            .iter()
            .find(|(key, _)| key.matches(name))
            .map(|(_, value)| value)
    }

    /// Returns whether the named setting is present and non-empty.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(PhpValue::is_truthy)
    }

    /// Returns whether the blob held no settings at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of top-level settings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Decodes exactly one serialized value from `input`.
pub fn decode(input: &str) -> Result<PhpValue, CodecError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing data after value"));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn value(&mut self) -> Result<PhpValue, CodecError> {
        let tag = self.next_byte()?;
        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                match raw {
                    "0" => Ok(PhpValue::Bool(false)),
                    "1" => Ok(PhpValue::Bool(true)),
                    other => Err(self.error(&format!("invalid boolean `{other}`"))),
                }
            }
            b'i' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                raw.parse::<i64>()
                    .map(PhpValue::Int)
                    .map_err(|_| self.error(&format!("invalid integer `{raw}`")))
            }
            b'd' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                parse_float(raw)
                    .map(PhpValue::Float)
                    .ok_or_else(|| self.error(&format!("invalid float `{raw}`")))
            }
            b's' => {
                self.expect(b':')?;
                let text = self.quoted_string()?;
                self.expect(b';')?;
                Ok(PhpValue::Str(text))
            }
            b'a' => {
                self.expect(b':')?;
                let entries = self.entries()?;
                Ok(PhpValue::Array(entries))
            }
            b'O' => {
                self.expect(b':')?;
                let class = self.quoted_string()?;
                self.expect(b':')?;
                let properties = self.entries()?;
                Ok(PhpValue::Object { class, properties })
            }
            b'r' | b'R' | b'C' => Err(self.error(&format!(
                "unsupported value tag `{}`",
                char::from(tag)
            ))),
            other => Err(self.error(&format!("unknown value tag `{}`", char::from(other)))),
        }
    }

    // `<count>:{<key><value>...}`
    fn entries(&mut self) -> Result<Vec<(PhpKey, PhpValue)>, CodecError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let entries = self.entry_list()?;
        self.depth -= 1;
        Ok(entries)
    }

    fn entry_list(&mut self) -> Result<Vec<(PhpKey, PhpValue)>, CodecError> {
        let count = self.length(b':')?;
        self.expect(b'{')?;
        let mut entries = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = match self.value()? {
                PhpValue::Int(value) => PhpKey::Int(value),
                PhpValue::Str(value) => PhpKey::Str(value),
                _ => return Err(self.error("array key must be an integer or string")),
            };
            let value = self.value()?;
            entries.push((key, value));
        }
        self.expect(b'}')?;
        Ok(entries)
    }

    // `<len>:"<bytes>"`
    fn quoted_string(&mut self) -> Result<String, CodecError> {
        let len = self.length(b':')?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| self.error("string length exceeds input"))?;
        let text = std::str::from_utf8(&self.bytes[self.pos..end])
            .map_err(|_| self.error("string is not valid UTF-8"))?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        Ok(text)
    }

    fn length(&mut self, terminator: u8) -> Result<usize, CodecError> {
        let raw = self.read_until(terminator)?;
        raw.parse::<usize>()
            .map_err(|_| self.error(&format!("invalid length `{raw}`")))
    }

    fn read_until(&mut self, terminator: u8) -> Result<&'a str, CodecError> {
        let bytes = self.bytes;
        let start = self.pos;
        let offset = bytes[start..]
            .iter()
            .position(|byte| *byte == terminator)
            .ok_or_else(|| {
                self.error(&format!("missing `{}`", char::from(terminator)))
            })?;
        self.pos = start + offset + 1;
        std::str::from_utf8(&bytes[start..start + offset])
            .map_err(|_| self.error("token is not valid UTF-8"))
    }

    fn next_byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), CodecError> {
        let found = self.next_byte()?;
        if found != expected {
            self.pos -= 1;
            return Err(self.error(&format!(
                "expected `{}`, found `{}`",
                char::from(expected),
                char::from(found)
            )));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> CodecError {
        CodecError::Php {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    match raw {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NAN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, ExtraData, PhpKey, PhpValue, MAX_NESTING_DEPTH};
    use crate::codec::CodecError;

    fn nested_arrays(depth: usize) -> String {
        format!("{}N;{}", "a:1:{i:0;".repeat(depth), "}".repeat(depth))
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode("N;").unwrap(), PhpValue::Null);
        assert_eq!(decode("b:1;").unwrap(), PhpValue::Bool(true));
        assert_eq!(decode("i:-42;").unwrap(), PhpValue::Int(-42));
        assert_eq!(decode("d:0.5;").unwrap(), PhpValue::Float(0.5));
        assert_eq!(
            decode("s:5:\"hello\";").unwrap(),
            PhpValue::Str("hello".to_string())
        );
    }

    #[test]
    fn string_length_counts_bytes() {
        assert_eq!(
            decode("s:6:\"caf\u{e9};\";").unwrap(),
            PhpValue::Str("caf\u{e9};".to_string())
        );
    }

    #[test]
    fn decodes_nested_extra_settings() {
        let blob = "a:3:{s:7:\"private\";i:1;s:5:\"items\";a:1:{i:0;s:3:\"one\";}s:5:\"title\";s:0:\"\";}";
        let extra = ExtraData::from_blob(blob).unwrap();

        assert_eq!(extra.len(), 3);
        assert!(extra.flag("private"));
        assert!(extra.flag("items"));
        assert!(!extra.flag("title"));
        assert!(!extra.flag("missing"));
        assert!(matches!(
            extra.get("items"),
            Some(PhpValue::Array(entries)) if entries[0].0 == PhpKey::Int(0)
        ));
    }

    #[test]
    fn flag_follows_php_emptiness() {
        let blob = "a:6:{s:1:\"a\";s:1:\"0\";s:1:\"b\";b:0;s:1:\"c\";d:0;s:1:\"d\";a:0:{}s:1:\"e\";N;s:1:\"f\";s:2:\"no\";}";
        let extra = ExtraData::from_blob(blob).unwrap();

        for name in ["a", "b", "c", "d", "e"] {
            assert!(!extra.flag(name), "`{name}` should be empty");
        }
        assert!(extra.flag("f"));
    }

    #[test]
    fn blank_blob_is_empty_settings() {
        assert!(ExtraData::from_blob("").unwrap().is_empty());
        assert!(ExtraData::from_blob("  ").unwrap().is_empty());
    }

    #[test]
    fn object_properties_are_exposed() {
        let blob = "O:8:\"stdClass\":1:{s:7:\"private\";b:1;}";
        assert!(ExtraData::from_blob(blob).unwrap().flag("private"));
    }

    #[test]
    fn rejects_malformed_payloads() {
        for blob in [
            "a:1:{s:7:\"private\";i:1;",
            "s:10:\"short\";",
            "i:abc;",
            "x:1;",
            "i:1;i:2;",
            "a:1:{d:1.5;i:1;}",
            "r:1;",
        ] {
            let err = decode(blob).unwrap_err();
            assert!(matches!(err, CodecError::Php { .. }), "{blob} -> {err}");
        }
    }

    #[test]
    fn scalar_top_level_is_not_extra_data() {
        let err = ExtraData::from_blob("i:1;").unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn nesting_up_to_the_cap_is_accepted() {
        let extra = ExtraData::from_blob(&nested_arrays(MAX_NESTING_DEPTH)).unwrap();
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn over_deep_nesting_is_an_error() {
        for depth in [MAX_NESTING_DEPTH + 1, 200_000] {
            let err = ExtraData::from_blob(&nested_arrays(depth)).unwrap_err();
            assert!(
                matches!(err, CodecError::Php { ref message, .. } if message == "nesting too deep"),
                "depth {depth} -> {err}"
            );
        }
    }
}
