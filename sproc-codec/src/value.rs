//! In-memory values carried by the stored-procedure wire format.

use crate::error::CodecError;
use serde_json::json;
use std::fmt;

/// JSON object key marking a [`Value::VariableList`].
pub const JSON_LIST_KEY: &str = "$list";

/// JSON object key marking a [`Value::ByteBlob`] (hex payload).
pub const JSON_BLOB_KEY: &str = "$blob";

/// A value the protocol can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    /// Signed integer. The sign travels in the tag, never in the magnitude.
    Integer { magnitude: u64, negative: bool },
    /// Text as one byte per UTF-16 unit. Units above 0xFF are truncated to
    /// their low 8 bits when built with [`Value::byte_string`].
    ByteString(Vec<u8>),
    /// Opaque bytes, restored exactly.
    ByteBlob(Vec<u8>),
    FixedSequence(Vec<Value>),
    /// Written with one trailing marker byte after its items.
    VariableList(Vec<Value>),
}

/// Code point starting at unit `i`, combining a well-formed surrogate pair.
fn code_point_at(units: &[u16], i: usize, unit: u16) -> u32 {
    match units.get(i + 1) {
        Some(&low) if (0xD800..0xDC00).contains(&unit) && (0xDC00..0xE000).contains(&low) => {
            0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
        }
        _ => u32::from(unit),
    }
}

impl Value {
    /// Builds an integer from a host `i64`.
    pub fn integer(value: i64) -> Self {
        Value::Integer {
            magnitude: value.unsigned_abs(),
            negative: value < 0,
        }
    }

    /// Builds a byte string, keeping the low 8 bits of every UTF-16 unit.
    ///
    /// A surrogate pair yields two bytes: the low byte of the full code
    /// point, then the low byte of the trailing surrogate.
    pub fn byte_string(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        let bytes = units
            .iter()
            .enumerate()
            .map(|(i, &unit)| (code_point_at(&units, i, unit) & 0xff) as u8)
            .collect();
        Value::ByteString(bytes)
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Value::ByteBlob(bytes.into())
    }

    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Value::FixedSequence(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::VariableList(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer as an `i64` if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer {
                magnitude,
                negative: false,
            } => i64::try_from(magnitude).ok(),
            Value::Integer {
                magnitude,
                negative: true,
            } => {
                if magnitude == 1 << 63 {
                    Some(i64::MIN)
                } else {
                    i64::try_from(magnitude).ok().map(|m| -m)
                }
            }
            _ => None,
        }
    }

    /// Returns a byte string widened to text, one character per byte.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::ByteString(units) => Some(units.iter().map(|&b| char::from(b)).collect()),
            _ => None,
        }
    }

    /// Returns the items of a sequence or list.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::FixedSequence(items) | Value::VariableList(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer { .. } => "integer",
            Value::ByteString(_) => "byte string",
            Value::ByteBlob(_) => "byte blob",
            Value::FixedSequence(_) => "sequence",
            Value::VariableList(_) => "list",
        }
    }

    /// Converts a JSON document into a value.
    ///
    /// Strings become byte strings and arrays become fixed sequences.
    /// `{"$list": [...]}` is a variable list and `{"$blob": "<hex>"}` a byte
    /// blob. Floats, booleans and any other object have no wire form.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CodecError> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Value::Null),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Value::integer(v))
                } else if let Some(v) = n.as_u64() {
                    Ok(Value::from(v))
                } else {
                    Err(CodecError::UnsupportedValue(format!("float {}", n)))
                }
            }
            Json::String(s) => Ok(Value::byte_string(s)),
            Json::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::FixedSequence),
            Json::Bool(b) => Err(CodecError::UnsupportedValue(format!("boolean {}", b))),
            Json::Object(map) => {
                if map.len() == 1 {
                    if let Some(Json::Array(items)) = map.get(JSON_LIST_KEY) {
                        return items
                            .iter()
                            .map(Value::from_json)
                            .collect::<Result<Vec<_>, _>>()
                            .map(Value::VariableList);
                    }
                    if let Some(Json::String(encoded)) = map.get(JSON_BLOB_KEY) {
                        return hex::decode(encoded).map(Value::ByteBlob).map_err(|e| {
                            CodecError::UnsupportedValue(format!("blob with invalid hex: {}", e))
                        });
                    }
                }
                Err(CodecError::UnsupportedValue(format!("object {}", json)))
            }
        }
    }

    /// Converts the value into JSON, the inverse of [`Value::from_json`].
    pub fn to_json(&self) -> Result<serde_json::Value, CodecError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer {
                magnitude,
                negative: false,
            } => json!(magnitude),
            Value::Integer { magnitude, .. } => match self.as_i64() {
                Some(v) => json!(v),
                None => {
                    return Err(CodecError::UnsupportedValue(format!(
                        "integer -{} is outside the JSON number range",
                        magnitude
                    )))
                }
            },
            Value::ByteString(_) => json!(self.as_text().unwrap_or_default()),
            Value::ByteBlob(bytes) => json!({ JSON_BLOB_KEY: hex::encode(bytes) }),
            Value::FixedSequence(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::VariableList(items) => {
                let items = items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?;
                json!({ JSON_LIST_KEY: items })
            }
        })
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = CodecError;

    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        Value::from_json(json)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::integer(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer {
            magnitude: value,
            negative: false,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::byte_string(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::byte_string(&text)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::ByteBlob(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::ByteBlob(bytes.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::FixedSequence(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Integer {
                magnitude,
                negative,
            } => {
                if *negative {
                    write!(f, "-{}", magnitude)
                } else {
                    write!(f, "{}", magnitude)
                }
            }
            Value::ByteString(_) => write!(f, "{:?}", self.as_text().unwrap_or_default()),
            Value::ByteBlob(bytes) => write!(f, "#<blob {}>", hex::encode(bytes)),
            Value::FixedSequence(items) => write_items(f, "#(", items),
            Value::VariableList(items) => write_items(f, "(", items),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value]) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}
