//! Recursive serializer and deserializer for the tagged binary format.
//!
//! Every value starts with a one-byte [`Tag`]. Lengths and integer
//! magnitudes are little-endian base-128 varints:
//!
//! ```text
//! integer        : PositiveInteger|NegativeInteger  varint(magnitude)
//! byte string    : ByteString  varint(n)  n bytes
//! byte blob      : ByteVector  varint(n)  n bytes
//! sequence       : Vector      varint(n)  n values
//! list           : List        varint(n)  n values  Null
//! null           : Null
//! ```
//!
//! A finished stream always ends with a single `EndOfItems` tag.

use crate::buffer::{ByteSink, ByteSource};
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::tag::Tag;
use crate::value::Value;
use bytes::Bytes;

/// Writes values into a fresh buffer.
///
/// If a `serialize` call fails the partial output is meaningless and the
/// serializer should be dropped.
#[derive(Debug)]
pub struct Serializer {
    sink: ByteSink,
    max_depth: usize,
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            sink: ByteSink::with_capacity(config.initial_capacity),
            max_depth: config.max_depth,
        }
    }

    /// Appends one top-level value.
    pub fn serialize(&mut self, value: &Value) -> Result<&mut Self, CodecError> {
        self.write_value(value, 0)?;
        Ok(self)
    }

    /// Appends `items` as one top-level sequence without building a
    /// [`Value::FixedSequence`] first.
    pub fn serialize_sequence(&mut self, items: &[Value]) -> Result<&mut Self, CodecError> {
        self.write_items(Tag::Vector, items, 0)?;
        Ok(self)
    }

    /// Bytes written so far, excluding the end marker.
    pub fn len(&self) -> usize {
        self.sink.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sink.is_empty()
    }

    /// Terminates the stream with `EndOfItems` and returns the bytes.
    pub fn finish(mut self) -> Bytes {
        self.sink.append_byte(Tag::EndOfItems.byte());
        self.sink.finish()
    }

    fn write_value(&mut self, value: &Value, depth: usize) -> Result<(), CodecError> {
        if depth > self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        match value {
            Value::Null => self.sink.append_byte(Tag::Null.byte()),
            Value::Integer {
                magnitude,
                negative,
            } => {
                let tag = if *negative {
                    Tag::NegativeInteger
                } else {
                    Tag::PositiveInteger
                };
                self.sink.append_byte(tag.byte());
                self.sink.append_varint(*magnitude);
            }
            Value::ByteString(units) => {
                self.sink.append_byte(Tag::ByteString.byte());
                self.sink.append_varint(units.len() as u64);
                self.sink.append_bytes(units);
            }
            Value::ByteBlob(bytes) => {
                self.sink.append_byte(Tag::ByteVector.byte());
                self.sink.append_varint(bytes.len() as u64);
                self.sink.append_bytes(bytes);
            }
            Value::FixedSequence(items) => self.write_items(Tag::Vector, items, depth)?,
            Value::VariableList(items) => {
                self.write_items(Tag::List, items, depth)?;
                // The remote reader expects one extra marker after a list.
                self.sink.append_byte(Tag::Null.byte());
            }
        }
        Ok(())
    }

    fn write_items(&mut self, tag: Tag, items: &[Value], depth: usize) -> Result<(), CodecError> {
        self.sink.append_byte(tag.byte());
        self.sink.append_varint(items.len() as u64);
        for item in items {
            self.write_value(item, depth + 1)?;
        }
        Ok(())
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads values from a received byte sequence.
#[derive(Debug, Clone)]
pub struct Deserializer<'a> {
    source: ByteSource<'a>,
    max_depth: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, &CodecConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: &CodecConfig) -> Self {
        Self {
            source: ByteSource::new(data),
            max_depth: config.max_depth,
        }
    }

    /// Reads exactly one value. `EndOfItems` reads as [`Value::Null`].
    pub fn deserialize(&mut self) -> Result<Value, CodecError> {
        self.read_value(0)
    }

    /// Reads the next top-level value of a stream.
    ///
    /// Returns `None` at an `EndOfItems` tag or when the input is exhausted.
    pub fn next_item(&mut self) -> Result<Option<Value>, CodecError> {
        if self.source.is_empty() {
            return Ok(None);
        }
        match self.read_tag()? {
            Tag::EndOfItems => Ok(None),
            tag => self.read_body(tag, 0).map(Some),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.source.remaining()
    }

    pub fn position(&self) -> usize {
        self.source.position()
    }

    fn read_tag(&mut self) -> Result<Tag, CodecError> {
        let position = self.source.position();
        let byte = self.source.next_byte()?;
        Tag::from_byte(byte).ok_or(CodecError::UnknownTag {
            tag: byte,
            position,
        })
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, CodecError> {
        if depth > self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        let tag = self.read_tag()?;
        self.read_body(tag, depth)
    }

    fn read_body(&mut self, tag: Tag, depth: usize) -> Result<Value, CodecError> {
        match tag {
            Tag::Null | Tag::EndOfItems => Ok(Value::Null),
            Tag::PositiveInteger => Ok(Value::Integer {
                magnitude: self.source.read_varint()?,
                negative: false,
            }),
            Tag::NegativeInteger => Ok(Value::Integer {
                magnitude: self.source.read_varint()?,
                negative: true,
            }),
            Tag::ByteString => {
                let len = self.source.read_length()?;
                Ok(Value::ByteString(self.source.read_bytes(len)?.to_vec()))
            }
            Tag::ByteVector => {
                let len = self.source.read_length()?;
                Ok(Value::ByteBlob(self.source.read_bytes(len)?.to_vec()))
            }
            Tag::Vector => Ok(Value::FixedSequence(self.read_items(depth)?)),
            Tag::List => {
                let items = self.read_items(depth)?;
                // Trailing marker; skipped without looking at it.
                self.source.next_byte()?;
                Ok(Value::VariableList(items))
            }
        }
    }

    fn read_items(&mut self, depth: usize) -> Result<Vec<Value>, CodecError> {
        let len = self.source.read_length()?;
        // Every item takes at least one byte, so a bogus length cannot
        // reserve more than the input could hold.
        let mut items = Vec::with_capacity(len.min(self.source.remaining()));
        for _ in 0..len {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(items)
    }
}

/// Encodes a single value followed by `EndOfItems`.
pub fn encode(value: &Value) -> Result<Bytes, CodecError> {
    let mut serializer = Serializer::new();
    serializer.serialize(value)?;
    Ok(serializer.finish())
}

/// Encodes several top-level values followed by one `EndOfItems`.
pub fn encode_all(values: &[Value]) -> Result<Bytes, CodecError> {
    let mut serializer = Serializer::new();
    for value in values {
        serializer.serialize(value)?;
    }
    Ok(serializer.finish())
}

/// Decodes the first value of `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Value, CodecError> {
    Deserializer::new(bytes).deserialize()
}
