//! # sproc-codec
//!
//! Argument codec for server-side stored procedures.
//!
//! This crate provides:
//! - The tagged binary value format and its recursive serializer/deserializer
//! - A 6-bit text armor that makes the binary safe for text-only transport
//! - Facade functions that combine the two, plus the stored-procedure
//!   request and failure conventions
//!
//! ```
//! use sproc_codec::{serialize_and_armor, unarmor_and_deserialize, Value};
//!
//! let args = [Value::integer(300), Value::byte_string("hi"), Value::Null];
//! let text = serialize_and_armor(&args).unwrap();
//! let decoded = unarmor_and_deserialize(&text).unwrap();
//! assert_eq!(decoded, Value::sequence(args));
//! ```

pub mod armor;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod storedproc;
pub mod tag;
pub mod value;

pub use buffer::{ByteSink, ByteSource};
pub use codec::{decode, encode, encode_all, Deserializer, Serializer};
pub use config::{ArmorMode, CodecConfig};
pub use error::{CodecError, ErrorKind, StoredProcError};
pub use storedproc::{
    check_failure, decode_response, serialize_and_armor, unarmor_and_deserialize,
    StoredProcCall, StoredProcCodec,
};
pub use tag::Tag;
pub use value::Value;
