//! Codec error types and stable error kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while encoding, decoding or armoring values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("buffer underflow at offset {position}: need {needed} more byte(s)")]
    BufferUnderflow { position: usize, needed: usize },

    #[error("unknown tag {tag:#04x} at offset {position}")]
    UnknownTag { tag: u8, position: usize },

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("varint at offset {position} does not fit in 64 bits")]
    VarintOverflow { position: usize },

    #[error("declared length {length} at offset {position} exceeds addressable memory")]
    LengthOverflow { length: u64, position: usize },

    #[error("nesting depth exceeds limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("invalid armor symbol {symbol:?} at index {index}")]
    InvalidSymbol { symbol: char, index: usize },

    #[error("armored text of length {length} ends with a lone symbol")]
    TruncatedArmor { length: usize },
}

impl CodecError {
    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::BufferUnderflow { .. } => ErrorKind::BufferUnderflow,
            CodecError::UnknownTag { .. } => ErrorKind::UnknownTag,
            CodecError::UnsupportedValue(_) => ErrorKind::UnsupportedValue,
            CodecError::VarintOverflow { .. } | CodecError::LengthOverflow { .. } => {
                ErrorKind::Overflow
            }
            CodecError::DepthLimitExceeded { .. } => ErrorKind::DepthLimitExceeded,
            CodecError::InvalidSymbol { .. } | CodecError::TruncatedArmor { .. } => {
                ErrorKind::InvalidArmor
            }
        }
    }
}

/// Stable error kinds, suitable for reporting to callers that decide
/// whether to retry the surrounding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    BufferUnderflow,
    UnknownTag,
    UnsupportedValue,
    Overflow,
    DepthLimitExceeded,
    InvalidArmor,
}

impl ErrorKind {
    /// Returns whether the input, not the value being encoded, is at fault.
    ///
    /// Malformed input may be the product of a truncated or garbled
    /// transport, so a higher layer may choose to re-fetch it.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ErrorKind::BufferUnderflow
                | ErrorKind::UnknownTag
                | ErrorKind::Overflow
                | ErrorKind::InvalidArmor
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BufferUnderflow => write!(f, "BUFFER_UNDERFLOW"),
            ErrorKind::UnknownTag => write!(f, "UNKNOWN_TAG"),
            ErrorKind::UnsupportedValue => write!(f, "UNSUPPORTED_VALUE"),
            ErrorKind::Overflow => write!(f, "OVERFLOW"),
            ErrorKind::DepthLimitExceeded => write!(f, "DEPTH_LIMIT_EXCEEDED"),
            ErrorKind::InvalidArmor => write!(f, "INVALID_ARMOR"),
        }
    }
}

/// Errors raised when interpreting a stored-procedure response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoredProcError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("stored procedure failed: {}", .0.as_deref().unwrap_or("<no message>"))]
    Failed(Option<String>),
}
