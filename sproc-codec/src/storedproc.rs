//! Entry points for stored-procedure callers.
//!
//! Arguments are serialized as one sequence, armored, and sent as the
//! [`ARGS_PARAM`] request parameter. The armored response decodes to a
//! single value; a server-side failure comes back as the two-element
//! sequence `#("_fail_" message)`.

use crate::armor;
use crate::codec::{Deserializer, Serializer};
use crate::config::CodecConfig;
use crate::error::{CodecError, StoredProcError};
use crate::value::Value;
use tracing::{debug, trace};

/// Request parameter carrying the armored arguments.
pub const ARGS_PARAM: &str = "spargstr";

/// Request header naming the server-side module that defines the procedure.
pub const SCRIPTS_HEADER: &str = "x-scripts";

/// Path segment under the session root where procedures are exposed.
pub const ENDPOINT_SEGMENT: &str = "custom";

/// First element of a failure response.
pub const FAILURE_MARKER: &[u8] = b"_fail_";

/// Serializes and armors values with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct StoredProcCodec {
    config: CodecConfig,
}

impl StoredProcCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `values` as one sequence followed by `EndOfItems`, then
    /// armors the bytes.
    pub fn serialize_and_armor(&self, values: &[Value]) -> Result<String, CodecError> {
        let mut serializer = Serializer::with_config(&self.config);
        serializer.serialize_sequence(values)?;
        let bytes = serializer.finish();
        let text = armor::pack(&bytes);
        trace!(
            values = values.len(),
            bytes = bytes.len(),
            symbols = text.len(),
            "armored stored-proc payload"
        );
        Ok(text)
    }

    /// Unarmors `text` and decodes the first value it holds.
    pub fn unarmor_and_deserialize(&self, text: &str) -> Result<Value, CodecError> {
        let bytes = armor::unpack_with(text, self.config.armor_mode)?;
        let mut deserializer = Deserializer::with_config(&bytes, &self.config);
        let value = deserializer.deserialize().inspect_err(|e| {
            debug!(
                error = %e,
                symbols = text.len(),
                bytes = bytes.len(),
                "failed to decode stored-proc payload"
            );
        })?;
        trace!(
            bytes = bytes.len(),
            unread = deserializer.remaining(),
            kind = value.type_name(),
            "decoded stored-proc payload"
        );
        Ok(value)
    }

    /// Decodes a response and turns the failure shape into an error.
    pub fn decode_response(&self, text: &str) -> Result<Value, StoredProcError> {
        let value = self.unarmor_and_deserialize(text)?;
        check_failure(value)
    }
}

/// Encodes `values` with the default configuration.
pub fn serialize_and_armor(values: &[Value]) -> Result<String, CodecError> {
    StoredProcCodec::default().serialize_and_armor(values)
}

/// Decodes one value from armored text with the default configuration.
pub fn unarmor_and_deserialize(text: &str) -> Result<Value, CodecError> {
    StoredProcCodec::default().unarmor_and_deserialize(text)
}

/// Decodes a response with the default configuration.
pub fn decode_response(text: &str) -> Result<Value, StoredProcError> {
    StoredProcCodec::default().decode_response(text)
}

/// Returns `value` unless it is a failure report.
pub fn check_failure(value: Value) -> Result<Value, StoredProcError> {
    if let Value::FixedSequence(items) = &value {
        if let [Value::ByteString(marker), message] = items.as_slice() {
            if marker.as_slice() == FAILURE_MARKER {
                let message = match message {
                    Value::Null => None,
                    Value::ByteString(_) => message.as_text(),
                    other => Some(other.to_string()),
                };
                debug!(message = ?message, "stored procedure reported failure");
                return Err(StoredProcError::Failed(message));
            }
        }
    }
    Ok(value)
}

/// A stored-procedure invocation, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProcCall {
    /// Procedure name on the server.
    pub function: String,
    /// Module (script) that defines the procedure.
    pub module: String,
    pub args: Vec<Value>,
}

impl StoredProcCall {
    pub fn new(function: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            module: module.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args.extend(args);
        self
    }

    /// Request location under `session_root`.
    pub fn location(&self, session_root: &str) -> String {
        format!(
            "{}/{}/{}",
            session_root.trim_end_matches('/'),
            ENDPOINT_SEGMENT,
            self.function
        )
    }

    /// Header name and value identifying the module.
    pub fn scripts_header(&self) -> (&'static str, &str) {
        (SCRIPTS_HEADER, &self.module)
    }

    /// Parameter name and armored arguments.
    pub fn encoded_args(
        &self,
        codec: &StoredProcCodec,
    ) -> Result<(&'static str, String), CodecError> {
        Ok((ARGS_PARAM, codec.serialize_and_armor(&self.args)?))
    }
}
