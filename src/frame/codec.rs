//! JSON codec for [`Frame`] values.

use bytes::Bytes;
use serde_json::Value;

use super::Frame;
use crate::error::ProtocolError;

/// Converts raw transport messages to and from [`Frame`]s.
///
/// Frames travel as JSON objects. Decoding checks that the message is an
/// object with a string `chunk`; every other field is optional and unknown
/// fields are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Decode one raw message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when the message is not a JSON
    /// object or a metadata field has the wrong type, and
    /// [`ProtocolError::MissingChunk`] when `chunk` is absent or not a string.
    pub fn decode(raw: &[u8]) -> Result<Frame, ProtocolError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(ProtocolError::Malformed(format!(
                "expected a JSON object, found {}",
                json_type(&value)
            )));
        };
        if !object.get("chunk").is_some_and(Value::is_string) {
            return Err(ProtocolError::MissingChunk);
        }
        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Encode `frame` as a raw message.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn encode(frame: &Frame) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(frame).map(Bytes::from)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
