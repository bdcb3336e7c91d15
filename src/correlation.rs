//! Correlation identifiers carried on frames.
//!
//! A correlation id is an opaque JSON value the peer attaches to an inbound
//! stream. It is echoed unchanged on every frame of the matching outbound
//! stream so the peer can pair requests and responses when several transfers
//! are interleaved on one session. Peers may use either the `correlationId`
//! or the older `imageIndex` field; the echo keeps whichever name arrived.

use serde_json::Value;

/// Wire field that carried a correlation id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorrelationField {
    /// The `correlationId` field.
    #[default]
    CorrelationId,
    /// The legacy `imageIndex` field.
    ImageIndex,
}

/// Opaque correlation token together with the field it travels in.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationId {
    field: CorrelationField,
    value: Value,
}

impl CorrelationId {
    /// Create an id carried in the `correlationId` field.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            field: CorrelationField::CorrelationId,
            value: value.into(),
        }
    }

    /// Create an id carried in the `imageIndex` field.
    #[must_use]
    pub fn image_index(value: impl Into<Value>) -> Self {
        Self {
            field: CorrelationField::ImageIndex,
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn field(&self) -> CorrelationField { self.field }

    #[must_use]
    pub fn value(&self) -> &Value { &self.value }

    #[must_use]
    pub fn into_parts(self) -> (CorrelationField, Value) { (self.field, self.value) }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Access and mutate correlation identifiers on frames.
pub trait CorrelatableFrame {
    /// Return the correlation identifier associated with this frame, if any.
    fn correlation_id(&self) -> Option<CorrelationId>;

    /// Set or clear the correlation identifier.
    fn set_correlation_id(&mut self, correlation_id: Option<CorrelationId>);
}
