//! Structured messages exchanged over a session.
//!
//! A [`Frame`] carries one chunk of payload text plus optional stream
//! metadata. [`FrameCodec`] turns raw transport messages into frames and back;
//! it performs only structural validation, leaving count and ordering checks
//! to the [`StreamAssembler`](crate::assembler::StreamAssembler).

mod codec;

pub use codec::FrameCodec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    correlation::{CorrelatableFrame, CorrelationField, CorrelationId},
    error::StreamError,
};

/// One wire message: a chunk of payload text and its optional metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    chunk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    num_chunks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

impl Frame {
    /// Create a frame carrying `chunk` and no metadata.
    #[must_use]
    pub fn new(chunk: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            ..Self::default()
        }
    }

    /// Create an outbound error notification for a failed stream.
    #[must_use]
    pub fn error_report(report: ErrorReport) -> Self {
        Self {
            error: Some(report),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_num_chunks(mut self, num_chunks: u32) -> Self {
        self.num_chunks = Some(num_chunks);
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Option<CorrelationId>) -> Self {
        self.set_correlation_id(correlation_id);
        self
    }

    #[must_use]
    pub fn chunk(&self) -> &str { &self.chunk }

    #[must_use]
    pub fn into_chunk(self) -> String { self.chunk }

    #[must_use]
    pub const fn num_chunks(&self) -> Option<u32> { self.num_chunks }

    #[must_use]
    pub const fn index(&self) -> Option<u32> { self.index }

    /// Explicit stream name, if the peer selected one.
    #[must_use]
    pub fn stream(&self) -> Option<&str> { self.stream.as_deref() }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorReport> { self.error.as_ref() }
}

impl CorrelatableFrame for Frame {
    fn correlation_id(&self) -> Option<CorrelationId> {
        match (&self.correlation_id, &self.image_index) {
            (Some(value), _) => Some(CorrelationId::new(value.clone())),
            (None, Some(value)) => Some(CorrelationId::image_index(value.clone())),
            (None, None) => None,
        }
    }

    fn set_correlation_id(&mut self, correlation_id: Option<CorrelationId>) {
        self.correlation_id = None;
        self.image_index = None;
        if let Some(id) = correlation_id {
            match id.into_parts() {
                (CorrelationField::CorrelationId, value) => self.correlation_id = Some(value),
                (CorrelationField::ImageIndex, value) => self.image_index = Some(value),
            }
        }
    }
}

/// Typed description of a stream failure sent back to the peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// One of the [`ErrorKind`](crate::error::ErrorKind) strings.
    pub kind: String,
    /// Human-readable detail.
    pub message: String,
}

impl From<&StreamError> for ErrorReport {
    fn from(error: &StreamError) -> Self {
        Self {
            kind: error.kind().as_str().to_owned(),
            message: error.to_string(),
        }
    }
}
