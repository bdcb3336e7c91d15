//! Stream-level error taxonomy.
//!
//! Every failure raised while assembling, decoding, transforming, or bounding
//! a single stream is expressed as a [`StreamError`]. These errors are local
//! to the offending stream: the assembler discards that stream's buffer and
//! the session coordinator decides, per [`StreamErrorPolicy`], whether the
//! session survives.
//!
//! [`StreamErrorPolicy`]: crate::session::StreamErrorPolicy

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;

/// Malformed frames and contradictory stream metadata.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message was not a well-formed JSON object.
    #[error("malformed frame: {0}")]
    Malformed(String),
    /// The required `chunk` field was absent or not a string.
    #[error("frame is missing the required `chunk` field")]
    MissingChunk,
    /// A later frame declared a different `numChunks` than the first.
    #[error("contradictory chunk count: first declared {declared}, later {found}")]
    ContradictoryCount { declared: u32, found: u32 },
    /// A frame declared `numChunks == 0`.
    #[error("chunk count must be at least one")]
    ZeroCount,
    /// Indexed and arrival-ordered chunks were mixed within one stream.
    #[error("stream mixes indexed and unindexed chunks")]
    MixedIndexing,
    /// A key was presented to an assembler owned by another session.
    #[error("stream key belongs to session {found}, assembler owns {expected}")]
    SessionMismatch { expected: u64, found: u64 },
}

/// Failures turning reassembled text into raw bytes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload text had no `,` separating the format tag from the body.
    #[error("payload has no format delimiter")]
    MissingDelimiter,
    /// The body was not valid base64.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Failures reported by the external transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The transform returned an error.
    #[error("transform failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The transform panicked while running.
    #[error("transform panicked: {0}")]
    Panicked(String),
}

impl TransformError {
    /// Wrap any error or message as [`TransformError::Failed`].
    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(error.into())
    }
}

/// More chunks arrived than the stream declared.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum OverflowError {
    /// Arrival-ordered chunk count went past the declared count.
    #[error("received {received} chunks but {expected} were declared")]
    ExceedsDeclared { expected: u32, received: usize },
    /// An indexed chunk repeated an index that was already filled.
    #[error("chunk index {index} was already received")]
    DuplicateIndex { index: u32 },
    /// An indexed chunk fell outside the declared count.
    #[error("chunk index {index} is outside the declared count {expected}")]
    IndexOutOfRange { index: u32, expected: u32 },
    /// A chunk without a count arrived after the stream had completed with
    /// its count declared up front.
    #[error("chunk arrived after the stream completed with {expected} chunks")]
    AfterCompletion { expected: u32 },
}

/// A stream exceeded its buffering bound without completing.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum UnboundedStreamError {
    /// Too many chunks are buffered.
    #[error("buffered {buffered} chunks without completing (limit {limit})")]
    TooManyChunks { buffered: usize, limit: NonZeroUsize },
    /// Too many bytes of chunk text are buffered.
    #[error("buffered {buffered} bytes without completing (limit {limit})")]
    TooManyBytes { buffered: usize, limit: NonZeroUsize },
    /// The declared count alone exceeds the chunk bound.
    #[error("declared {declared} chunks exceeds limit {limit}")]
    DeclaredTooLarge { declared: u32, limit: NonZeroUsize },
    /// No chunk arrived within the idle timeout.
    #[error("stream idle for longer than {timeout:?}")]
    Idle { timeout: Duration },
}

/// Any failure that terminates a single stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Overflow(#[from] OverflowError),
    #[error(transparent)]
    UnboundedStream(#[from] UnboundedStreamError),
}

impl StreamError {
    /// Category of this error, used in error reports and metric labels.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Transform(_) => ErrorKind::Transform,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::UnboundedStream(_) => ErrorKind::UnboundedStream,
        }
    }
}

/// Coarse category of a [`StreamError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Protocol,
    Decode,
    Transform,
    Overflow,
    UnboundedStream,
}

impl ErrorKind {
    /// Returns the kind as a static string for reports and metrics.
    ///
    /// ```
    /// use chunkframe::error::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::Overflow.as_str(), "overflow");
    /// assert_eq!(ErrorKind::UnboundedStream.as_str(), "unbounded_stream");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Decode => "decode",
            Self::Transform => "transform",
            Self::Overflow => "overflow",
            Self::UnboundedStream => "unbounded_stream",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}
