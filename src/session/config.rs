//! Per-session configuration.

use std::num::NonZeroUsize;

use super::StreamErrorPolicy;
use crate::assembler::{BufferLimits, StreamName, limits::non_zero};

/// Default outbound fragment size in characters (64 KiB).
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = non_zero(64 * 1024);

/// Default number of consecutive undecodable frames tolerated before a
/// lenient session closes.
pub const DEFAULT_MAX_PROTOCOL_FAILURES: u32 = 10;

/// Settings applied to every session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum characters per outbound fragment.
    pub chunk_size: NonZeroUsize,
    /// Per-stream buffering bounds.
    pub limits: BufferLimits,
    /// Keep the session open after a stream completes. When `false` the
    /// session closes once its first result has been sent.
    pub persist_across_streams: bool,
    /// Whether a stream error drops the stream or closes the session.
    pub error_policy: StreamErrorPolicy,
    /// Consecutive undecodable frames tolerated under
    /// [`StreamErrorPolicy::DropStream`].
    pub max_protocol_failures: u32,
    /// Send an error frame to the peer when a stream fails.
    pub report_errors: bool,
    /// Stream name used for frames that do not select one.
    pub default_stream: StreamName,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            limits: BufferLimits::default(),
            persist_across_streams: true,
            error_policy: StreamErrorPolicy::default(),
            max_protocol_failures: DEFAULT_MAX_PROTOCOL_FAILURES,
            report_errors: true,
            default_stream: StreamName::default(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: BufferLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Close the session after its first completed stream.
    #[must_use]
    pub fn single_use(mut self) -> Self {
        self.persist_across_streams = false;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: StreamErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
