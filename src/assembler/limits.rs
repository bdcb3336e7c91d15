//! Buffering bounds applied to every stream.

use std::{num::NonZeroUsize, time::Duration};

/// Default cap on chunks buffered for one stream.
pub const DEFAULT_MAX_BUFFERED_CHUNKS: NonZeroUsize = non_zero(4096);

/// Default cap on chunk text bytes buffered for one stream (32 MiB).
pub const DEFAULT_MAX_BUFFERED_BYTES: NonZeroUsize = non_zero(32 * 1024 * 1024);

pub(crate) const fn non_zero(value: usize) -> NonZeroUsize {
    match NonZeroUsize::new(value) {
        Some(value) => value,
        None => panic!("limit must be non-zero"),
    }
}

/// Settings that bound per-stream resource usage in the assembler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLimits {
    /// Maximum chunks buffered for one stream before it is rejected.
    pub max_buffered_chunks: NonZeroUsize,
    /// Maximum chunk text bytes buffered for one stream before it is rejected.
    pub max_buffered_bytes: NonZeroUsize,
    /// Idle duration after which an incomplete stream is evicted. `None`
    /// disables eviction.
    pub stream_timeout: Option<Duration>,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_buffered_chunks: DEFAULT_MAX_BUFFERED_CHUNKS,
            max_buffered_bytes: DEFAULT_MAX_BUFFERED_BYTES,
            stream_timeout: None,
        }
    }
}
