//! Metric helpers for `chunkframe`.
//!
//! Names and thin wrappers around the [`metrics`](https://docs.rs/metrics)
//! crate. With the `metrics` feature disabled every helper is a no-op.

use crate::error::ErrorKind;

/// Name of the gauge tracking active sessions.
pub const SESSIONS_ACTIVE: &str = "chunkframe_sessions_active";
/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "chunkframe_frames_processed_total";
/// Name of the counter tracking failed streams, labelled by error kind.
pub const STREAM_ERRORS: &str = "chunkframe_stream_errors_total";
/// Name of the counter tracking streams transformed and sent back.
pub const STREAMS_COMPLETED: &str = "chunkframe_streams_completed_total";
/// Name of the counter tracking panics in session tasks.
pub const SESSION_PANICS: &str = "chunkframe_session_panics_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames received from the peer.
    Inbound,
    /// Frames sent to the peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    metrics::gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the active sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    metrics::gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    metrics::counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a failed stream.
pub fn inc_stream_errors(kind: ErrorKind) {
    #[cfg(feature = "metrics")]
    metrics::counter!(STREAM_ERRORS, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a stream whose result was sent back.
pub fn inc_streams_completed() {
    #[cfg(feature = "metrics")]
    metrics::counter!(STREAMS_COMPLETED).increment(1);
}

/// Record a panic caught in a session task.
pub fn inc_session_panics() {
    #[cfg(feature = "metrics")]
    metrics::counter!(SESSION_PANICS).increment(1);
}
