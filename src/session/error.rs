//! Errors that end a session.

use std::io;

use thiserror::Error;

use crate::{
    assembler::StreamName,
    error::{ProtocolError, StreamError},
    fragment::FragmentationError,
};

/// Reasons a session stopped before its peer closed the connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Receiving or sending on the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// An outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    /// A transformed payload could not be fragmented.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// A stream failed under [`StreamErrorPolicy::CloseSession`](super::StreamErrorPolicy::CloseSession).
    #[error("stream `{stream}` failed: {source}")]
    Stream {
        stream: StreamName,
        #[source]
        source: StreamError,
    },
    /// An undecodable frame arrived under [`StreamErrorPolicy::CloseSession`](super::StreamErrorPolicy::CloseSession).
    #[error("undecodable frame: {0}")]
    Protocol(#[source] ProtocolError),
    /// Too many consecutive undecodable frames arrived.
    #[error("closing after {0} consecutive undecodable frames")]
    TooManyProtocolFailures(u32),
}
