//! Message transports that carry raw frames for one session.
//!
//! A [`Transport`] delivers whole messages in order for a single connection.
//! The session coordinator only needs `receive`, `send`, and `close`; how
//! messages are delimited on the wire is the transport's concern.
//!
//! - [`FramedTransport`]: length-prefixed messages over any async byte stream.
//! - [`memory`]: an in-process channel pair, used by tests and embedders.

mod framed;
pub mod memory;

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
pub use framed::{FramedTransport, MAX_FRAME_LENGTH, MIN_FRAME_LENGTH, clamp_frame_length};
pub use memory::{MemoryPeer, MemoryTransport, memory_pair};

/// Ordered, message-oriented connection for one session.
///
/// `receive` must be cancellation-safe: the coordinator races it against its
/// shutdown token, and dropping a pending `receive` must not lose a message.
#[async_trait]
pub trait Transport: Send {
    /// Wait for the next message. Returns `Ok(None)` once the peer closed.
    async fn receive(&mut self) -> io::Result<Option<Bytes>>;

    /// Send one message, returning once it has been handed to the connection.
    async fn send(&mut self, message: Bytes) -> io::Result<()>;

    /// Flush and close the outbound half of the connection.
    async fn close(&mut self) -> io::Result<()>;
}
