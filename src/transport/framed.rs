//! Length-prefixed transport over an async byte stream.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use super::Transport;

/// Minimum frame length in bytes.
///
/// Configured frame lengths are clamped to at least this value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Configured frame lengths are clamped to at most this value to prevent
/// unbounded allocation for a single message.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Clamp a requested frame length into `[MIN_FRAME_LENGTH, MAX_FRAME_LENGTH]`.
#[must_use]
pub fn clamp_frame_length(value: usize) -> usize { value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH) }

/// Messages framed with a 4-byte big-endian length prefix.
#[derive(Debug)]
pub struct FramedTransport<S> {
    framed: Framed<S, LengthDelimitedCodec>,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap `stream`, rejecting inbound messages longer than
    /// `max_frame_length` after clamping.
    pub fn new(stream: S, max_frame_length: usize) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(clamp_frame_length(max_frame_length))
            .new_codec();
        Self {
            framed: Framed::new(stream, codec),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S { self.framed.get_ref() }
}

#[async_trait]
impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> io::Result<Option<Bytes>> {
        self.framed
            .next()
            .await
            .transpose()
            .map(|message| message.map(bytes::BytesMut::freeze))
    }

    async fn send(&mut self, message: Bytes) -> io::Result<()> { self.framed.send(message).await }

    async fn close(&mut self) -> io::Result<()> { SinkExt::<Bytes>::close(&mut self.framed).await }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::{SinkExt, StreamExt};
    use tokio::io::duplex;
    use tokio_util::codec::{Framed, LengthDelimitedCodec};

    use super::*;

    #[test]
    fn frame_lengths_are_clamped() {
        assert_eq!(clamp_frame_length(1), MIN_FRAME_LENGTH);
        assert_eq!(clamp_frame_length(usize::MAX), MAX_FRAME_LENGTH);
        assert_eq!(clamp_frame_length(4096), 4096);
    }

    #[tokio::test]
    async fn exchanges_length_prefixed_messages() {
        let (client, server) = duplex(1024);
        let mut transport = FramedTransport::new(server, 1024);
        let mut peer = Framed::new(client, LengthDelimitedCodec::new());

        peer.send(Bytes::from_static(br#"{"chunk":"a"}"#))
            .await
            .expect("peer send");
        let received = transport.receive().await.expect("receive");
        assert_eq!(received.as_deref(), Some(br#"{"chunk":"a"}"#.as_slice()));

        transport
            .send(Bytes::from_static(b"reply"))
            .await
            .expect("transport send");
        let reply = peer.next().await.expect("reply frame").expect("decode reply");
        assert_eq!(&reply[..], b"reply");

        transport.close().await.expect("close");
        assert!(peer.next().await.is_none());
    }

    #[tokio::test]
    async fn peer_close_ends_the_stream() {
        let (client, server) = duplex(64);
        let mut transport = FramedTransport::new(server, 1024);
        drop(client);
        assert!(transport.receive().await.expect("clean eof").is_none());
    }

    #[tokio::test]
    async fn oversized_messages_are_rejected() {
        let (client, server) = duplex(4096);
        let mut transport = FramedTransport::new(server, MIN_FRAME_LENGTH);
        let mut peer = Framed::new(client, LengthDelimitedCodec::new());
        peer.send(Bytes::from(vec![b'x'; MIN_FRAME_LENGTH + 1]))
            .await
            .expect("peer send");
        let err = transport.receive().await.expect_err("oversized frame");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
