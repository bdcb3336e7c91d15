//! In-process transport backed by bounded channels.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::Transport;

/// Session side of an in-memory connection.
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: mpsc::Receiver<Bytes>,
    outbound: Option<mpsc::Sender<Bytes>>,
}

/// Remote side of an in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    to_session: Option<mpsc::Sender<Bytes>>,
    from_session: mpsc::Receiver<Bytes>,
}

/// Create a connected transport and peer, each direction buffering up to
/// `capacity` messages.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn memory_pair(capacity: usize) -> (MemoryTransport, MemoryPeer) {
    let (to_session, inbound) = mpsc::channel(capacity);
    let (outbound, from_session) = mpsc::channel(capacity);
    (
        MemoryTransport {
            inbound,
            outbound: Some(outbound),
        },
        MemoryPeer {
            to_session: Some(to_session),
            from_session,
        },
    )
}

fn closed() -> io::Error { io::Error::new(io::ErrorKind::BrokenPipe, "memory transport closed") }

#[async_trait]
impl Transport for MemoryTransport {
    async fn receive(&mut self) -> io::Result<Option<Bytes>> { Ok(self.inbound.recv().await) }

    async fn send(&mut self, message: Bytes) -> io::Result<()> {
        let sender = self.outbound.as_ref().ok_or_else(closed)?;
        sender.send(message).await.map_err(|_| closed())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.outbound = None;
        self.inbound.close();
        Ok(())
    }
}

impl MemoryPeer {
    /// Send one message to the session.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::BrokenPipe`] once the session has closed or
    /// [`MemoryPeer::finish`] was called.
    pub async fn send(&self, message: impl Into<Bytes>) -> io::Result<()> {
        let sender = self.to_session.as_ref().ok_or_else(closed)?;
        sender.send(message.into()).await.map_err(|_| closed())
    }

    /// Close the peer's outbound half; the session sees end of stream.
    pub fn finish(&mut self) { self.to_session = None; }

    /// Receive the next message from the session, or `None` once it closed.
    pub async fn recv(&mut self) -> Option<Bytes> { self.from_session.recv().await }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_flow_in_both_directions() {
        let (mut transport, mut peer) = memory_pair(4);
        peer.send(Bytes::from_static(b"in")).await.expect("peer send");
        assert_eq!(
            transport.receive().await.expect("receive").as_deref(),
            Some(b"in".as_slice())
        );

        transport.send(Bytes::from_static(b"out")).await.expect("send");
        assert_eq!(peer.recv().await.as_deref(), Some(b"out".as_slice()));
    }

    #[tokio::test]
    async fn finish_signals_end_of_stream() {
        let (mut transport, mut peer) = memory_pair(1);
        peer.finish();
        assert!(transport.receive().await.expect("receive").is_none());
        assert!(peer.send(Bytes::new()).await.is_err());
    }

    #[tokio::test]
    async fn close_ends_the_peer_stream_and_rejects_sends() {
        let (mut transport, mut peer) = memory_pair(1);
        transport.close().await.expect("close");
        assert!(peer.recv().await.is_none());
        assert!(transport.send(Bytes::new()).await.is_err());
        assert!(peer.send(Bytes::new()).await.is_err());
    }
}
