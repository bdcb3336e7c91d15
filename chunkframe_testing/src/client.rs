//! Minimal TCP peer for exercising a running server.

use std::{io, net::SocketAddr, time::Duration};

use chunkframe::{Frame, FrameCodec, FramedTransport, Transport};
use tokio::{net::TcpStream, time::timeout};

use crate::chunks::join_fragments;

/// Default time to wait for a single frame.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A length-delimited JSON peer connected to a server.
#[derive(Debug)]
pub struct TestClient {
    transport: FramedTransport<TcpStream>,
}

impl TestClient {
    /// Connect to `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            transport: FramedTransport::new(stream, chunkframe::transport::MAX_FRAME_LENGTH),
        })
    }

    /// Send one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub async fn send(&mut self, frame: &Frame) -> io::Result<()> {
        let bytes = FrameCodec::encode(frame).map_err(io::Error::other)?;
        self.transport.send(bytes).await
    }

    /// Send every frame in order.
    ///
    /// # Errors
    ///
    /// Returns the first send error.
    pub async fn send_all(&mut self, frames: &[Frame]) -> io::Result<()> {
        for frame in frames {
            self.send(frame).await?;
        }
        Ok(())
    }

    /// Send raw bytes as one message, bypassing frame encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn send_raw(&mut self, message: &'static [u8]) -> io::Result<()> {
        self.transport.send(bytes::Bytes::from_static(message)).await
    }

    /// Receive the next frame, or `None` once the server closed the connection.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::TimedOut`] if nothing arrives within
    /// [`RECV_TIMEOUT`], or an error if the message is not a valid frame.
    pub async fn recv(&mut self) -> io::Result<Option<Frame>> {
        let message = timeout(RECV_TIMEOUT, self.transport.receive())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no frame received"))??;
        message
            .map(|bytes| FrameCodec::decode(&bytes).map_err(io::Error::other))
            .transpose()
    }

    /// Receive one complete fragment set and return its joined text together
    /// with the fragments.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection closes first, a frame is an error
    /// report, or receiving fails.
    pub async fn recv_payload(&mut self) -> io::Result<(String, Vec<Frame>)> {
        let mut fragments = Vec::new();
        loop {
            let frame = self.recv().await?.ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "closed before payload completed")
            })?;
            if let Some(report) = frame.error() {
                return Err(io::Error::other(format!(
                    "server reported {}: {}",
                    report.kind, report.message
                )));
            }
            let total = frame.num_chunks().unwrap_or(1);
            fragments.push(frame);
            if fragments.len() >= usize::try_from(total).unwrap_or(usize::MAX) {
                return Ok((join_fragments(&fragments), fragments));
            }
        }
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or shutting down fails.
    pub async fn close(mut self) -> io::Result<()> { self.transport.close().await }
}
