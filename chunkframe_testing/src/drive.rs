//! In-memory driving of a single session.

use std::{io, sync::Arc};

use chunkframe::{
    Frame,
    FrameCodec,
    SessionConfig,
    SessionCoordinator,
    SessionError,
    SessionId,
    SessionSummary,
    Transform,
    TransformDispatcher,
    memory_pair,
};
use futures::FutureExt as _;

/// Everything a driven session produced.
#[derive(Debug)]
pub struct SessionRun {
    /// Frames the session sent, in order.
    pub output: Vec<Frame>,
    /// How the session ended.
    pub result: Result<SessionSummary, SessionError>,
}

impl SessionRun {
    /// Frames that are error reports.
    #[must_use]
    pub fn errors(&self) -> Vec<&Frame> { self.output.iter().filter(|f| f.error().is_some()).collect() }

    /// Frames that carry payload fragments.
    #[must_use]
    pub fn fragments(&self) -> Vec<&Frame> {
        self.output.iter().filter(|f| f.error().is_none()).collect()
    }
}

/// Run a session with `config` and `transform`, feed it `frames`, close the
/// peer's sending half, and collect everything the session sends.
///
/// If the session panics, the panic message is surfaced as an `io::Error`
/// beginning with `"session task failed"`.
///
/// # Errors
///
/// Returns an error if a frame cannot be encoded, an output message cannot be
/// decoded, or the session panics.
pub async fn drive_session(
    config: SessionConfig,
    transform: impl Transform,
    frames: Vec<Frame>,
) -> io::Result<SessionRun> {
    let (transport, mut peer) = memory_pair(frames.len().max(1));
    let coordinator = SessionCoordinator::new(
        SessionId::new(1),
        transport,
        TransformDispatcher::new(Arc::new(transform)),
        config,
    );

    let client = async move {
        for frame in &frames {
            let bytes = FrameCodec::encode(frame).map_err(io::Error::other)?;
            if peer.send(bytes).await.is_err() {
                break;
            }
        }
        peer.finish();
        let mut output = Vec::new();
        while let Some(message) = peer.recv().await {
            output.push(FrameCodec::decode(&message).map_err(io::Error::other)?);
        }
        Ok::<_, io::Error>(output)
    };
    let session = std::panic::AssertUnwindSafe(coordinator.run()).catch_unwind();

    let (output, result) = tokio::join!(client, session);
    let result = result.map_err(|panic| {
        io::Error::other(format!(
            "session task failed: {}",
            chunkframe::panic::format_panic(panic)
        ))
    })?;
    Ok(SessionRun {
        output: output?,
        result,
    })
}
