//! Drives one session from first frame to close.

use bytes::Bytes;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{SessionConfig, SessionError, SessionState, StreamErrorPolicy};
use crate::{
    assembler::{AssembledStream, Ingest, SessionId, StreamAssembler, StreamKey, StreamName},
    correlation::{CorrelatableFrame, CorrelationId},
    error::{ErrorKind, ProtocolError, StreamError, UnboundedStreamError},
    fragment::Fragmenter,
    frame::{ErrorReport, Frame, FrameCodec},
    metrics::{self, Direction},
    transform::{Dispatch, TransformDispatcher},
    transport::Transport,
};

/// Counters reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub streams_completed: u64,
    pub streams_failed: u64,
}

/// Whether the driving loop keeps reading after a frame.
enum Flow {
    Continue,
    Close,
}

/// Owns one connection and the streams multiplexed over it.
///
/// Inbound frames are processed strictly in arrival order. Each frame is
/// decoded, routed to the session's own [`StreamAssembler`] under the key
/// `(session id, stream name)`, and every completed stream is transformed,
/// fragmented, and sent back before the next frame is read. The coordinator
/// suspends only while waiting for a frame, a send, or the transform.
///
/// Cancelling the shutdown token, a closed transport, or a fatal error all end
/// the session: buffered streams are discarded, a transform still running has
/// its result dropped, and the transport is closed.
#[derive(Debug)]
pub struct SessionCoordinator<T> {
    id: SessionId,
    transport: T,
    config: SessionConfig,
    assembler: StreamAssembler,
    dispatcher: TransformDispatcher,
    fragmenter: Fragmenter,
    shutdown: CancellationToken,
    state: SessionState,
    summary: SessionSummary,
    protocol_failures: u32,
}

impl<T: Transport> SessionCoordinator<T> {
    /// Create a coordinator for a freshly accepted connection.
    #[must_use]
    pub fn new(
        id: SessionId,
        transport: T,
        dispatcher: TransformDispatcher,
        config: SessionConfig,
    ) -> Self {
        Self {
            id,
            transport,
            assembler: StreamAssembler::new(id, config.limits),
            fragmenter: Fragmenter::new(config.chunk_size),
            dispatcher,
            config,
            shutdown: CancellationToken::new(),
            state: SessionState::Open,
            summary: SessionSummary::default(),
            protocol_failures: 0,
        }
    }

    /// Use `token` to cancel the session from outside.
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    #[must_use]
    pub const fn id(&self) -> SessionId { self.id }

    #[must_use]
    pub const fn state(&self) -> SessionState { self.state }

    /// Token that closes the session when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    /// Serve the session until the peer closes, the token is cancelled, or a
    /// fatal error occurs.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the transport fails, a frame cannot be
    /// encoded, or a stream error closes the session under
    /// [`StreamErrorPolicy::CloseSession`].
    pub async fn run(self) -> Result<SessionSummary, SessionError> {
        let span = info_span!("session", id = self.id.as_u64());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> Result<SessionSummary, SessionError> {
        metrics::inc_sessions();
        debug!(
            policy = self.config.error_policy.as_str(),
            persistent = self.config.persist_across_streams,
            "session opened"
        );

        let outcome = self.drive().await;

        let discarded = self.assembler.clear();
        self.state = SessionState::Closed;
        if let Err(error) = self.transport.close().await {
            debug!(%error, "transport close failed");
        }
        metrics::dec_sessions();

        let summary = self.summary;
        match &outcome {
            Ok(()) => info!(
                frames_received = summary.frames_received,
                frames_sent = summary.frames_sent,
                streams_completed = summary.streams_completed,
                streams_failed = summary.streams_failed,
                discarded,
                "session closed"
            ),
            Err(error) => warn!(%error, discarded, "session closed with error"),
        }
        outcome.map(|()| summary)
    }

    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    async fn drive(&mut self) -> Result<(), SessionError> {
        let mut sweep = self.config.limits.stream_timeout.map(|timeout| {
            let mut sweep = interval((timeout / 2).max(std::time::Duration::from_millis(1)));
            sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
            sweep
        });

        loop {
            let received = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    debug!("session cancelled");
                    return Ok(());
                }
                () = next_sweep(&mut sweep) => {
                    self.evict_idle().await?;
                    continue;
                }
                received = self.transport.receive() => received?,
            };

            let Some(message) = received else {
                debug!("peer closed the connection");
                return Ok(());
            };
            if let Flow::Close = self.handle_message(&message).await? {
                return Ok(());
            }
        }
    }

    async fn handle_message(&mut self, message: &[u8]) -> Result<Flow, SessionError> {
        self.summary.frames_received += 1;
        metrics::inc_frames(Direction::Inbound);

        let frame = match FrameCodec::decode(message) {
            Ok(frame) => {
                self.protocol_failures = 0;
                frame
            }
            Err(error) => return self.on_undecodable(error).await,
        };

        let stream = frame
            .stream()
            .map_or_else(|| self.config.default_stream.clone(), StreamName::from);
        let key = StreamKey::new(self.id, stream);
        let correlation_id = self
            .assembler
            .correlation_id(&key)
            .cloned()
            .or_else(|| frame.correlation_id());
        self.state = SessionState::Assembling;

        match self.assembler.ingest(key.clone(), frame) {
            Ok(Ingest::Pending) => Ok(Flow::Continue),
            Ok(Ingest::Complete(assembled)) => self.complete(assembled).await,
            Err(error) => self.on_stream_error(&key, correlation_id, error).await,
        }
    }

    async fn complete(&mut self, assembled: AssembledStream) -> Result<Flow, SessionError> {
        let (key, payload, correlation_id) = assembled.into_parts();
        debug!(
            stream = %key.stream(),
            format_tag = payload.format_tag(),
            bytes = payload.body().len(),
            "stream complete"
        );

        self.state = SessionState::Transforming;
        let transformed = match self.dispatcher.dispatch(payload, &self.shutdown).await {
            Ok(Dispatch::Completed(transformed)) => transformed,
            Ok(Dispatch::Cancelled) => {
                debug!(stream = %key.stream(), "session cancelled during transform");
                return Ok(Flow::Close);
            }
            Err(error) => return self.on_stream_error(&key, correlation_id, error.into()).await,
        };

        self.state = SessionState::Sending;
        let echo_stream = (key.stream() != &self.config.default_stream).then(|| key.stream().clone());
        let fragments = self.fragmenter.split(
            transformed.format_tag(),
            transformed.body(),
            correlation_id,
        )?;
        let encoded = fragments
            .into_iter()
            .map(|fragment| match &echo_stream {
                Some(stream) => fragment.with_stream(stream.as_str()),
                None => fragment,
            })
            .map(|fragment| FrameCodec::encode(&fragment))
            .collect::<Result<Vec<Bytes>, _>>()?;
        let fragment_count = encoded.len();
        for message in encoded {
            self.send(message).await?;
        }

        self.summary.streams_completed += 1;
        metrics::inc_streams_completed();
        debug!(stream = %key.stream(), fragments = fragment_count, "result sent");

        if self.config.persist_across_streams {
            self.state = SessionState::Assembling;
            Ok(Flow::Continue)
        } else {
            info!("single-use session closing after its first stream");
            Ok(Flow::Close)
        }
    }

    async fn on_stream_error(
        &mut self,
        key: &StreamKey,
        correlation_id: Option<CorrelationId>,
        error: StreamError,
    ) -> Result<Flow, SessionError> {
        warn!(stream = %key.stream(), kind = %error.kind(), %error, "stream failed");
        self.summary.streams_failed += 1;
        metrics::inc_stream_errors(error.kind());

        let report = Frame::error_report(ErrorReport::from(&error))
            .with_stream(key.stream().as_str())
            .with_correlation_id(correlation_id);
        self.report(&report).await?;

        match self.config.error_policy {
            StreamErrorPolicy::DropStream => {
                self.state = SessionState::Assembling;
                Ok(Flow::Continue)
            }
            StreamErrorPolicy::CloseSession => Err(SessionError::Stream {
                stream: key.stream().clone(),
                source: error,
            }),
        }
    }

    async fn on_undecodable(&mut self, error: ProtocolError) -> Result<Flow, SessionError> {
        self.protocol_failures += 1;
        warn!(%error, consecutive = self.protocol_failures, "undecodable frame");
        metrics::inc_stream_errors(ErrorKind::Protocol);

        let report = Frame::error_report(ErrorReport::from(&StreamError::from(error.clone())));
        self.report(&report).await?;

        match self.config.error_policy {
            StreamErrorPolicy::CloseSession => Err(SessionError::Protocol(error)),
            StreamErrorPolicy::DropStream
                if self.protocol_failures >= self.config.max_protocol_failures =>
            {
                Err(SessionError::TooManyProtocolFailures(self.protocol_failures))
            }
            StreamErrorPolicy::DropStream => Ok(Flow::Continue),
        }
    }

    async fn evict_idle(&mut self) -> Result<(), SessionError> {
        for evicted in self.assembler.purge_expired() {
            let error = StreamError::from(UnboundedStreamError::Idle {
                timeout: evicted.timeout,
            });
            self.on_stream_error(&evicted.key, evicted.correlation_id, error)
                .await?;
        }
        Ok(())
    }

    async fn report(&mut self, report: &Frame) -> Result<(), SessionError> {
        if self.config.report_errors {
            self.send(FrameCodec::encode(report)?).await?;
        }
        Ok(())
    }

    async fn send(&mut self, message: Bytes) -> Result<(), SessionError> {
        self.transport.send(message).await?;
        self.summary.frames_sent += 1;
        metrics::inc_frames(Direction::Outbound);
        Ok(())
    }
}

async fn next_sweep(sweep: &mut Option<Interval>) {
    match sweep {
        Some(sweep) => {
            sweep.tick().await;
        }
        None => std::future::pending().await,
    }
}
