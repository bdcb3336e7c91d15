//! Reassembly of chunked streams.
//!
//! [`StreamAssembler`] accumulates [`Frame`] chunks per [`StreamKey`] until the
//! stream's declared count is reached, then joins the chunks and decodes the
//! payload. Each session owns its own assembler, so buffers are never shared
//! across sessions and need no locking. A buffer is created by the first chunk
//! of a stream and removed exactly once: on completion or on the first error.
//!
//! The chunk count may arrive on any frame. Chunks are kept in arrival order
//! unless the first chunk carries an `index`, in which case every chunk of
//! that stream must be indexed and is placed positionally.
//!
//! When a stream declared its count on its first chunk, the assembler
//! remembers the completed key. A later chunk for that key without a count
//! cannot open a new stream: it is an overflow of the completed one. A chunk
//! carrying a count opens the next stream and clears the marker.

mod buffer;
pub mod key;
pub mod limits;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use buffer::StreamBuffer;
pub use key::{SessionId, StreamKey, StreamName};
pub use limits::BufferLimits;

use crate::{
    correlation::CorrelationId,
    error::{OverflowError, ProtocolError, StreamError},
    frame::Frame,
    payload::ReconstructedPayload,
};

/// Result of feeding a frame into the assembler.
#[derive(Debug, PartialEq)]
pub enum Ingest {
    /// The stream still expects more chunks.
    Pending,
    /// The frame completed the stream.
    Complete(AssembledStream),
}

/// A completed stream, ready for the transform.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledStream {
    key: StreamKey,
    payload: ReconstructedPayload,
    correlation_id: Option<CorrelationId>,
}

impl AssembledStream {
    #[must_use]
    pub fn key(&self) -> &StreamKey { &self.key }

    #[must_use]
    pub fn payload(&self) -> &ReconstructedPayload { &self.payload }

    /// First correlation id seen on the stream.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&CorrelationId> { self.correlation_id.as_ref() }

    #[must_use]
    pub fn into_parts(self) -> (StreamKey, ReconstructedPayload, Option<CorrelationId>) {
        (self.key, self.payload, self.correlation_id)
    }
}

/// A partial stream dropped by [`StreamAssembler::purge_expired_at`].
#[derive(Clone, Debug, PartialEq)]
pub struct EvictedStream {
    pub key: StreamKey,
    pub correlation_id: Option<CorrelationId>,
    pub timeout: Duration,
}

/// A stream that completed with its count declared up front.
#[derive(Debug)]
struct Completed {
    expected: u32,
    correlation_id: Option<CorrelationId>,
    at: Instant,
}

/// Per-session table of in-flight stream buffers.
#[derive(Debug)]
pub struct StreamAssembler {
    session: SessionId,
    limits: BufferLimits,
    buffers: HashMap<StreamKey, StreamBuffer>,
    completed: HashMap<StreamKey, Completed>,
}

impl StreamAssembler {
    /// Create an empty assembler owned by `session`.
    #[must_use]
    pub fn new(session: SessionId, limits: BufferLimits) -> Self {
        Self {
            session,
            limits,
            buffers: HashMap::new(),
            completed: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    #[must_use]
    pub const fn limits(&self) -> &BufferLimits { &self.limits }

    /// Feed `frame` into the stream identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamError`] when the frame contradicts the stream's
    /// metadata, overflows its declared count, exceeds the buffering bounds,
    /// or completes a payload that cannot be decoded. The stream's buffer is
    /// discarded in every error case. A count-less chunk following a stream
    /// that completed with its count up front is
    /// [`OverflowError::AfterCompletion`].
    pub fn ingest(&mut self, key: StreamKey, frame: Frame) -> Result<Ingest, StreamError> {
        self.ingest_at(key, frame, Instant::now())
    }

    /// Feed `frame` into the stream identified by `key` using an explicit
    /// clock reading for idle tracking.
    ///
    /// # Errors
    ///
    /// See [`StreamAssembler::ingest`].
    pub fn ingest_at(
        &mut self,
        key: StreamKey,
        frame: Frame,
        now: Instant,
    ) -> Result<Ingest, StreamError> {
        if key.session() != self.session {
            return Err(ProtocolError::SessionMismatch {
                expected: self.session.as_u64(),
                found: key.session().as_u64(),
            }
            .into());
        }

        let mut buffer = match self.buffers.remove(&key) {
            Some(buffer) => buffer,
            None => {
                if frame.num_chunks().is_none()
                    && let Some(done) = self.completed.get(&key)
                {
                    return Err(OverflowError::AfterCompletion {
                        expected: done.expected,
                    }
                    .into());
                }
                self.completed.remove(&key);
                StreamBuffer::for_first_frame(&frame, now)
            }
        };
        buffer.accept(frame, &self.limits, now)?;

        if !buffer.is_complete() {
            self.buffers.insert(key, buffer);
            return Ok(Ingest::Pending);
        }

        if let Some(expected) = buffer.count_on_first_chunk() {
            self.completed.insert(
                key.clone(),
                Completed {
                    expected,
                    correlation_id: buffer.correlation_id().cloned(),
                    at: now,
                },
            );
        }
        let (text, correlation_id) = buffer.into_parts();
        let payload = ReconstructedPayload::parse(&text)?;
        Ok(Ingest::Complete(AssembledStream {
            key,
            payload,
            correlation_id,
        }))
    }

    /// Evict partial streams idle for longer than the configured timeout.
    pub fn purge_expired(&mut self) -> Vec<EvictedStream> { self.purge_expired_at(Instant::now()) }

    /// Evict partial streams idle for longer than the configured timeout,
    /// using an explicit clock reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<EvictedStream> {
        let Some(timeout) = self.limits.stream_timeout else {
            return Vec::new();
        };
        let mut evicted = Vec::new();
        self.buffers.retain(|key, buffer| {
            let expired = now.saturating_duration_since(buffer.last_activity()) >= timeout;
            if expired {
                evicted.push(EvictedStream {
                    key: key.clone(),
                    correlation_id: buffer.correlation_id().cloned(),
                    timeout,
                });
            }
            !expired
        });
        self.completed
            .retain(|_, done| now.saturating_duration_since(done.at) < timeout);
        evicted
    }

    /// Correlation id of the stream `key` refers to: the one in flight, or
    /// the one that just completed under that key.
    #[must_use]
    pub fn correlation_id(&self, key: &StreamKey) -> Option<&CorrelationId> {
        match self.buffers.get(key) {
            Some(buffer) => buffer.correlation_id(),
            None => self
                .completed
                .get(key)
                .and_then(|done| done.correlation_id.as_ref()),
        }
    }

    /// Number of partial streams currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    /// Number of chunks buffered for `key`, if the stream is in flight.
    #[must_use]
    pub fn buffered_chunks(&self, key: &StreamKey) -> Option<usize> {
        self.buffers.get(key).map(StreamBuffer::received)
    }

    /// Discard every buffer, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.buffers.len();
        self.buffers.clear();
        self.completed.clear();
        dropped
    }
}
