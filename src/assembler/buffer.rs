//! Per-stream chunk accumulator.

use std::time::Instant;

use super::BufferLimits;
use crate::{
    correlation::{CorrelatableFrame, CorrelationId},
    error::{OverflowError, ProtocolError, StreamError, UnboundedStreamError},
    frame::Frame,
};

/// Chunk storage. The mode is fixed by the first chunk of the stream.
#[derive(Debug)]
enum Chunks {
    /// Chunks kept in arrival order.
    Arrival(Vec<String>),
    /// Chunks placed at their declared `index`.
    Indexed {
        slots: Vec<Option<String>>,
        filled: usize,
    },
}

/// Mutable accumulator for a single stream.
#[derive(Debug)]
pub(super) struct StreamBuffer {
    chunks: Chunks,
    expected: Option<u32>,
    bytes: usize,
    correlation_id: Option<CorrelationId>,
    last_activity: Instant,
    count_on_first: bool,
}

impl StreamBuffer {
    /// Create an empty buffer whose ordering mode follows `first`.
    pub(super) fn for_first_frame(first: &Frame, now: Instant) -> Self {
        let chunks = if first.index().is_some() {
            Chunks::Indexed {
                slots: Vec::new(),
                filled: 0,
            }
        } else {
            Chunks::Arrival(Vec::new())
        };
        Self {
            chunks,
            expected: None,
            bytes: 0,
            correlation_id: None,
            last_activity: now,
            count_on_first: first.num_chunks().is_some(),
        }
    }

    /// Fold one frame into the buffer.
    ///
    /// On error the caller must discard the buffer.
    pub(super) fn accept(
        &mut self,
        frame: Frame,
        limits: &BufferLimits,
        now: Instant,
    ) -> Result<(), StreamError> {
        if let Some(declared) = frame.num_chunks() {
            self.record_count(declared, limits)?;
        }
        if self.correlation_id.is_none() {
            self.correlation_id = frame.correlation_id();
        }
        let index = frame.index();
        self.push(frame.into_chunk(), index, limits)?;
        self.check_bounds(limits)?;
        self.check_declared()?;
        self.last_activity = now;
        Ok(())
    }

    /// Whether every declared chunk has arrived.
    pub(super) fn is_complete(&self) -> bool {
        self.expected
            .is_some_and(|expected| self.received() == expected as usize)
    }

    pub(super) fn received(&self) -> usize {
        match &self.chunks {
            Chunks::Arrival(chunks) => chunks.len(),
            Chunks::Indexed { filled, .. } => *filled,
        }
    }

    /// The declared count, if the stream's first chunk carried it.
    pub(super) fn count_on_first_chunk(&self) -> Option<u32> {
        self.expected.filter(|_| self.count_on_first)
    }

    pub(super) fn correlation_id(&self) -> Option<&CorrelationId> { self.correlation_id.as_ref() }

    pub(super) fn last_activity(&self) -> Instant { self.last_activity }

    /// Join the chunks in order, consuming the buffer.
    pub(super) fn into_parts(self) -> (String, Option<CorrelationId>) {
        let mut text = String::with_capacity(self.bytes);
        match self.chunks {
            Chunks::Arrival(chunks) => chunks.iter().for_each(|chunk| text.push_str(chunk)),
            Chunks::Indexed { slots, .. } => slots
                .iter()
                .flatten()
                .for_each(|chunk| text.push_str(chunk)),
        }
        (text, self.correlation_id)
    }

    fn record_count(&mut self, declared: u32, limits: &BufferLimits) -> Result<(), StreamError> {
        match self.expected {
            Some(existing) if existing != declared => Err(ProtocolError::ContradictoryCount {
                declared: existing,
                found: declared,
            }
            .into()),
            Some(_) => Ok(()),
            None if declared == 0 => Err(ProtocolError::ZeroCount.into()),
            None if declared as usize > limits.max_buffered_chunks.get() => {
                Err(UnboundedStreamError::DeclaredTooLarge {
                    declared,
                    limit: limits.max_buffered_chunks,
                }
                .into())
            }
            None => {
                self.expected = Some(declared);
                Ok(())
            }
        }
    }

    fn push(
        &mut self,
        chunk: String,
        index: Option<u32>,
        limits: &BufferLimits,
    ) -> Result<(), StreamError> {
        let chunk_len = chunk.len();
        match (&mut self.chunks, index) {
            (Chunks::Arrival(chunks), None) => chunks.push(chunk),
            (Chunks::Indexed { slots, filled }, Some(index)) => {
                if let Some(expected) = self.expected
                    && index >= expected
                {
                    return Err(OverflowError::IndexOutOfRange { index, expected }.into());
                }
                let position = index as usize;
                if position >= limits.max_buffered_chunks.get() {
                    return Err(UnboundedStreamError::TooManyChunks {
                        buffered: position + 1,
                        limit: limits.max_buffered_chunks,
                    }
                    .into());
                }
                if position >= slots.len() {
                    slots.resize(position + 1, None);
                }
                let slot = &mut slots[position];
                if slot.is_some() {
                    return Err(OverflowError::DuplicateIndex { index }.into());
                }
                *slot = Some(chunk);
                *filled += 1;
            }
            _ => return Err(ProtocolError::MixedIndexing.into()),
        }
        self.bytes = self.bytes.saturating_add(chunk_len);
        Ok(())
    }

    fn check_bounds(&self, limits: &BufferLimits) -> Result<(), UnboundedStreamError> {
        let received = self.received();
        if received > limits.max_buffered_chunks.get() {
            return Err(UnboundedStreamError::TooManyChunks {
                buffered: received,
                limit: limits.max_buffered_chunks,
            });
        }
        if self.bytes > limits.max_buffered_bytes.get() {
            return Err(UnboundedStreamError::TooManyBytes {
                buffered: self.bytes,
                limit: limits.max_buffered_bytes,
            });
        }
        Ok(())
    }

    /// Reject chunks that arrived before the count was learned and now fall
    /// outside it.
    fn check_declared(&self) -> Result<(), OverflowError> {
        let Some(expected) = self.expected else {
            return Ok(());
        };
        match &self.chunks {
            Chunks::Arrival(chunks) if chunks.len() > expected as usize => {
                Err(OverflowError::ExceedsDeclared {
                    expected,
                    received: chunks.len(),
                })
            }
            Chunks::Indexed { slots, .. } if slots.len() > expected as usize => {
                let highest = u32::try_from(slots.len() - 1).unwrap_or(u32::MAX);
                Err(OverflowError::IndexOutOfRange {
                    index: highest,
                    expected,
                })
            }
            _ => Ok(()),
        }
    }
}
