#![doc(html_root_url = "https://docs.rs/chunkframe/latest")]
//! Public API for the `chunkframe` library.
//!
//! Peers send a payload as a sequence of chunk frames. Each session
//! reassembles its streams, hands the decoded payload to a [`Transform`],
//! and sends the result back re-fragmented into bounded frames that carry
//! the stream's correlation id.
//!
//! The crate is layered bottom-up: [`frame`] and [`payload`] define the wire
//! and text formats, [`assembler`] and [`fragment`] convert between chunks
//! and payloads, [`session`] drives one connection over a [`transport`], and
//! [`server`] accepts TCP connections and runs a session for each.

pub mod assembler;
pub mod correlation;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod metrics;
pub mod panic;
pub mod payload;
pub mod registry;
pub mod server;
pub mod session;
pub mod transform;
pub mod transport;

pub use assembler::{
    AssembledStream,
    BufferLimits,
    Ingest,
    SessionId,
    StreamAssembler,
    StreamKey,
    StreamName,
};
pub use correlation::{CorrelatableFrame, CorrelationId};
pub use error::{
    DecodeError,
    ErrorKind,
    OverflowError,
    ProtocolError,
    StreamError,
    TransformError,
    UnboundedStreamError,
};
pub use fragment::{FragmentSet, FragmentationError, Fragmenter};
pub use frame::{ErrorReport, Frame, FrameCodec};
pub use metrics::{Direction, FRAMES_PROCESSED, SESSIONS_ACTIVE, STREAM_ERRORS};
pub use payload::ReconstructedPayload;
pub use registry::SessionRegistry;
pub use server::{Server, ServerError};
pub use session::{
    SessionConfig,
    SessionCoordinator,
    SessionError,
    SessionState,
    SessionSummary,
    StreamErrorPolicy,
};
pub use transform::{FnTransform, Passthrough, Transform, TransformDispatcher};
pub use transport::{FramedTransport, MemoryPeer, MemoryTransport, Transport, memory_pair};
