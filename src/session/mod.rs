//! Per-connection session handling.
//!
//! A session owns one transport and multiplexes any number of named streams
//! over it. [`SessionCoordinator`] drives the read, assemble, transform, and
//! send cycle; [`SessionConfig`] and [`StreamErrorPolicy`] tune how it reacts
//! to completion and failure.

pub mod config;
mod coordinator;
pub mod error;
pub mod policy;
pub mod state;

pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_PROTOCOL_FAILURES, SessionConfig};
pub use coordinator::{SessionCoordinator, SessionSummary};
pub use error::SessionError;
pub use policy::StreamErrorPolicy;
pub use state::SessionState;
