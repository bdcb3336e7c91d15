//! Utilities for driving `chunkframe` sessions during tests.
//!
//! The helpers split payloads into chunk frames, run a
//! [`SessionCoordinator`](chunkframe::SessionCoordinator) against an
//! in-memory transport, talk to a running server over TCP, and inspect
//! metrics recorded with `metrics-util`.
//!
//! ```rust
//! use chunkframe::{Passthrough, SessionConfig};
//! use chunkframe_testing::{arrival_frames, drive_session};
//!
//! # async fn example() -> std::io::Result<()> {
//! let frames = arrival_frames("img,aGk=", 3);
//! let run = drive_session(SessionConfig::default(), Passthrough, frames).await?;
//! assert_eq!(run.output.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod chunks;
pub mod client;
pub mod drive;
pub mod metrics;

pub use chunks::{arrival_frames, indexed_frames, join_fragments, split_text};
pub use client::TestClient;
pub use drive::{SessionRun, drive_session};
pub use metrics::{counter_value, debugging_recorder_setup};
