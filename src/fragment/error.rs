//! Errors emitted while fragmenting outbound payloads.

use thiserror::Error;

/// Errors produced while fragmenting outbound payloads.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The fragment count cannot be expressed as a `u32` index.
    #[error("payload needs {count} fragments, more than a u32 index can address")]
    TooManyFragments { count: usize },
}
