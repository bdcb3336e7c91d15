//! Outbound splitting of payloads into ordered fragments.
//!
//! [`Fragmenter`] renders a transformed payload in text form and slices it
//! into [`Frame`](crate::frame::Frame)s of bounded size, each tagged with its
//! index, the total count, and the stream's correlation id. Joining the
//! fragment chunks in index order reproduces the payload text exactly.

pub mod error;
pub mod fragmenter;

pub use error::FragmentationError;
pub use fragmenter::{FragmentSet, Fragmenter};

#[cfg(test)]
mod tests;
