//! Lifecycle states of a session.

use std::fmt;

/// Where a session is in its lifecycle.
///
/// A session starts `Open`, moves through `Assembling`, `Transforming`, and
/// `Sending` for each completed stream, returns to `Assembling` for the next
/// one, and ends `Closed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no frame processed yet.
    #[default]
    Open,
    /// Accumulating chunks for one or more streams.
    Assembling,
    /// Waiting on the transform for a completed stream.
    Transforming,
    /// Writing the fragments of a transformed payload.
    Sending,
    /// Buffers released and transport closed.
    Closed,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assembling => "assembling",
            Self::Transforming => "transforming",
            Self::Sending => "sending",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
