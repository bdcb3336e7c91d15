//! Identifiers for sessions and the streams they carry.

use std::fmt;

/// Identifier assigned to a session (one transport connection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl SessionId {
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "SessionId({})", self.0) }
}

/// Name of a logical stream within a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamName(String);

impl StreamName {
    /// Name used when frames do not select a stream.
    pub const DEFAULT: &'static str = "default";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for StreamName {
    fn default() -> Self { Self::new(Self::DEFAULT) }
}

impl From<&str> for StreamName {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for StreamName {
    fn from(value: String) -> Self { Self(value) }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Identifies one logical transfer: a stream name scoped to its session.
///
/// Two sessions reusing the same stream name produce distinct keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamKey {
    session: SessionId,
    stream: StreamName,
}

impl StreamKey {
    #[must_use]
    pub fn new(session: SessionId, stream: impl Into<StreamName>) -> Self {
        Self {
            session,
            stream: stream.into(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    #[must_use]
    pub fn stream(&self) -> &StreamName { &self.stream }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session.as_u64(), self.stream)
    }
}
