//! What a session does when one of its streams fails.

/// Response to a stream-level error.
///
/// Every stream error removes the offending stream's buffer and is reported
/// to the peer. The policy decides whether the session survives it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamErrorPolicy {
    /// Drop the failed stream and keep serving the session.
    ///
    /// Other in-flight streams are unaffected. Undecodable frames are
    /// tolerated up to the configured consecutive-failure limit.
    #[default]
    DropStream,

    /// Close the whole session on the first stream error.
    CloseSession,
}

impl StreamErrorPolicy {
    /// Returns the policy name as a static string for logging.
    ///
    /// ```
    /// use chunkframe::session::StreamErrorPolicy;
    ///
    /// assert_eq!(StreamErrorPolicy::DropStream.as_str(), "drop_stream");
    /// assert_eq!(StreamErrorPolicy::CloseSession.as_str(), "close_session");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DropStream => "drop_stream",
            Self::CloseSession => "close_session",
        }
    }
}
