//! Configuration utilities for [`Server`].

use std::sync::{Arc, atomic::AtomicU64};

use tokio::sync::oneshot;

use super::{BackoffConfig, Server, ServerState, Unbound};
use crate::{
    registry::SessionRegistry,
    session::SessionConfig,
    transform::Transform,
    transport::clamp_frame_length,
};

pub mod binding;

#[cfg(test)]
mod tests;

/// Default maximum inbound message length (1 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

impl Server<Unbound> {
    /// Create a new `Server` applying `transform` to every completed stream.
    ///
    /// The worker count defaults to the number of available CPU cores (or 1 if
    /// this cannot be determined). The TCP listener is unset; call
    /// [`bind`](Self::bind) before running the server.
    #[must_use]
    pub fn new(transform: impl Transform) -> Self {
        let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            transform: Arc::new(transform),
            session_config: SessionConfig::default(),
            workers,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            backoff_config: BackoffConfig::default(),
            registry: Arc::new(SessionRegistry::new()),
            next_session_id: Arc::new(AtomicU64::new(1)),
            ready_tx: None,
            state: Unbound,
        }
    }
}

impl<S: ServerState> Server<S> {
    /// Set the number of worker tasks to spawn for the server.
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    /// Settings applied to every session accepted by this server.
    #[must_use]
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Largest inbound message accepted, clamped to the transport's bounds.
    #[must_use]
    pub fn max_frame_length(mut self, length: usize) -> Self {
        self.max_frame_length = clamp_frame_length(length);
        self
    }

    /// Configure accept-loop back-off.
    #[must_use]
    pub fn accept_backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff_config = config.normalized();
        self
    }

    /// Configure a channel used to signal when the server is ready to accept connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Returns the configured number of worker tasks for the server.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.workers }

    #[must_use]
    pub const fn session_settings(&self) -> &SessionConfig { &self.session_config }

    #[must_use]
    pub const fn frame_length_limit(&self) -> usize { self.max_frame_length }

    /// Shared registry of the sessions this server is running.
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> { Arc::clone(&self.registry) }
}
