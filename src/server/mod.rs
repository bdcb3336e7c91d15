//! Tokio-based TCP server hosting one session per connection.
//!
//! `Server` spawns worker tasks to accept TCP connections, wraps each stream
//! in a length-delimited transport, and hands it to a fresh
//! [`SessionCoordinator`](crate::session::SessionCoordinator). Sessions share
//! only the transform and the [`SessionRegistry`]; their buffers are private.

use std::sync::{Arc, atomic::AtomicU64};

use tokio::{net::TcpListener, sync::oneshot};

use crate::{registry::SessionRegistry, session::SessionConfig, transform::Transform};

/// Tokio-based server running a [`SessionCoordinator`](crate::session::SessionCoordinator)
/// per connection.
///
/// The server carries a typestate `S` indicating whether it is [`Unbound`]
/// (not yet bound to a TCP listener) or [`Bound`]. New servers start
/// `Unbound` and must call [`Server::bind`] or
/// [`Server::bind_existing_listener`] before running. A worker task is
/// spawned per configured worker; all of them accept from the same listener.
/// The server listens for a shutdown signal using `tokio::signal::ctrl_c`,
/// stops accepting, and closes every live session.
pub struct Server<S = Unbound>
where
    S: ServerState,
{
    pub(crate) transform: Arc<dyn Transform>,
    pub(crate) session_config: SessionConfig,
    pub(crate) workers: usize,
    pub(crate) max_frame_length: usize,
    pub(crate) backoff_config: BackoffConfig,
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) next_session_id: Arc<AtomicU64>,
    /// Channel used to notify when the server is ready.
    ///
    /// A `oneshot::Sender` can transmit only one readiness notification, so a
    /// new sender must be provided each time the server is started.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    /// Typestate tracking whether the server has been bound to a listener.
    pub(crate) state: S,
}

impl<S: ServerState> std::fmt::Debug for Server<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("session_config", &self.session_config)
            .field("workers", &self.workers)
            .field("max_frame_length", &self.max_frame_length)
            .field("backoff_config", &self.backoff_config)
            .finish_non_exhaustive()
    }
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod config;
pub use config::binding;
mod connection;
pub mod error;
mod runtime;

pub use error::ServerError;
/// Re-exported configuration types for server backoff behavior.
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
