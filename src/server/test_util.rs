//! Test helpers shared across server modules.

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::{Arc, atomic::AtomicU64},
};

use rstest::fixture;

use super::{Bound, Server, connection::SessionContext};
use crate::{
    error::TransformError,
    payload::ReconstructedPayload,
    registry::SessionRegistry,
    session::SessionConfig,
    transform::{FnTransform, Passthrough, Transform, TransformDispatcher},
};

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents races where another process could
/// claim the port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

/// Extract the bound address from a listener.
#[must_use]
pub fn listener_addr(listener: &StdTcpListener) -> SocketAddr {
    listener
        .local_addr()
        .expect("failed to get listener address")
}

pub fn bind_server(listener: StdTcpListener) -> Server<Bound> {
    Server::new(Passthrough)
        .bind_existing_listener(listener)
        .expect("Failed to bind")
}

/// A transform that always panics.
pub fn panicking_transform()
-> FnTransform<impl Fn(ReconstructedPayload) -> Result<ReconstructedPayload, TransformError>> {
    FnTransform::new(|_| panic!("transform exploded"))
}

pub(super) fn session_context(transform: Arc<dyn Transform>) -> SessionContext {
    SessionContext {
        dispatcher: TransformDispatcher::new(transform),
        config: SessionConfig::default(),
        max_frame_length: 1024,
        registry: Arc::new(SessionRegistry::new()),
        next_id: Arc::new(AtomicU64::new(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_addr_matches_local_addr() {
        let listener = free_listener();
        assert_eq!(
            listener_addr(&listener),
            listener.local_addr().expect("failed to get address")
        );
        assert_eq!(listener_addr(&listener).ip(), std::net::IpAddr::from(Ipv4Addr::LOCALHOST));
    }
}
