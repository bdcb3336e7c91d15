//! Connection handling for [`Server`](super::Server).

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::FutureExt;
use log::{error, warn};
use tokio::net::TcpStream;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    assembler::SessionId,
    registry::SessionRegistry,
    session::{SessionConfig, SessionCoordinator},
    transform::TransformDispatcher,
    transport::FramedTransport,
};

/// Everything a worker needs to start a session for an accepted stream.
#[derive(Clone, Debug)]
pub(super) struct SessionContext {
    pub dispatcher: TransformDispatcher,
    pub config: SessionConfig,
    pub max_frame_length: usize,
    pub registry: Arc<SessionRegistry>,
    pub next_id: Arc<AtomicU64>,
}

impl SessionContext {
    fn next_session_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Spawn a task to serve a single TCP connection, logging and discarding any panics.
///
/// The session's shutdown token is a child of `shutdown`, so stopping the
/// server closes every live session.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    context: &SessionContext,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("Failed to retrieve peer address: error={e}");
            None
        }
    };
    let id = context.next_session_id();
    let token = shutdown.child_token();
    let registry = Arc::clone(&context.registry);
    registry.insert(id, token.clone());

    let context = context.clone();
    tracker.spawn(async move {
        let fut = std::panic::AssertUnwindSafe(serve_session(stream, peer_addr, id, token, context))
            .catch_unwind();

        if let Err(panic) = fut.await {
            crate::metrics::inc_session_panics();
            let panic_msg = crate::panic::format_panic(panic);
            // Logged through both `log` and `tracing`.
            error!("session task panicked: panic={panic_msg}, session={id}, peer_addr={peer_addr:?}");
            tracing::error!(panic = %panic_msg, session = %id, ?peer_addr, "session task panicked");
        }
        registry.remove(&id);
    });
}

async fn serve_session(
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
    id: SessionId,
    token: CancellationToken,
    context: SessionContext,
) {
    let SessionContext {
        dispatcher,
        config,
        max_frame_length,
        ..
    } = context;
    let transport = FramedTransport::new(stream, max_frame_length);
    let coordinator =
        SessionCoordinator::new(id, transport, dispatcher, config).with_shutdown(token);
    if let Err(e) = coordinator.run().await {
        warn!("session error: session={id}, error={e}, peer_addr={peer_addr:?}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::{sync::CancellationToken, task::TaskTracker};
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        server::test_util::{panicking_transform, session_context},
        transform::Passthrough,
        transport::Transport,
    };

    async fn serve_one(context: SessionContext, frames: &[&[u8]]) {
        let tracker = TaskTracker::new();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("listener.local_addr");

        let handle = tokio::spawn({
            let tracker = tracker.clone();
            async move {
                let (stream, _) = listener.accept().await.expect("accept");
                spawn_connection_task(stream, &context, &CancellationToken::new(), &tracker);
                tracker.close();
                tracker.wait().await;
            }
        });

        let client = TcpStream::connect(addr).await.expect("connect");
        let mut transport = FramedTransport::new(client, 1024);
        for frame in frames {
            transport
                .send(bytes::Bytes::copy_from_slice(frame))
                .await
                .expect("client send");
        }
        drop(transport);

        handle.await.expect("join connection task driver");
        tokio::task::yield_now().await;
    }

    /// A panicking transform fails only its stream; the task ends cleanly.
    #[rstest]
    #[traced_test]
    #[tokio::test]
    async fn transform_panic_stays_inside_the_session() {
        let context = session_context(Arc::new(panicking_transform()));
        let registry = Arc::clone(&context.registry);
        serve_one(context, &[br#"{"chunk":"img,AAEC","numChunks":1}"#.as_slice()]).await;

        assert!(registry.is_empty());
        assert!(logs_contain("stream failed"));
        assert!(!logs_contain("session task panicked"));
    }

    /// Sessions that end normally are removed from the registry.
    #[rstest]
    #[tokio::test]
    async fn finished_sessions_leave_the_registry() {
        let context = session_context(Arc::new(Passthrough));
        let registry = Arc::clone(&context.registry);
        serve_one(context, &[]).await;
        assert!(registry.is_empty());
    }
}
