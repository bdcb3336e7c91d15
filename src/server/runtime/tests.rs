//! Tests for server runtime behaviour.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use rstest::rstest;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::yield_now,
    time::{Duration, Instant, advance, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{AcceptLoopOptions, BackoffConfig, Server, accept::AcceptListener, accept_loop};
use crate::{
    server::test_util::{bind_server, free_listener, session_context},
    transform::Passthrough,
};

/// Listener whose every accept fails, recording when it was called.
struct FailingListener {
    calls: Arc<Mutex<Vec<Instant>>>,
}

#[async_trait]
impl AcceptListener for FailingListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.calls.lock().expect("lock").push(Instant::now());
        Err(io::Error::other("mock error"))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok("127.0.0.1:0".parse().expect("addr parse"))
    }
}

fn options(
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
    backoff: BackoffConfig,
) -> AcceptLoopOptions {
    AcceptLoopOptions {
        context: session_context(Arc::new(Passthrough)),
        shutdown: shutdown.clone(),
        tracker: tracker.clone(),
        backoff,
    }
}

#[rstest]
#[tokio::test]
async fn test_run_with_immediate_shutdown(free_listener: std::net::TcpListener) {
    let server = bind_server(free_listener);
    let shutdown_future = async { tokio::time::sleep(Duration::from_millis(10)).await };
    let result = timeout(
        Duration::from_millis(1000),
        server.run_with_shutdown(shutdown_future),
    )
    .await;
    assert!(result.expect("server did not finish in time").is_ok());
}

#[rstest]
#[tokio::test]
async fn test_multiple_workers_shut_down(free_listener: std::net::TcpListener) {
    let server = Server::new(Passthrough)
        .workers(3)
        .bind_existing_listener(free_listener)
        .expect("Failed to bind");
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        server
            .run_with_shutdown(async {
                let _ = rx.await;
            })
            .await
            .expect("server run failed");
    });
    let _ = tx.send(());
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("server did not stop")
        .expect("server join error");
}

#[rstest]
#[tokio::test]
async fn test_shutdown_closes_live_sessions(free_listener: std::net::TcpListener) {
    let addr = free_listener.local_addr().expect("addr");
    let server = bind_server(free_listener);
    let registry = server.registry();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run_with_shutdown(async {
        let _ = rx.await;
    }));

    let client = TcpStream::connect(addr).await.expect("connect");
    for _ in 0..100 {
        if !registry.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(registry.len(), 1);

    let _ = tx.send(());
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("server did not stop with a session open")
        .expect("join")
        .expect("server run failed");
    assert!(registry.is_empty());
    drop(client);
}

#[rstest]
#[tokio::test]
async fn test_accept_loop_shutdown_signal() {
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let listener = Arc::new(
        TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener"),
    );

    tracker.spawn(accept_loop(
        listener,
        options(&token, &tracker, BackoffConfig::default()),
    ));

    token.cancel();
    tracker.close();

    let result = timeout(Duration::from_millis(100), tracker.wait()).await;
    assert!(result.is_ok());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_accept_loop_exponential_backoff() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let listener = Arc::new(FailingListener {
        calls: Arc::clone(&calls),
    });
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let backoff = BackoffConfig {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };

    tracker.spawn(accept_loop(listener, options(&token, &tracker, backoff)));
    yield_now().await;
    assert_eq!(calls.lock().expect("lock").len(), 1);

    for ms in [5, 10, 20, 20] {
        advance(Duration::from_millis(ms)).await;
        yield_now().await;
    }

    token.cancel();
    advance(Duration::from_millis(20)).await;
    yield_now().await;
    tracker.close();
    tracker.wait().await;

    let calls = calls.lock().expect("lock");
    let intervals: Vec<_> = calls.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(intervals[..4], [5, 10, 20, 20].map(Duration::from_millis));
}

#[rstest]
#[case(5, 1, 1, 5)]
#[case(0, 0, 1, 1)]
#[case(10, 1000, 10, 1000)]
fn backoff_is_normalized(
    #[case] initial_ms: u64,
    #[case] max_ms: u64,
    #[case] expected_initial_ms: u64,
    #[case] expected_max_ms: u64,
) {
    let normalized = BackoffConfig {
        initial_delay: Duration::from_millis(initial_ms),
        max_delay: Duration::from_millis(max_ms),
    }
    .normalized();
    assert_eq!(normalized.initial_delay, Duration::from_millis(expected_initial_ms));
    assert_eq!(normalized.max_delay, Duration::from_millis(expected_max_ms));
}
