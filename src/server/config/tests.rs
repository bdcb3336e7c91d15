//! Tests for the [`Server`] builder and listener binding.

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use rstest::rstest;

use super::*;
use crate::{
    server::test_util::{free_listener, listener_addr},
    session::StreamErrorPolicy,
    transform::Passthrough,
    transport::{MAX_FRAME_LENGTH, MIN_FRAME_LENGTH},
};

fn expected_default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[rstest]
fn new_server_uses_defaults() {
    let server = Server::new(Passthrough);
    assert_eq!(server.worker_count(), expected_default_worker_count());
    assert!(server.local_addr().is_none());
    assert_eq!(server.frame_length_limit(), DEFAULT_MAX_FRAME_LENGTH);
    assert_eq!(server.session_settings(), &SessionConfig::default());
    assert!(server.registry().is_empty());
}

#[rstest]
#[case(4, 4)]
#[case(100, 100)]
#[case(0, 1)]
fn workers_are_at_least_one(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(Server::new(Passthrough).workers(requested).worker_count(), expected);
}

#[rstest]
#[case(0, MIN_FRAME_LENGTH)]
#[case(4096, 4096)]
#[case(usize::MAX, MAX_FRAME_LENGTH)]
fn frame_length_is_clamped(#[case] requested: usize, #[case] expected: usize) {
    let server = Server::new(Passthrough).max_frame_length(requested);
    assert_eq!(server.frame_length_limit(), expected);
}

#[rstest]
fn accept_backoff_is_normalized() {
    let cfg = BackoffConfig {
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_millis(5),
    };
    let server = Server::new(Passthrough).accept_backoff(cfg);
    assert_eq!(server.backoff_config.initial_delay, Duration::from_millis(5));
    assert_eq!(server.backoff_config.max_delay, Duration::from_millis(500));
}

#[rstest]
#[tokio::test]
async fn settings_survive_binding(free_listener: std::net::TcpListener) {
    let expected_addr = listener_addr(&free_listener);
    let config = SessionConfig::default()
        .single_use()
        .with_error_policy(StreamErrorPolicy::CloseSession);
    let server = Server::new(Passthrough)
        .workers(2)
        .session_config(config.clone())
        .max_frame_length(2048)
        .bind_existing_listener(free_listener)
        .expect("bind");

    assert_eq!(server.local_addr(), Some(expected_addr));
    assert_eq!(server.worker_count(), 2);
    assert_eq!(server.frame_length_limit(), 2048);
    assert_eq!(server.session_settings(), &config);
}

#[rstest]
#[tokio::test]
async fn bound_server_can_rebind() {
    let localhost = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    let server = Server::new(Passthrough).bind(localhost).expect("bind");
    let first = server.local_addr().expect("first addr");
    let server = server.bind(localhost).expect("rebind");
    let second = server.local_addr().expect("second addr");
    assert_ne!(first, second);
}

#[rstest]
#[tokio::test]
async fn binding_an_address_in_use_fails(free_listener: std::net::TcpListener) {
    let addr = listener_addr(&free_listener);
    let err = Server::new(Passthrough)
        .bind(addr)
        .expect_err("address already bound");
    assert!(matches!(err, crate::server::ServerError::Bind(_)));
}
