//! `chunkframe` server binary.
//!
//! Parses CLI arguments, installs logging and the optional Prometheus
//! exporter, and serves sessions with the passthrough transform until Ctrl+C.

mod cli;

use std::{num::NonZeroUsize, time::Duration};

use chunkframe::{
    BufferLimits,
    Passthrough,
    Server,
    SessionConfig,
    StreamErrorPolicy,
};
use clap::Parser;
use thiserror::Error;

/// Invalid combinations of command line flags.
#[derive(Debug, Error, PartialEq, Eq)]
enum CliError {
    #[error("--{0} must be greater than zero")]
    Zero(&'static str),
}

fn non_zero(value: usize, flag: &'static str) -> Result<NonZeroUsize, CliError> {
    NonZeroUsize::new(value).ok_or(CliError::Zero(flag))
}

fn session_config(cli: &cli::Cli) -> Result<SessionConfig, CliError> {
    let limits = BufferLimits {
        max_buffered_chunks: non_zero(cli.max_buffered_chunks, "max-buffered-chunks")?,
        max_buffered_bytes: non_zero(cli.max_buffered_bytes, "max-buffered-bytes")?,
        stream_timeout: cli
            .stream_timeout_secs
            .map(|secs| match secs {
                0 => Err(CliError::Zero("stream-timeout-secs")),
                secs => Ok(Duration::from_secs(secs)),
            })
            .transpose()?,
    };
    let mut config = SessionConfig::default()
        .with_chunk_size(non_zero(cli.chunk_size, "chunk-size")?)
        .with_limits(limits);
    if cli.single_use {
        config = config.single_use();
    }
    if cli.strict {
        config = config.with_error_policy(StreamErrorPolicy::CloseSession);
    }
    Ok(config)
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(addr) = addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "serving Prometheus metrics");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
    if addr.is_some() {
        tracing::warn!("--metrics-addr ignored: built without the `metrics` feature");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let config = session_config(&cli)?;
    install_metrics(cli.metrics_addr)?;

    let mut server = Server::new(Passthrough)
        .session_config(config)
        .max_frame_length(cli.max_frame_length);
    if let Some(workers) = cli.workers {
        server = server.workers(workers);
    }
    server.bind(cli.bind)?.run().await?;
    Ok(())
}
