//! Command line interface for the `chunkframe` server binary.
//!
//! Kept free of crate-internal types so the build script can include it to
//! render the manual page.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `chunkframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "chunkframe",
    version,
    about = "Reassemble chunked payload streams, transform them, and send them back fragmented"
)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    pub bind: SocketAddr,

    /// Number of accept workers. Defaults to the number of CPU cores.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum characters per outbound fragment.
    #[arg(long, default_value_t = 64 * 1024)]
    pub chunk_size: usize,

    /// Maximum chunks buffered for one stream.
    #[arg(long, default_value_t = 4096)]
    pub max_buffered_chunks: usize,

    /// Maximum payload bytes buffered for one stream.
    #[arg(long, default_value_t = 32 * 1024 * 1024)]
    pub max_buffered_bytes: usize,

    /// Discard streams that receive no chunk for this many seconds.
    #[arg(long)]
    pub stream_timeout_secs: Option<u64>,

    /// Close each session after its first completed stream.
    #[arg(long)]
    pub single_use: bool,

    /// Close the session on any stream error instead of dropping the stream.
    #[arg(long)]
    pub strict: bool,

    /// Largest inbound message in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_frame_length: usize,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
