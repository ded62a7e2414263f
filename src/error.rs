//! src/error.rs
//!
//! The library's `Error` enum, via `thiserror`. Per spec.md §7 only
//! configuration/startup failures (socket bind, address resolution,
//! config load) are fatal and ever surface through this type out of
//! `App::run`; decode failures, transient I/O, filter rejects, and
//! invariant violations are handled locally (logged, or silently
//! dropped) and never become an `Error`.

use std::net::SocketAddr;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to resolve broadcast/peer address {0}: {1}")]
    AddressResolution(String, #[source] std::io::Error),

    #[error("Failed to bind UDP socket on {0}: {1}")]
    SocketBind(SocketAddr, #[source] std::io::Error),

    #[error("Tokio task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Could not determine a non-loopback IPv4 address for this host")]
    NoUsableAddress,
}
