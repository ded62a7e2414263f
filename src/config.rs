//! src/config.rs
//!
//! The strongly-typed `Config` struct for all runtime parameters
//! (spec.md §6 "CLI" / "Environment variables"), loaded via `figment`
//! layering: built-in defaults, an optional `gossip.toml`, environment
//! variables, then the two positional CLI arguments applied last so
//! they win over everything else. Grounded on
//! `examples/osotsia-gossip-network/src/config.rs`'s figment layering
//! and `figment::Jail`-based tests, generalized from a TOML-and-env-only
//! layout to also accept positional args (the teacher has none, since
//! its config carries no CLI-positional parameters).

use crate::domain::Revision;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level struct holding all application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Positional CLI arg 1: round budget (spec.md §6, default 100).
    pub epochs: Revision,
    /// Positional CLI arg 2: distance filter bound (spec.md §6, default 100).
    pub distance: i64,
    /// `Hostname` env var override for the self NodeId; `None` derives
    /// it from the first non-loopback IPv4 interface address.
    pub hostname: Option<String>,
    /// `BroadcastPort` env var override (default 9898).
    #[serde(alias = "broadcastport")]
    pub broadcast_port: u16,
    /// `LOG_PATH` env var override for per-node log file directory.
    pub log_path: PathBuf,
    /// Explicit peer list; when non-empty, each address receives a
    /// direct datagram instead of a broadcast (spec.md §6).
    pub peers: Vec<SocketAddr>,
    /// `TimeOutRev` override. `None` means "reset to the round budget
    /// at startup" (spec.md §4.1, §9 "Global configuration").
    pub time_out_rev: Option<Revision>,
}

impl Config {
    /// Loads configuration from built-in defaults, `gossip.toml`,
    /// environment variables, and finally the process's positional
    /// arguments (`epochs`, `distance`), each layer overriding the last.
    pub fn load() -> Result<Self, figment::Error> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("gossip.toml"))
            .merge(Env::raw())
            .extract()?;
        apply_positional_args(&mut config, std::env::args().skip(1));
        Ok(config)
    }

    /// The `TimeOutRev` actually used at runtime: the configured
    /// override, or else the round budget itself (spec.md §4.1:
    /// "default 5; reset to the round budget at startup").
    pub fn effective_time_out_rev(&self) -> Revision {
        self.time_out_rev.unwrap_or(self.epochs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epochs: 100,
            distance: 100,
            hostname: None,
            broadcast_port: 9898,
            log_path: PathBuf::from("."),
            peers: Vec::new(),
            time_out_rev: None,
        }
    }
}

/// Applies up to two positional arguments — `epochs` then `distance` —
/// on top of whatever figment already resolved. A malformed or absent
/// argument leaves the corresponding field untouched.
fn apply_positional_args(config: &mut Config, mut args: impl Iterator<Item = String>) {
    if let Some(epochs) = args.next().and_then(|s| s.parse().ok()) {
        config.epochs = epochs;
    }
    if let Some(distance) = args.next().and_then(|s| s.parse().ok()) {
        config.distance = distance;
    }
}
