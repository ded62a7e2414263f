//! src/app.rs
//!
//! Wires the Topology Store, Message Buffer, logs, transport, and the
//! Gossip Engine into one running agent, and owns its two cooperating
//! tasks (spec.md §5: "a round task ... and a receive task"). Grounded
//! on `examples/osotsia-gossip-network/src/app.rs`'s `App` struct
//! (config + `CancellationToken`, `tokio::spawn` per service, `ctrl_c`
//! shutdown, joined on exit).

use crate::buffer::MessageBuffer;
use crate::chunking::ChunkReassembler;
use crate::config::Config;
use crate::domain::{GossipMessage, GossipMessageWithChunks, NodeId};
use crate::engine::Engine;
use crate::error::Result;
use crate::log::{EmittedLog, RoundLog};
use crate::receive::{self, ReceiveContext};
use crate::status::RandomStatusSource;
use crate::topology::TopologyStore;
use crate::transport::{self, Transport, MAX_DATAGRAM_SIZE};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The wall-clock period between rounds. The scheduler that drives this
/// cadence is an out-of-scope external collaborator (spec.md §1); this
/// is simply the concrete value this binary runs with.
const ROUND_INTERVAL: Duration = Duration::from_secs(1);

/// Encapsulates one running agent: its configuration and the lifecycle
/// of its two cooperating tasks.
pub struct App {
    config: Config,
    shutdown_token: CancellationToken,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self { config, shutdown_token: CancellationToken::new() })
    }

    /// Resolves the self `NodeId` (spec.md §6: `Hostname` env override,
    /// else the first non-loopback IPv4 address), wires the shared
    /// stores, spawns the round task and the receive task, and blocks
    /// until both stop (via the round budget, a stop signal, or Ctrl+C).
    pub async fn run(self) -> Result<()> {
        let self_id = match &self.config.hostname {
            Some(hostname) => NodeId::from(hostname.clone()),
            None => NodeId::from(transport::detect_local_ipv4()?.to_string()),
        };

        tracing::info!(
            self_id = %self_id,
            epochs = self.config.epochs,
            distance = self.config.distance,
            "starting agent"
        );

        let topology = Arc::new(TopologyStore::new());
        let emitted_log = Arc::new(EmittedLog::open(self.config.log_path.join("gossip_logs.txt"))?);
        let round_log = Arc::new(RoundLog::open(&self.config.log_path, &self_id)?);
        let buffer = Arc::new(MessageBuffer::new(self_id.clone(), emitted_log.clone()));
        let transport = Arc::new(Transport::bind(self.config.broadcast_port, self.config.peers.clone())?);
        let current_revision = Arc::new(AtomicU64::new(0));

        let engine = Engine::new(
            self_id.clone(),
            self.config.epochs,
            self.config.effective_time_out_rev(),
            ROUND_INTERVAL,
            topology.clone(),
            buffer.clone(),
            emitted_log,
            round_log.clone(),
            transport.clone(),
            current_revision.clone(),
            Box::new(RandomStatusSource),
        );
        let round_task = tokio::spawn(engine.run(self.shutdown_token.clone()));
        tracing::debug!("round task spawned");

        let receive_task = tokio::spawn(run_receive_task(
            self_id,
            self.config.distance,
            self.config.epochs,
            topology,
            buffer,
            round_log,
            current_revision,
            transport,
            self.shutdown_token.clone(),
        ));
        tracing::debug!("receive task spawned");

        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, initiating graceful shutdown");
                shutdown_token.cancel();
            }
        });

        self.shutdown_token.cancelled().await;

        if let Err(err) = round_task.await {
            tracing::error!(error = ?err, "round task panicked");
        }
        if let Err(err) = receive_task.await {
            tracing::error!(error = ?err, "receive task panicked");
        }

        tracing::info!("agent shut down cleanly");
        Ok(())
    }
}

/// The receive task body (spec.md §4.5 and §5's "receive task"):
/// blocks on the socket, reassembles chunked frames, and hands
/// complete frames to the Receive Path.
#[allow(clippy::too_many_arguments)]
async fn run_receive_task(
    self_id: NodeId,
    distance: i64,
    ep: crate::domain::Revision,
    topology: Arc<TopologyStore>,
    buffer: Arc<MessageBuffer>,
    round_log: Arc<RoundLog>,
    current_revision: Arc<AtomicU64>,
    transport: Arc<Transport>,
    shutdown: CancellationToken,
) {
    let reassembler = ChunkReassembler::new();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("receive task received shutdown signal");
                break;
            }
            result = transport.recv(&mut buf) => {
                match result {
                    Ok((n, from)) => {
                        let ctx = ReceiveContext {
                            self_id: &self_id,
                            current_revision: current_revision.load(Ordering::Acquire),
                            distance,
                            ep,
                            topology: &topology,
                            buffer: &buffer,
                            round_log: &round_log,
                        };
                        process_datagram(&buf[..n], &reassembler, &ctx, from);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "udp recv failed");
                    }
                }
            }
        }
    }
}

fn process_datagram(
    bytes: &[u8],
    reassembler: &ChunkReassembler,
    ctx: &ReceiveContext<'_>,
    from: std::net::SocketAddr,
) {
    if let Ok(msg) = serde_json::from_slice::<GossipMessage>(bytes) {
        receive::handle_message(msg, ctx);
        return;
    }
    match serde_json::from_slice::<GossipMessageWithChunks>(bytes) {
        Ok(fragment) => {
            if let Some(result) = reassembler.feed(fragment) {
                match result {
                    Ok(msg) => receive::handle_message(msg, ctx),
                    Err(err) => tracing::warn!(error = %err, "dropping malformed reassembled datagram"),
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, peer = %from, "dropping undecodable datagram");
        }
    }
}
