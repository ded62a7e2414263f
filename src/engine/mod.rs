//! src/engine/mod.rs
//!
//! The Gossip Engine: the round task driving spec.md §4.4's per-round
//! sequence. Grounded on
//! `examples/osotsia-gossip-network/src/engine/mod.rs`'s actor shape
//! (owns its state, `run(shutdown_token)` loop via `tokio::select!`)
//! and `examples/original_source/gossip/agent.go`'s `BroadCast` loop,
//! generalized from a fixed-interval telemetry broadcast to the
//! topology-reconciliation / frame-assembly / persist / broadcast
//! sequence this specification names.

pub mod protocol;

use crate::buffer::MessageBuffer;
use crate::domain::{NodeId, Revision};
use crate::log::{EmittedLog, RoundLog};
use crate::status::StatusSource;
use crate::topology::TopologyStore;
use crate::transport::Transport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// The round task's owned state. `topology`, `buffer`, and
/// `current_revision` are shared with the receive task (spec.md §5);
/// everything else is local to this task.
pub struct Engine {
    self_id: NodeId,
    epochs: Revision,
    time_out_rev: Revision,
    tick_interval: Duration,
    topology: Arc<TopologyStore>,
    buffer: Arc<MessageBuffer>,
    emitted_log: Arc<EmittedLog>,
    round_log: Arc<RoundLog>,
    transport: Arc<Transport>,
    current_revision: Arc<AtomicU64>,
    status_source: Box<dyn StatusSource + Send + Sync>,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        self_id: NodeId,
        epochs: Revision,
        time_out_rev: Revision,
        tick_interval: Duration,
        topology: Arc<TopologyStore>,
        buffer: Arc<MessageBuffer>,
        emitted_log: Arc<EmittedLog>,
        round_log: Arc<RoundLog>,
        transport: Arc<Transport>,
        current_revision: Arc<AtomicU64>,
        status_source: Box<dyn StatusSource + Send + Sync>,
    ) -> Self {
        Self {
            self_id,
            epochs,
            time_out_rev,
            tick_interval,
            topology,
            buffer,
            emitted_log,
            round_log,
            transport,
            current_revision,
            status_source,
        }
    }

    /// Runs until `currentRevision == ep + 10` or `shutdown` fires
    /// (spec.md §4.4 step 6), then appends the shutdown summary line.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(self_id = %self.self_id, epochs = self.epochs, "round task started");
        let mut ticker = time::interval(self.tick_interval);
        let mut messages_sent: u64 = 0;
        let stop_at = self.epochs + 10;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("round task received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let revision = self.current_revision.load(Ordering::Acquire);
                    messages_sent += self.run_round(revision).await;
                    self.current_revision.store(revision + 1, Ordering::Release);
                    if revision + 1 == stop_at {
                        tracing::info!(revision = revision + 1, "round budget exhausted, stopping");
                        break;
                    }
                }
            }
        }

        if let Err(err) = self.round_log.record_summary(messages_sent, self.epochs) {
            tracing::warn!(error = %err, "failed to write shutdown summary");
        }
        tracing::info!(messages_sent, epochs = self.epochs, "round task stopped");
    }

    /// Executes the body of one round (spec.md §4.4 steps 1-4); the
    /// caller owns revision increment and the stop check (step 5-6).
    /// Returns the `messages_sent` delta for this round.
    async fn run_round(&self, current_revision: Revision) -> u64 {
        for stale in self.topology.stale_neighbors(&self.self_id, current_revision, self.time_out_rev) {
            tracing::debug!(neighbor = %stale, "dropping stale neighbor edge");
            self.topology.remove_edge(&self.self_id, &stale);
        }

        let status = if current_revision == 0 {
            crate::domain::NodeData::new()
        } else {
            self.status_source.sample()
        };

        let drained = self.buffer.drain();
        let result = protocol::generate_gossip_message(
            &self.self_id,
            current_revision,
            status,
            &self.topology,
            drained,
            self.epochs,
        );

        for (node_id, revision) in &result.emitted {
            if let Err(err) = self.emitted_log.record(node_id, *revision) {
                tracing::warn!(error = %err, "failed to persist emitted instance");
            }
        }

        match serde_json::to_vec(&result.message) {
            Ok(bytes) => {
                if let Err(err) = self.transport.broadcast(&bytes).await {
                    tracing::warn!(error = %err, "broadcast send failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode outgoing frame"),
        }

        tracing::trace!(
            revision = current_revision,
            relays = result.message.msgs.len(),
            "round complete"
        );
        result.messages_sent
    }
}
