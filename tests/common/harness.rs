//! tests/common/harness.rs
//!
//! A small in-process test harness for exercising a handful of
//! simulated agents against each other without a real UDP socket.
//! `TestNode` owns the same stores the real `Engine`/Receive Path use
//! (`TopologyStore`, `MessageBuffer`, `EmittedLog`, `RoundLog`) and
//! exposes `round()`/`receive()` as thin wrappers over
//! `engine::protocol::generate_gossip_message` and
//! `receive::handle_message` — the same functions the running agent
//! calls, just without the socket and the clock.

use broadcast_gossip::domain::{GossipMessage, NodeData, NodeId, Revision};
use broadcast_gossip::engine::protocol;
use broadcast_gossip::log::{EmittedLog, RoundLog};
use broadcast_gossip::buffer::MessageBuffer;
use broadcast_gossip::receive::{self, ReceiveContext};
use broadcast_gossip::topology::TopologyStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

pub struct TestNode {
    pub id: NodeId,
    pub topology: TopologyStore,
    pub buffer: MessageBuffer,
    pub emitted_log: Arc<EmittedLog>,
    pub round_log: RoundLog,
    pub current_revision: Revision,
    _dir: TempDir,
}

impl TestNode {
    pub fn new(id: &str) -> Self {
        let dir = tempdir().expect("tempdir");
        let emitted_log = Arc::new(EmittedLog::open(dir.path().join("gossip_logs.txt")).expect("open emitted log"));
        let node_id = NodeId::from(id);
        let round_log = RoundLog::open(dir.path(), &node_id).expect("open round log");
        Self {
            buffer: MessageBuffer::new(node_id.clone(), emitted_log.clone()),
            id: node_id,
            topology: TopologyStore::new(),
            emitted_log,
            round_log,
            current_revision: 0,
            _dir: dir,
        }
    }

    /// Pre-seeds a known adjacency, as if this node had already learned
    /// about `other` through some earlier receive.
    pub fn add_edge(&self, other: &NodeId) {
        self.topology.add_edge(&self.id, other);
    }

    /// Runs one round of frame assembly, persisting emitted instances
    /// and advancing `current_revision` exactly like the real round
    /// task's `run_round` (minus the socket send).
    pub fn round(&mut self, ep: Revision) -> GossipMessage {
        let drained = self.buffer.drain();
        let result = protocol::generate_gossip_message(
            &self.id,
            self.current_revision,
            NodeData::new(),
            &self.topology,
            drained,
            ep,
        );
        for (node_id, revision) in &result.emitted {
            self.emitted_log.record(node_id, *revision).expect("record emitted instance");
        }
        self.current_revision += 1;
        result.message
    }

    /// Feeds an already-decoded inbound frame through the Receive Path.
    pub fn receive(&self, msg: GossipMessage, distance: i64, ep: Revision) {
        let ctx = ReceiveContext {
            self_id: &self.id,
            current_revision: self.current_revision,
            distance,
            ep,
            topology: &self.topology,
            buffer: &self.buffer,
            round_log: &self.round_log,
        };
        receive::handle_message(msg, &ctx);
    }

    pub fn gossip_logs_path(&self) -> PathBuf {
        self._dir.path().join("gossip_logs.txt")
    }
}
