//! src/engine/protocol.rs
//!
//! Pure frame-assembly and filtering logic for the round loop (spec.md
//! §4.4 "Frame assembly" and "MLST filter"), kept separate from
//! `engine/mod.rs`'s I/O-bound round task so the relay decision can be
//! tested without a socket or a clock. Grounded on
//! `examples/original_source/gossip/agent.go`'s `generateGossipMessage`
//! and `examples/original_source/gossip/process.go`'s
//! `MessageNeedSend`, generalized to this specification's richer
//! `SendMessage` (`PrevAdj`) and distance/chunking additions.

use crate::buffer::BufferEntry;
use crate::domain::{GossipMessage, NodeData, NodeId, NodeMessage, Revision, SendMessage};
use crate::mlst::compute_mlst10;
use crate::topology::TopologyStore;
use std::collections::HashSet;

/// The outcome of assembling one round's outgoing frame.
pub struct FrameResult {
    pub message: GossipMessage,
    /// `(nodeId, revision)` pairs to persist to the emitted-instance
    /// log (spec.md §6): the self-line, plus one line per relayed
    /// `nodeMsg`.
    pub emitted: Vec<(NodeId, Revision)>,
    /// Telemetry-only count (spec.md §4.4 "Message counting"): one for
    /// the self-message, one per relayed `SendMessage`.
    pub messages_sent: u64,
}

/// Builds the outgoing `GossipMessage` for one round.
///
/// `current_revision == 0` is the Greeting special case: an empty
/// self-message and a pure advertisement for every current direct
/// neighbor, no relays. Otherwise, every buffered entry is offered to
/// the [`mlst_filter`] in arrival-path insertion order; the first path
/// that passes wins and the entry is cited under that path's last hop.
/// Direct neighbors not cited by any relay get a trailing
/// advertisement so receivers keep learning the local adjacency.
pub fn generate_gossip_message(
    self_id: &NodeId,
    current_revision: Revision,
    status: NodeData,
    topology: &TopologyStore,
    drained: Vec<(String, BufferEntry)>,
    ep: Revision,
) -> FrameResult {
    if current_revision == 0 {
        let self_msg = NodeMessage::new(self_id.clone(), 0, NodeData::new());
        let msgs = topology
            .neighbors(self_id)
            .into_iter()
            .map(|n| {
                let adj = topology.neighbors(&n);
                SendMessage::advertisement(n, adj)
            })
            .collect();
        return FrameResult {
            message: GossipMessage { self_msg, msgs },
            emitted: vec![(self_id.clone(), 0)],
            messages_sent: 1,
        };
    }

    let self_msg = NodeMessage::new(self_id.clone(), current_revision, status);
    let mut msgs = Vec::new();
    let mut emitted = vec![(self_id.clone(), current_revision)];
    let mut messages_sent = 1u64;
    let mut cited: HashSet<NodeId> = HashSet::new();

    for (_, entry) in drained {
        for arrival_path in &entry.paths {
            let extended = arrival_path.extended(self_id.clone());
            if mlst_filter(topology, extended.as_slice(), self_id) {
                let prev_node = arrival_path.last_hop().clone();
                let prev_adj = topology.neighbors(&prev_node);
                emitted.push((entry.msg.node_id.clone(), entry.msg.revision));
                messages_sent += 1;
                cited.insert(prev_node.clone());
                msgs.push(SendMessage::relay(prev_node, prev_adj, entry.msg.clone()));
                break;
            }
        }
        // No arrival path passed the filter: this node has no relay
        // role for the entry this round, so it is simply dropped.
    }

    for neighbor in topology.neighbors(self_id) {
        if !cited.contains(&neighbor) {
            let adj = topology.neighbors(&neighbor);
            msgs.push(SendMessage::advertisement(neighbor, adj));
        }
    }

    FrameResult { message: GossipMessage { self_msg, msgs }, emitted, messages_sent }
}

/// The MLST filter (spec.md §4.4): given an extended path `[o, ...,
/// last, self]`, recompute the MLST rooted at the originator over the
/// 2-hop subgraph around the originator, and relay only if `self` is
/// an internal node of that tree on a path that actually exists in it.
pub fn mlst_filter(topology: &TopologyStore, path: &[NodeId], self_id: &NodeId) -> bool {
    if path.len() < 2 {
        return false;
    }
    let root = &path[0];
    let subgraph = topology.subgraph_within_hops(root, 2);
    let tree = compute_mlst10(&subgraph, root);
    if tree.is_leaf(self_id) {
        return false;
    }
    tree.path_exists(path)
}
