//! src/receive.rs
//!
//! The Receive Path (spec.md §4.5): decodes inbound datagrams, applies
//! the distance filter, and writes into the Topology Store and Message
//! Buffer. Grounded on `examples/original_source/gossip/process.go`'s
//! `ReceiveMsg`/`HandleMsg`, generalized to the richer `SendMessage`
//! shape (`PrevAdj`, distance filter, chunk reassembly) this
//! specification adds on top of that source.

use crate::buffer::MessageBuffer;
use crate::domain::{GossipMessage, NodeId, Path, Revision};
use crate::log::RoundLog;
use crate::topology::TopologyStore;
use tracing::{debug, trace, warn};

/// One inbound datagram's worth of shared state the Receive Path
/// touches. Borrowed, never owned: the Gossip Engine and Receive Path
/// share these stores for the lifetime of the agent (spec.md §5).
pub struct ReceiveContext<'a> {
    pub self_id: &'a NodeId,
    pub current_revision: Revision,
    pub distance: i64,
    pub ep: Revision,
    pub topology: &'a TopologyStore,
    pub buffer: &'a MessageBuffer,
    pub round_log: &'a RoundLog,
}

/// Decodes and processes one already-reassembled `GossipMessage`
/// datagram, per spec.md §4.5 steps 1-7. Every failure path (decode
/// error, self-echo, distance reject) is a silent drop per spec.md §7's
/// "Filter reject" / "Decode failure" rows — logged, never propagated.
pub fn handle_datagram(bytes: &[u8], ctx: &ReceiveContext<'_>) {
    let msg: GossipMessage = match serde_json::from_slice(bytes) {
        Ok(msg) => msg,
        Err(err) => {
            warn!(error = %err, "dropping malformed gossip datagram");
            return;
        }
    };
    handle_message(msg, ctx);
}

/// Same as [`handle_datagram`] but for an already-decoded frame (used
/// directly once chunk reassembly has produced one).
pub fn handle_message(msg: GossipMessage, ctx: &ReceiveContext<'_>) {
    let dmsg = msg.self_msg;

    if dmsg.node_id == *ctx.self_id {
        trace!("dropping own echo");
        return;
    }

    let delta = node_distance(&dmsg.node_id, ctx.self_id);
    if delta.unsigned_abs() > ctx.distance.unsigned_abs() {
        debug!(origin = %dmsg.node_id, delta, "dropping frame: distance filter");
        return;
    }

    if dmsg.revision > 0 && dmsg.revision < ctx.ep {
        let latency = ctx.current_revision as i64 - dmsg.revision as i64;
        if let Err(err) = ctx.round_log.record_received(&dmsg.node_id, dmsg.revision, latency) {
            warn!(error = %err, "round log write failed");
        }
    }

    ctx.topology.add_edge(ctx.self_id, &dmsg.node_id);
    ctx.topology.set_neighbor_rev(&dmsg.node_id, dmsg.revision);

    ctx.buffer.record(dmsg.clone(), Path::new(vec![dmsg.node_id.clone()]), ctx.ep);

    for sm in msg.msgs {
        ctx.topology.add_edge(&dmsg.node_id, &sm.prev_node);
        for pn in &sm.prev_adj {
            ctx.topology.add_edge(&sm.prev_node, pn);
        }

        if let Some(node_msg) = sm.node_msg {
            if node_msg.node_id == *ctx.self_id {
                continue;
            }
            if node_msg.revision > 0 && node_msg.revision < ctx.ep {
                let latency = ctx.current_revision as i64 - node_msg.revision as i64;
                if let Err(err) = ctx.round_log.record_received(&node_msg.node_id, node_msg.revision, latency) {
                    warn!(error = %err, "round log write failed");
                }
            }
            let path = Path::new(vec![sm.prev_node.clone(), dmsg.node_id.clone()]);
            ctx.buffer.record(node_msg, path, ctx.ep);
        }
    }
}

/// The signed distance between two NodeIds (spec.md §4.5 step 3 /
/// glossary "Distance filter"). IPv4 dotted-quads are interpreted as
/// 32-bit integers; non-IP identifiers fall back to a deterministic
/// total order so the filter remains well-defined (spec.md §9 open
/// question: "an implementation may substitute any total order").
pub fn node_distance(a: &NodeId, b: &NodeId) -> i64 {
    match (a.as_ipv4(), b.as_ipv4()) {
        (Some(ai), Some(bi)) => u32::from(ai) as i64 - u32::from(bi) as i64,
        _ => fallback_rank(a) - fallback_rank(b),
    }
}

/// A deterministic (not hash-randomized) numeric rank for non-IP
/// identifiers, stable across process restarts so the distance filter
/// behaves consistently in repeat runs.
fn fallback_rank(id: &NodeId) -> i64 {
    let mut hash: i64 = 1469598103934665603; // FNV offset basis, truncated to i64 range.
    for byte in id.as_str().bytes() {
        hash ^= byte as i64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
