//! tests/integration/chunking.rs
//!
//! The "Chunk reassembly" scenario from spec.md §8: a large
//! `GossipMessage` split into multiple datagram-sized fragments,
//! delivered out of order, must reassemble and process identically to a
//! single-datagram delivery through the same Receive Path the running
//! agent uses.

use crate::common::harness::TestNode;
use broadcast_gossip::chunking::{split_into_chunks, ChunkReassembler};
use broadcast_gossip::domain::{GossipMessage, NodeData, NodeId, NodeMessage, SendMessage};

fn n(s: &str) -> NodeId {
    NodeId::from(s)
}

/// A GossipMessage carrying a payload large enough (~130 KB) that it
/// must be split across multiple fragments at a realistic MTU-sized
/// chunk length.
fn oversized_message() -> GossipMessage {
    let mut data = NodeData::new();
    data.insert("Blob".to_string(), "x".repeat(130_000));
    GossipMessage {
        self_msg: NodeMessage::new(n("A"), 3, data),
        msgs: vec![SendMessage::advertisement(n("B"), vec![n("A")])],
    }
}

#[test]
fn out_of_order_chunks_reassemble_to_the_original_frame() {
    let original = oversized_message();
    let mut chunks = split_into_chunks(&original, n("A"), 3, 1400).unwrap();
    assert!(chunks.len() >= 3, "a 130KB payload at a 1400-byte MTU must split into several chunks");
    chunks.reverse();

    let reassembler = ChunkReassembler::new();
    let mut reassembled = None;
    for chunk in chunks {
        if let Some(result) = reassembler.feed(chunk) {
            reassembled = Some(result.unwrap());
        }
    }
    let reassembled = reassembled.expect("all chunks delivered, reassembly must complete");
    assert_eq!(reassembled.self_msg, original.self_msg);
    assert_eq!(reassembled.msgs.len(), original.msgs.len());
}

#[test]
fn reassembled_frame_processes_identically_to_a_single_datagram() {
    let direct = TestNode::new("10.0.0.1");
    let via_chunks = TestNode::new("10.0.0.1");

    let msg = oversized_message();
    direct.receive(msg.clone(), 100, 100);

    let chunks = split_into_chunks(&msg, n("A"), 3, 1400).unwrap();
    let reassembler = ChunkReassembler::new();
    let mut reassembled = None;
    for chunk in chunks {
        if let Some(result) = reassembler.feed(chunk) {
            reassembled = Some(result.unwrap());
        }
    }
    via_chunks.receive(reassembled.expect("reassembly must complete"), 100, 100);

    assert_eq!(direct.topology.vertices().len(), via_chunks.topology.vertices().len());
    assert_eq!(direct.buffer.drain().len(), via_chunks.buffer.drain().len());
}
