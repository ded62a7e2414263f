//! src/chunking.rs
//!
//! Chunked framing for `GossipMessage`s that exceed the platform MTU
//! (spec.md §4.5). Senders split the JSON-encoded frame into
//! `GossipMessageWithChunks` records; the Receive Path reassembles by
//! concatenating `data` in `chunk_index` order once `total_chunks`
//! pieces have arrived. Incomplete reassembly state may be discarded at
//! the receiver's discretion (spec.md: "no retransmit").

use crate::domain::{GossipMessage, GossipMessageWithChunks, NodeId, Revision};
use std::collections::HashMap;
use std::sync::Mutex;

/// Splits a JSON-encoded `GossipMessage` into chunks no larger than
/// `max_chunk_size` bytes each.
pub fn split_into_chunks(
    msg: &GossipMessage,
    node_id: NodeId,
    revision: Revision,
    max_chunk_size: usize,
) -> serde_json::Result<Vec<GossipMessageWithChunks>> {
    let encoded = serde_json::to_vec(msg)?;
    let total_chunks = encoded.chunks(max_chunk_size).count().max(1) as u32;
    let chunks = encoded
        .chunks(max_chunk_size.max(1))
        .enumerate()
        .map(|(i, data)| GossipMessageWithChunks {
            chunk_index: i as u32,
            total_chunks,
            data: data.to_vec(),
            node_id: node_id.clone(),
            revision,
        })
        .collect();
    Ok(chunks)
}

struct PendingReassembly {
    total_chunks: u32,
    pieces: HashMap<u32, Vec<u8>>,
}

/// Accumulates in-flight chunk fragments keyed by `(nodeId, revision)`
/// and reassembles a `GossipMessage` once every piece has arrived.
#[derive(Default)]
pub struct ChunkReassembler {
    pending: Mutex<HashMap<String, PendingReassembly>>,
}

impl ChunkReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment in. Returns the reassembled `GossipMessage`
    /// once `total_chunks` distinct pieces for its key have been seen;
    /// otherwise `None`. Decode failures on the reassembled bytes are
    /// treated like any other decode failure (spec.md §4.5 step 1):
    /// the caller drops the datagram.
    pub fn feed(&self, fragment: GossipMessageWithChunks) -> Option<serde_json::Result<GossipMessage>> {
        let key = fragment.key();
        let mut pending = self.pending.lock().unwrap();
        let entry = pending.entry(key.clone()).or_insert_with(|| PendingReassembly {
            total_chunks: fragment.total_chunks,
            pieces: HashMap::new(),
        });
        entry.pieces.insert(fragment.chunk_index, fragment.data);

        if entry.pieces.len() as u32 >= entry.total_chunks {
            let entry = pending.remove(&key).unwrap();
            let mut bytes = Vec::new();
            for i in 0..entry.total_chunks {
                match entry.pieces.get(&i) {
                    Some(piece) => bytes.extend_from_slice(piece),
                    None => return Some(Err(missing_chunk_error())),
                }
            }
            return Some(serde_json::from_slice(&bytes));
        }
        None
    }

    /// Drops any reassembly state that has not completed. The receiver
    /// may call this periodically to bound memory; spec.md explicitly
    /// permits discarding incomplete state with no retransmit.
    pub fn clear_incomplete(&self) {
        self.pending.lock().unwrap().clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

fn missing_chunk_error() -> serde_json::Error {
    serde::de::Error::custom("chunk reassembly: a chunk index is missing despite reaching total_chunks count")
}
