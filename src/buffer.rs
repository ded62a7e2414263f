//! src/buffer.rs
//!
//! The Message Buffer: the set of foreign node-messages learned since
//! the last broadcast, each annotated with its arrival paths (spec.md
//! §3, §4.3). Entries are never created for the local node's own
//! messages, never mutated except to append a `Path`, and live for
//! exactly one round (`drain` empties the buffer atomically).

use crate::domain::{NodeId, NodeMessage, Path, Revision};
use crate::log::EmittedLog;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct BufferEntry {
    pub msg: NodeMessage,
    pub paths: Vec<Path>,
}

pub struct MessageBuffer {
    self_id: NodeId,
    emitted: Arc<EmittedLog>,
    entries: Mutex<HashMap<String, BufferEntry>>,
}

impl MessageBuffer {
    pub fn new(self_id: NodeId, emitted: Arc<EmittedLog>) -> Self {
        Self { self_id, emitted, entries: Mutex::new(HashMap::new()) }
    }

    /// Appends `arrival_path` to the entry for `msg`, creating it if
    /// absent. Silently drops the message if:
    /// - it originates at the local node (spec.md §3 invariant i), or
    /// - `msg.revision >= ep` (the round budget / simulation cutoff), or
    /// - `(msg.node_id, msg.revision)` has already been emitted by this
    ///   node in an earlier round (checked against the emitted-instance
    ///   log, spec.md §6).
    ///
    /// Returns `true` if the message was recorded.
    pub fn record(&self, msg: NodeMessage, arrival_path: Path, ep: Revision) -> bool {
        if msg.node_id == self.self_id {
            return false;
        }
        if msg.revision >= ep {
            return false;
        }
        if self.emitted.contains(&msg.node_id, msg.revision) {
            return false;
        }

        let key = msg.key();
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(key)
            .or_insert_with(|| BufferEntry { msg, paths: Vec::new() })
            .paths
            .push(arrival_path);
        true
    }

    /// Returns and clears all entries for the current round in one
    /// atomic step (spec.md §5: "a consistent-snapshot `drain`").
    pub fn drain(&self) -> Vec<(String, BufferEntry)> {
        let mut entries = self.entries.lock().unwrap();
        std::mem::take(&mut *entries).into_iter().collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
