//! src/log.rs
//!
//! The two persistent artifacts described in spec.md §6:
//!
//! - `./gossip_logs.txt` — one line per emitted message instance
//!   (`"<nodeId> <revision>\n"`), consulted by the Message Buffer to
//!   suppress re-buffering of instances this node has already emitted in
//!   an earlier round (spec.md §4.3, §8 invariant 5: no `(nodeId,
//!   revision)` pair appears twice across the lifetime of an agent).
//! - `<LOG_PATH>/<selfId>` — one line per received non-self non-zero
//!   revision message (`"<nodeId>_<revision> <latency>\n"`), with a
//!   final summary line on shutdown.
//!
//! Grounded on the original's `common/db.go`, adapted: spec.md's
//! Non-goals exclude on-disk persistence of received *messages*
//! (SQLite storage of `NodeMessage` payloads), but the append-only round
//! log and emitted-instance log are explicit external interfaces
//! (spec.md §6), not the persistence the Non-goal excludes.

use crate::domain::{buffer_key, NodeId, Revision};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Append-only log of every `(NodeId, Revision)` this node has emitted,
/// across the lifetime of the agent. Consulted by the Message Buffer
/// before buffering a freshly-received instance.
pub struct EmittedLog {
    seen: RwLock<HashSet<String>>,
    file: Mutex<File>,
}

impl EmittedLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { seen: RwLock::new(HashSet::new()), file: Mutex::new(file) })
    }

    /// True if `(node_id, revision)` has already been recorded.
    pub fn contains(&self, node_id: &NodeId, revision: Revision) -> bool {
        self.seen.read().unwrap().contains(&buffer_key(node_id, revision))
    }

    /// Records an emitted instance: appends `"<nodeId> <revision>\n"` to
    /// the log file and marks it seen in memory. Per spec.md §7, a
    /// transient I/O failure here is logged and does not disturb round
    /// cadence, so this returns the I/O result for the caller to log
    /// rather than propagating it as fatal.
    pub fn record(&self, node_id: &NodeId, revision: Revision) -> io::Result<()> {
        {
            let mut seen = self.seen.write().unwrap();
            seen.insert(buffer_key(node_id, revision));
        }
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{} {}", node_id, revision)?;
        file.flush()
    }
}

/// Per-node round log at `<LOG_PATH>/<selfId>`: one line per received
/// non-self, non-zero-revision message, plus a final summary line.
pub struct RoundLog {
    file: Mutex<File>,
}

impl RoundLog {
    pub fn open(log_path: impl AsRef<Path>, self_id: &NodeId) -> io::Result<Self> {
        let path: PathBuf = log_path.as_ref().join(&self_id.0);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }

    /// Appends `"<nodeId>_<revision> <latency>\n"` for a received
    /// message, where `latency = currentRevision - msg.revision`.
    pub fn record_received(
        &self,
        node_id: &NodeId,
        revision: Revision,
        latency: i64,
    ) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{} {}", buffer_key(node_id, revision), latency)?;
        file.flush()
    }

    /// Appends the shutdown summary line.
    pub fn record_summary(&self, sent_count: u64, epochs: u64) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        writeln!(file, "Sent Message Count: {} in {} Epochs", sent_count, epochs)?;
        file.flush()
    }
}
