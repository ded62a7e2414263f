//! src/domain.rs
//!
//! The data model shared by every other module: node identifiers, the
//! gossiped message types, and the wire-level `GossipMessage`. Field names
//! on the wire types are fixed by the external protocol (see `src/log.rs`
//! and `src/transport.rs`) and must not be renamed without breaking
//! interoperability with other nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Opaque node identifier. In the reference deployment this is an IPv4
/// dotted-quad, but the core only ever treats it as an orderable, hashable
/// string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets this identifier as an IPv4 dotted-quad. Returns `None`
    /// for non-IP identifiers, in which case callers fall back to a
    /// substitute total order (see `distance_between` in `src/receive.rs`).
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Monotonically increasing revision counter, local to each originating
/// node. A `(NodeId, Revision)` pair uniquely names a message instance.
pub type Revision = u64;

/// The opaque status payload a node gossips about itself (spec.md §3:
/// `data: mapping from string to string`, e.g. `Cpu`, `Mem`, `Battery`).
pub type NodeData = HashMap<String, String>;

/// A single node's status at a specific revision. Equality is by
/// `(node_id, revision)` only, per spec.md §3 ("Equality of two
/// NodeMessages is by `(nodeId, revision)`").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeMessage {
    #[serde(rename = "NodeID")]
    pub node_id: NodeId,
    #[serde(rename = "Revision")]
    pub revision: Revision,
    #[serde(rename = "Data")]
    pub data: NodeData,
}

impl NodeMessage {
    pub fn new(node_id: NodeId, revision: Revision, data: NodeData) -> Self {
        Self { node_id, revision, data }
    }

    /// The key used to address this message instance in the Message
    /// Buffer and the emitted-instance log: `"<nodeId>_<revision>"`.
    pub fn key(&self) -> String {
        buffer_key(&self.node_id, self.revision)
    }
}

impl PartialEq for NodeMessage {
    fn eq(&self, other: &Self) -> bool {
        self.node_id == other.node_id && self.revision == other.revision
    }
}
impl Eq for NodeMessage {}

/// Formats a Message Buffer / emitted-log key for a given instance.
pub fn buffer_key(node_id: &NodeId, revision: Revision) -> String {
    format!("{}_{}", node_id.0, revision)
}

/// An ordered sequence of previous-hop citations by which a message
/// reached this node. `path[0]` is the originator, `path[last]` is the
/// immediate sender. Length is always >= 1 (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path(pub Vec<NodeId>);

impl Path {
    pub fn new(hops: Vec<NodeId>) -> Self {
        debug_assert!(!hops.is_empty(), "a Path must have at least one hop");
        Self(hops)
    }

    pub fn originator(&self) -> &NodeId {
        &self.0[0]
    }

    pub fn last_hop(&self) -> &NodeId {
        self.0.last().expect("Path is never empty")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with `hop` appended.
    pub fn extended(&self, hop: NodeId) -> Path {
        let mut hops = self.0.clone();
        hops.push(hop);
        Path(hops)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }
}

/// One relayed or advertised item inside a `GossipMessage`. Carries either
/// a relayed foreign message (`node_msg` present) together with the
/// `NodeId` that cited it to the sender, or a pure neighbor-advertisement
/// (`node_msg` absent).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendMessage {
    #[serde(rename = "PrevNode")]
    pub prev_node: NodeId,
    #[serde(rename = "PrevAdj")]
    pub prev_adj: Vec<NodeId>,
    #[serde(rename = "NodeMsg")]
    pub node_msg: Option<NodeMessage>,
}

impl SendMessage {
    pub fn advertisement(prev_node: NodeId, prev_adj: Vec<NodeId>) -> Self {
        Self { prev_node, prev_adj, node_msg: None }
    }

    pub fn relay(prev_node: NodeId, prev_adj: Vec<NodeId>, node_msg: NodeMessage) -> Self {
        Self { prev_node, prev_adj, node_msg: Some(node_msg) }
    }
}

/// The wire unit broadcast once per round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GossipMessage {
    #[serde(rename = "Self")]
    pub self_msg: NodeMessage,
    #[serde(rename = "Msgs")]
    pub msgs: Vec<SendMessage>,
}

/// One fragment of a `GossipMessage` too large for a single datagram
/// (spec.md §4.5 "Chunked framing"). Fragments for the same instance
/// share `node_id`/`revision` and are reassembled by concatenating
/// `data` in `chunk_index` order once `total_chunks` pieces are present.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GossipMessageWithChunks {
    #[serde(rename = "ChunkIndex")]
    pub chunk_index: u32,
    #[serde(rename = "TotalChunks")]
    pub total_chunks: u32,
    #[serde(rename = "Data")]
    pub data: Vec<u8>,
    #[serde(rename = "NodeID")]
    pub node_id: NodeId,
    #[serde(rename = "Revision")]
    pub revision: Revision,
}

impl GossipMessageWithChunks {
    /// The reassembly key: `"<nodeId>-<revision>"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.node_id.0, self.revision)
    }
}
