//! src/topology.rs
//!
//! The Topology Store: an undirected graph of observed adjacencies among
//! node identifiers (spec.md §3, §4.1), plus the per-neighbor
//! `NeighborRev` map used to expire stale edges. Grounded on
//! `examples/original_source/common/graph.go`'s `Graph`/`AddEdge`, with
//! the duplicate-edge and self-edge rejection promoted to explicit
//! invariants per spec.md §3(i)-(iii).

use crate::domain::{NodeId, Revision};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    /// Adjacency list. Invariant: `(u,v) in adj` iff `(v,u) in adj`.
    adj: HashMap<NodeId, Vec<NodeId>>,
    /// Latest revision heard directly from each direct neighbor of the
    /// local node.
    neighbor_rev: HashMap<NodeId, Revision>,
}

/// An undirected graph of node adjacencies, safe for concurrent readers
/// and a single writer (spec.md §4.1: "receive path writes; gossip
/// engine reads", plus staleness reconciliation and `NeighborRev` writes
/// from the gossip engine itself).
#[derive(Default)]
pub struct TopologyStore {
    inner: RwLock<Inner>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently adds an undirected edge. Rejects `u == v` and
    /// no-ops if the edge already exists (spec.md §3 invariants i, iii).
    pub fn add_edge(&self, u: &NodeId, v: &NodeId) {
        if u == v {
            return;
        }
        let mut inner = self.inner.write().unwrap();
        if inner.adj.get(u).is_some_and(|n| n.contains(v)) {
            return;
        }
        inner.adj.entry(u.clone()).or_default().push(v.clone());
        inner.adj.entry(v.clone()).or_default().push(u.clone());
    }

    /// Removes an undirected edge. No-op if the edge does not exist
    /// (spec.md §8 property 8).
    pub fn remove_edge(&self, u: &NodeId, v: &NodeId) {
        let mut inner = self.inner.write().unwrap();
        if let Some(neighbors) = inner.adj.get_mut(u) {
            neighbors.retain(|n| n != v);
        }
        if let Some(neighbors) = inner.adj.get_mut(v) {
            neighbors.retain(|n| n != u);
        }
    }

    /// Returns the neighbors of `u` in insertion order, or an empty
    /// sequence if `u` is unknown.
    pub fn neighbors(&self, u: &NodeId) -> Vec<NodeId> {
        self.inner
            .read()
            .unwrap()
            .adj
            .get(u)
            .cloned()
            .unwrap_or_default()
    }

    pub fn degree(&self, u: &NodeId) -> usize {
        self.inner.read().unwrap().adj.get(u).map_or(0, |n| n.len())
    }

    pub fn contains(&self, u: &NodeId) -> bool {
        self.inner.read().unwrap().adj.contains_key(u)
    }

    pub fn vertices(&self) -> Vec<NodeId> {
        self.inner.read().unwrap().adj.keys().cloned().collect()
    }

    /// Breadth-first from `start`, visiting neighbors up to `max_hops`
    /// hops; returns a new store containing exactly the edges traversed
    /// (spec.md §4.1). Used by the Gossip Engine to bound the MLST
    /// evaluator's working set to the 2-hop knowledge horizon.
    pub fn subgraph_within_hops(&self, start: &NodeId, max_hops: usize) -> TopologyStore {
        let inner = self.inner.read().unwrap();
        let sub = TopologyStore::new();
        if !inner.adj.contains_key(start) {
            return sub;
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(start.clone());
        let mut frontier: VecDeque<(NodeId, usize)> = VecDeque::new();
        frontier.push_back((start.clone(), 0));

        while let Some((node, hops)) = frontier.pop_front() {
            if hops >= max_hops {
                continue;
            }
            if let Some(neighbors) = inner.adj.get(&node) {
                for neighbor in neighbors {
                    sub.add_edge(&node, neighbor);
                    if visited.insert(neighbor.clone()) {
                        frontier.push_back((neighbor.clone(), hops + 1));
                    }
                }
            }
        }
        sub
    }

    /// Returns `vertices` sorted by descending degree (within this
    /// store), ties broken by ascending `NodeId` — the canonical order
    /// the MLST evaluator requires for determinism (spec.md §4.2).
    pub fn sorted_by_degree_desc_then_id(&self, vertices: &[NodeId]) -> Vec<NodeId> {
        let inner = self.inner.read().unwrap();
        let mut sorted: Vec<NodeId> = vertices.to_vec();
        sorted.sort_by(|a, b| {
            let da = inner.adj.get(a).map_or(0, |n| n.len());
            let db = inner.adj.get(b).map_or(0, |n| n.len());
            db.cmp(&da).then_with(|| a.cmp(b))
        });
        sorted
    }

    /// Returns the neighbors of `u`, sorted by descending degree then
    /// ascending id (spec.md §4.2 step 1).
    pub fn neighbors_canonical(&self, u: &NodeId) -> Vec<NodeId> {
        let neighbors = self.neighbors(u);
        self.sorted_by_degree_desc_then_id(&neighbors)
    }

    pub fn set_neighbor_rev(&self, neighbor: &NodeId, revision: Revision) {
        let mut inner = self.inner.write().unwrap();
        let entry = inner.neighbor_rev.entry(neighbor.clone()).or_insert(0);
        if revision > *entry {
            *entry = revision;
        }
    }

    pub fn neighbor_rev(&self, neighbor: &NodeId) -> Option<Revision> {
        self.inner.read().unwrap().neighbor_rev.get(neighbor).copied()
    }

    /// Direct neighbors of `self_id` whose `NeighborRev` is older than
    /// `current_revision - time_out_rev` (spec.md §4.1 "Staleness").
    pub fn stale_neighbors(
        &self,
        self_id: &NodeId,
        current_revision: Revision,
        time_out_rev: Revision,
    ) -> Vec<NodeId> {
        let cutoff = current_revision.saturating_sub(time_out_rev);
        let inner = self.inner.read().unwrap();
        inner
            .neighbor_rev
            .iter()
            .filter(|(neighbor, &rev)| {
                rev < cutoff && inner.adj.get(self_id).is_some_and(|n| n.contains(neighbor))
            })
            .map(|(neighbor, _)| neighbor.clone())
            .collect()
    }
}
