//! src/status.rs
//!
//! The `data` payload a node attaches to its own `NodeMessage` each
//! round is an external collaborator's concern (spec.md §1 "random
//! payload generation for node status" is explicitly out of scope).
//! `StatusSource` is the seam the Gossip Engine calls through;
//! `RandomStatusSource` is a reference implementation mirroring
//! `examples/original_source/common/utils.go`'s `GenerateNodeInfo`
//! (random `Cpu`/`Mem`/`Battery` readings), kept so the agent is
//! runnable without wiring in a real telemetry source.

use crate::domain::NodeData;
use rand::Rng;

/// Supplies the opaque status payload gossiped in `NodeMessage.data`.
pub trait StatusSource {
    fn sample(&self) -> NodeData;
}

/// Reference `StatusSource`: three random percentage-like readings,
/// in the shape `GenerateNodeInfo` produced in the original source.
#[derive(Default)]
pub struct RandomStatusSource;

impl StatusSource for RandomStatusSource {
    fn sample(&self) -> NodeData {
        let mut rng = rand::thread_rng();
        let mut data = NodeData::new();
        data.insert("Cpu".to_string(), format!("{}%", rng.gen_range(0..100)));
        data.insert("Mem".to_string(), format!("{}%", rng.gen_range(0..100)));
        data.insert("Battery".to_string(), format!("{}%", rng.gen_range(0..100)));
        data
    }
}
