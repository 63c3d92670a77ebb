use super::{Address, Amount, Hash, Slot};
use serde::{Deserialize, Serialize};

/// Outcome of a single slot's proposer election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposerDecision {
    pub slot: Slot,
    pub proposer: Address,
    pub pow_quality: u64,
    pub stake_at_election: Amount,
    pub vrf_output: Vec<u8>,
    pub vrf_proof: Vec<u8>,
    pub selection_seed: Hash,
    pub decided_at: i64,
    pub elapsed_micros: u64,
}
