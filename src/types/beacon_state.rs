use super::{Amount, Epoch, FinalityCheckpoint, Fork, Hash, Slot, ValidatorSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The in-memory authoritative view of the chain. Exclusively owns the
/// validator map, checkpoint map, and fork map; the Attestation Pool owns
/// pending attestations and the per-validator duplicate index separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconState {
    pub slot: Slot,
    pub epoch: Epoch,
    pub genesis_timestamp: i64,
    pub latest_block_hash: Hash,
    pub finalized_hash: Hash,
    pub justified_hash: Hash,
    pub validators: ValidatorSet,
    pub checkpoints: HashMap<u64, FinalityCheckpoint>,
    pub forks: HashMap<Hash, Fork>,
}

impl BeaconState {
    pub fn genesis(genesis_timestamp: i64, validators: ValidatorSet) -> Self {
        BeaconState {
            slot: 0,
            epoch: 0,
            genesis_timestamp,
            latest_block_hash: Hash::default(),
            finalized_hash: Hash::default(),
            justified_hash: Hash::default(),
            validators,
            checkpoints: HashMap::new(),
            forks: HashMap::new(),
        }
    }

    pub fn advance_slot(&mut self, slot: Slot, slots_per_epoch: u64) {
        self.slot = slot;
        self.epoch = slot / slots_per_epoch;
    }

    pub fn total_active_stake(&self) -> Amount {
        self.validators.total_active_stake
    }

    pub fn set_finalized_hash(&mut self, hash: Hash) {
        self.finalized_hash = hash;
    }

    pub fn set_justified_hash(&mut self, hash: Hash) {
        self.justified_hash = hash;
    }

    pub fn set_latest_block_hash(&mut self, hash: Hash) {
        self.latest_block_hash = hash;
    }
}

/// Serializable initialization snapshot the core accepts at startup (the
/// surrounding node owns persistence of these records; this is their shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisSnapshot {
    pub genesis_timestamp: i64,
    pub validators: ValidatorSet,
    pub finalized_sequence: Vec<u64>,
}

impl GenesisSnapshot {
    /// The restored finalized block-number sequence itself is owned by the
    /// Finality Engine (not `BeaconState`), so callers should seed
    /// `FinalityEngine` separately when resuming from a non-empty snapshot.
    pub fn into_beacon_state(self) -> BeaconState {
        BeaconState::genesis(self.genesis_timestamp, self.validators)
    }
}
