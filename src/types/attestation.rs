use super::{Address, Amount, Hash, Signature, Slot};
use serde::{Deserialize, Serialize};

/// A validator's signed vote for slot `slot` on block `block_hash`, carrying
/// the two quantitative scores the execution layer produced for that block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    pub slot: Slot,
    pub block_hash: Hash,
    pub validator_index: u64,
    pub validator_address: Address,
    pub mev_score: f64,
    pub ordering_score: f64,
    pub signature: Signature,
    pub received_at: i64,
}

impl Attestation {
    /// Canonical byte encoding signed/verified against the validator's
    /// public key: slot ‖ block_hash ‖ validator_index ‖ mev*1000 ‖ ordering*1000.
    pub fn signing_bytes(
        slot: Slot,
        block_hash: &Hash,
        validator_index: u64,
        mev_score: f64,
        ordering_score: f64,
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 32 + 8 + 4 + 4);
        bytes.extend_from_slice(&slot.to_be_bytes());
        bytes.extend_from_slice(block_hash);
        bytes.extend_from_slice(&validator_index.to_be_bytes());
        bytes.extend_from_slice(&((mev_score * 1000.0).round() as i32).to_be_bytes());
        bytes.extend_from_slice(&((ordering_score * 1000.0).round() as i32).to_be_bytes());
        bytes
    }

    pub fn scores_in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.mev_score) && (0.0..=100.0).contains(&self.ordering_score)
    }
}

/// A reduction over attestations sharing (slot, block hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedAttestation {
    pub slot: Slot,
    pub block_hash: Hash,
    pub aggregate_signature: Signature,
    pub signer_indices: Vec<u64>,
    pub mean_mev_score: f64,
    pub mean_ordering_score: f64,
    pub attesting_stake: Amount,
}

impl AggregatedAttestation {
    pub fn unique_validator_count(&self) -> usize {
        self.signer_indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_bytes_are_deterministic() {
        let a = Attestation::signing_bytes(5, &[1u8; 32], 3, 80.0, 95.0);
        let b = Attestation::signing_bytes(5, &[1u8; 32], 3, 80.0, 95.0);
        assert_eq!(a, b);
    }

    #[test]
    fn scores_out_of_range_are_rejected() {
        let mut att = Attestation {
            slot: 1,
            block_hash: [0u8; 32],
            validator_index: 0,
            validator_address: Address::ZERO,
            mev_score: 101.0,
            ordering_score: 50.0,
            signature: Signature([0u8; 64]),
            received_at: 0,
        };
        assert!(!att.scores_in_range());
        att.mev_score = 100.0;
        assert!(att.scores_in_range());
    }
}
