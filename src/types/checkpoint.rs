use super::{Amount, Attestation, Epoch, Signature, Slot};
use serde::{Deserialize, Serialize};

/// Per-block-hash finality checkpoint, progressing `created -> justified ->
/// finalized`. A finalized checkpoint is immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalityCheckpoint {
    pub block_number: u64,
    pub epoch: Epoch,
    pub created_at: i64,
    pub created_slot: Slot,
    pub total_stake_snapshot: Amount,
    pub justified: bool,
    pub justified_at: Option<i64>,
    pub justified_slot: Option<Slot>,
    pub finalized_at: Option<i64>,
    pub attestations: Vec<Attestation>,
    pub aggregate_signature: Option<Signature>,
    pub signer_indices: Vec<u64>,
    pub attesting_stake: Amount,
}

impl FinalityCheckpoint {
    pub fn new(
        block_number: u64,
        epoch: Epoch,
        created_at: i64,
        created_slot: Slot,
        total_stake_snapshot: Amount,
    ) -> Self {
        FinalityCheckpoint {
            block_number,
            epoch,
            created_at,
            created_slot,
            total_stake_snapshot,
            justified: false,
            justified_at: None,
            justified_slot: None,
            finalized_at: None,
            attestations: Vec::new(),
            aggregate_signature: None,
            signer_indices: Vec::new(),
            attesting_stake: 0,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    pub fn mark_justified(
        &mut self,
        justified_at: i64,
        justified_slot: Slot,
        attestations: Vec<Attestation>,
        aggregate_signature: Signature,
        signer_indices: Vec<u64>,
        attesting_stake: Amount,
    ) {
        self.justified = true;
        self.justified_at = Some(justified_at);
        self.justified_slot = Some(justified_slot);
        self.attestations = attestations;
        self.aggregate_signature = Some(aggregate_signature);
        self.signer_indices = signer_indices;
        self.attesting_stake = attesting_stake;
    }

    pub fn mark_finalized(&mut self, finalized_at: i64) {
        self.finalized_at = Some(finalized_at);
    }

    /// Age in slots since the checkpoint was first justified. `None` if not
    /// yet justified.
    pub fn justified_age_slots(&self, current_slot: Slot) -> Option<u64> {
        self.justified_slot.map(|s| current_slot.saturating_sub(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_checkpoint_is_not_finalized() {
        let cp = FinalityCheckpoint::new(10, 0, 0, 5, 1000);
        assert!(!cp.is_finalized());
        assert!(!cp.justified);
    }

    #[test]
    fn marking_justified_then_finalized_sets_flags() {
        let mut cp = FinalityCheckpoint::new(10, 0, 0, 5, 1000);
        cp.mark_justified(5, 6, vec![], Signature([0u8; 64]), vec![0, 1], 700);
        assert!(cp.justified);
        assert!(!cp.is_finalized());
        cp.mark_finalized(9);
        assert!(cp.is_finalized());
    }
}
