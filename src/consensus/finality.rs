use crate::config::ConsensusConfig;
use crate::consensus::attestation_pool::AttestationPool;
use crate::consensus::FinalityError;
use crate::crypto::SignatureUtils;
use crate::types::{BeaconState, FinalityCheckpoint, Hash, Slot};
use tracing::{debug, info};

/// Promotes block checkpoints through `created -> justified -> finalized`.
/// Finalized blocks are never reverted.
pub struct FinalityEngine {
    config: ConsensusConfig,
    finalized_sequence: Vec<u64>,
    finality_latencies_slots: Vec<u64>,
}

impl FinalityEngine {
    pub fn new(config: ConsensusConfig) -> Self {
        FinalityEngine {
            config,
            finalized_sequence: Vec::new(),
            finality_latencies_slots: Vec::new(),
        }
    }

    /// Resumes from a prior run's finalized block-number sequence (as
    /// carried by a `GenesisSnapshot`), so the "finalized sequence strictly
    /// increasing" invariant holds across a restart instead of silently
    /// resetting to empty.
    pub fn restore(config: ConsensusConfig, finalized_sequence: Vec<u64>) -> Self {
        FinalityEngine {
            config,
            finalized_sequence,
            finality_latencies_slots: Vec::new(),
        }
    }

    pub fn finalized_sequence(&self) -> &[u64] {
        &self.finalized_sequence
    }

    pub fn process_block(
        &self,
        state: &mut BeaconState,
        hash: Hash,
        block_number: u64,
        slot: Slot,
        created_at: i64,
    ) {
        state.checkpoints.entry(block_number).or_insert_with(|| {
            let epoch = slot / self.config.slots_per_epoch;
            let total_stake_snapshot = state.total_active_stake();
            debug!(block_number, slot, "creating finality checkpoint");
            FinalityCheckpoint::new(block_number, epoch, created_at, slot, total_stake_snapshot)
        });
        let _ = hash;
    }

    pub fn check_finality(
        &mut self,
        state: &mut BeaconState,
        pool: &AttestationPool,
        hash: Hash,
        block_number: u64,
        current_slot: Slot,
        now: i64,
    ) -> Result<bool, FinalityError> {
        if !state.checkpoints.contains_key(&block_number) {
            return Err(FinalityError::InvalidCheckpoint);
        }

        if state.checkpoints[&block_number].is_finalized() {
            return Ok(true);
        }

        let attestations = pool.get_attestations_for_block(&hash);
        let attesting_stake = AttestationPool::attesting_stake(&attestations, &state.validators);

        let total_stake_snapshot = state.checkpoints[&block_number].total_stake_snapshot;
        if attesting_stake.saturating_mul(self.config.finality_threshold_denominator as u128)
            <= total_stake_snapshot.saturating_mul(self.config.finality_threshold_numerator as u128)
        {
            return Ok(false);
        }

        let mean_mev = mean(attestations.iter().map(|a| a.mev_score));
        let mean_ordering = mean(attestations.iter().map(|a| a.ordering_score));
        if mean_mev <= self.config.min_mev_score_to_justify
            || mean_ordering <= self.config.min_ordering_score_to_justify
        {
            return Ok(false);
        }

        let signatures: Vec<_> = attestations.iter().map(|a| a.signature).collect();
        let aggregate_signature =
            SignatureUtils::aggregate_signatures(&signatures).map_err(|_| FinalityError::AggregationFailed)?;

        let mut signer_indices: Vec<u64> = attestations.iter().map(|a| a.validator_index).collect();
        signer_indices.sort_unstable();
        signer_indices.dedup();

        let checkpoint = state.checkpoints.get_mut(&block_number).expect("checked above");
        checkpoint.mark_justified(
            now,
            current_slot,
            attestations,
            aggregate_signature,
            signer_indices,
            attesting_stake,
        );
        state.set_justified_hash(hash);
        info!(block_number, current_slot, "block justified");

        let age_slots = checkpoint.justified_age_slots(current_slot).unwrap_or(0);
        if age_slots >= self.config.finalization_delay_slots {
            let already_finalized_at_or_above = self
                .finalized_sequence
                .iter()
                .any(|&finalized_number| finalized_number >= block_number);
            if !already_finalized_at_or_above {
                checkpoint.mark_finalized(now);
                state.set_finalized_hash(hash);
                self.finalized_sequence.push(block_number);
                self.finality_latencies_slots.push(age_slots);
                info!(block_number, current_slot, "block finalized");
                self.prune(state);
            }
        }

        Ok(checkpoint.is_finalized())
    }

    fn prune(&self, state: &mut BeaconState) {
        let Some(&latest) = self.finalized_sequence.last() else {
            return;
        };
        let retention = self.config.checkpoint_retention_count;
        let floor = latest.saturating_sub(retention);
        state.checkpoints.retain(|&block_number, _| block_number >= floor);
    }

    pub fn average_finality_latency_slots(&self) -> f64 {
        mean(self.finality_latencies_slots.iter().map(|&v| v as f64))
    }
}

fn mean(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}
