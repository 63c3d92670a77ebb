use crate::config::ConsensusConfig;
use crate::types::{Address, BeaconState, Reputation};

/// Maintains per-validator reputation; applies decay on its own cadence
/// (default one hour, driven by the coordinator's background task).
pub struct ReputationManager {
    config: ConsensusConfig,
}

impl ReputationManager {
    pub fn new(config: ConsensusConfig) -> Self {
        ReputationManager { config }
    }

    pub fn update(
        &self,
        state: &mut BeaconState,
        validator: &Address,
        block_proposed: bool,
        mev_detected: bool,
        ordering_score: f64,
    ) {
        let Some(v) = state.validators.get_mut(validator) else {
            return;
        };
        if block_proposed {
            v.reputation.record_block_outcome(mev_detected);
        }
        v.reputation.record_ordering(ordering_score);
    }

    pub fn record_attestation_participation(&self, state: &mut BeaconState, validator: &Address, participated: bool) {
        if let Some(v) = state.validators.get_mut(validator) {
            v.reputation.record_attestation(participated);
        }
    }

    pub fn apply_decay(&self, state: &mut BeaconState) {
        let rate = self.config.reputation_decay_rate_bps as f64 / 10_000.0;
        for validator in state.validators.validators.values_mut() {
            validator.reputation.apply_decay(rate);
        }
    }

    /// Returns the stored reputation, or a default-perfect one if the
    /// validator is unknown to this manager.
    pub fn get(&self, state: &BeaconState, validator: &Address) -> Reputation {
        state
            .validators
            .get(validator)
            .map(|v| v.reputation)
            .unwrap_or_default()
    }
}
