use crate::config::ConsensusConfig;
use crate::consensus::ProposerError;
use crate::crypto::{Hasher, Vrf};
use crate::types::{Address, Amount, Hash, ProposerDecision, Slot, ValidatorSet};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Instant;

/// Elects, for a given slot, the active validator responsible for proposing
/// that slot's block. Deterministic given Beacon State and the sampled PoW
/// quality, so any correct implementation reaches the same decision.
pub struct ProposerSelector {
    config: ConsensusConfig,
    vrf_private_key: [u8; 32],
    vrf_public_key: [u8; 32],
    decision_cache: HashMap<Slot, ProposerDecision>,
}

impl ProposerSelector {
    pub fn new(config: ConsensusConfig) -> Self {
        // Deterministic protocol-wide VRF keypair derived from the shared
        // seed, not a per-validator secret: every node must reach the same
        // election for the same slot.
        let vrf_private_key = Hasher::hash_with_domain(b"vrf-private", &config.vrf_seed);
        let vrf_public_key = Hasher::hash_with_domain(b"vrf-public", &vrf_private_key);
        ProposerSelector {
            config,
            vrf_private_key,
            vrf_public_key,
            decision_cache: HashMap::new(),
        }
    }

    pub fn cached_decision(&self, slot: Slot) -> Option<&ProposerDecision> {
        self.decision_cache.get(&slot)
    }

    /// Run the full election for `slot`. `epoch_pow_seed` is an optional
    /// 32-byte PoW seed for the current epoch, folded into the VRF seed
    /// when present.
    pub fn select_proposer(
        &mut self,
        slot: Slot,
        validators: &ValidatorSet,
        pow_quality: u64,
        epoch_pow_seed: Option<Hash>,
    ) -> Result<ProposerDecision, ProposerError> {
        let started = Instant::now();

        let mut eligible: Vec<&crate::types::Validator> =
            validators.eligible_proposers(self.config.minimum_stake, self.config.min_reputation_to_propose);
        eligible.sort_by_key(|v| v.address);
        if eligible.is_empty() {
            return Err(ProposerError::NoEligibleValidators);
        }

        let seed = Self::compute_seed(pow_quality, slot, epoch_pow_seed);

        let pow_influence_permille = (self.config.pow_influence_bps / 10) as u128;
        let weights: Vec<(Address, Amount, u128)> = eligible
            .iter()
            .map(|v| {
                let weight = Self::candidate_weight(
                    v.stake,
                    pow_quality,
                    v.reputation.overall(),
                    pow_influence_permille,
                );
                (v.address, v.stake, weight)
            })
            .collect();

        let total_weight: u128 = weights.iter().map(|(_, _, w)| w).sum();

        let vrf_result = Vrf::evaluate(&seed, &self.vrf_private_key, &self.vrf_public_key);
        let reduced = Vrf::reduce_modulo(&vrf_result.output, total_weight.max(1));

        let mut acc: u128 = 0;
        let mut elected = weights[0];
        for (address, stake, weight) in &weights {
            acc += weight;
            if acc > reduced {
                elected = (*address, *stake, *weight);
                break;
            }
        }

        let decision = ProposerDecision {
            slot,
            proposer: elected.0,
            pow_quality,
            stake_at_election: elected.1,
            vrf_output: vrf_result.output.to_vec(),
            vrf_proof: vrf_result.proof.to_vec(),
            selection_seed: seed,
            decided_at: Utc::now().timestamp(),
            elapsed_micros: started.elapsed().as_micros() as u64,
        };

        self.decision_cache.insert(slot, decision.clone());
        self.evict_stale(slot);

        Ok(decision)
    }

    fn compute_seed(pow_quality: u64, slot: Slot, epoch_pow_seed: Option<Hash>) -> Hash {
        let mut pow_bytes = [0u8; 32];
        pow_bytes[24..].copy_from_slice(&pow_quality.to_be_bytes());
        let mut chunks: Vec<&[u8]> = vec![&pow_bytes, &slot.to_be_bytes()];
        let epoch_seed_bytes;
        if let Some(seed) = epoch_pow_seed.as_ref() {
            epoch_seed_bytes = *seed;
            chunks.push(&epoch_seed_bytes);
        }
        Hasher::hash_multiple(&chunks)
    }

    fn candidate_weight(
        stake: Amount,
        pow_quality: u64,
        overall_reputation: f64,
        pow_influence_permille: u128,
    ) -> u128 {
        let pos_component = stake.saturating_mul(1000u128.saturating_sub(pow_influence_permille)) / 1000;

        let overall_scaled = (overall_reputation.clamp(0.0, 100.0) * 10.0).round() as u128;
        let pow_component = (pow_quality as u128)
            .saturating_mul(pow_influence_permille)
            .saturating_mul(overall_scaled)
            / 1_000_000;

        let mut total = pos_component.saturating_add(pow_component);

        if overall_reputation > 90.0 {
            total = total.saturating_add(total / 5);
        } else if overall_reputation < 70.0 {
            total = total.saturating_sub(total / 2);
        }

        total.max(1)
    }

    fn evict_stale(&mut self, current_slot: Slot) {
        let floor = current_slot.saturating_sub(100);
        self.decision_cache.retain(|&slot, _| slot >= floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Validator;

    fn validator(byte: u8, stake: Amount) -> Validator {
        Validator::new(Address([byte; 20]), [byte; 32], stake, 0)
    }

    #[test]
    fn selection_is_a_pure_function_of_state_and_pow_quality() {
        let config = ConsensusConfig {
            minimum_stake: 1,
            ..ConsensusConfig::default()
        };
        let mut set = ValidatorSet::new();
        set.register(validator(1, 1000));
        set.register(validator(2, 1000));
        set.register(validator(3, 1000));

        let mut selector = ProposerSelector::new(config);
        let d1 = selector.select_proposer(10, &set, 42, None).unwrap();
        let d2 = selector.select_proposer(10, &set, 42, None).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn empty_eligible_set_fails_with_no_eligible_validators() {
        let config = ConsensusConfig {
            minimum_stake: 1,
            ..ConsensusConfig::default()
        };
        let set = ValidatorSet::new();
        let mut selector = ProposerSelector::new(config);
        let result = selector.select_proposer(1, &set, 1, None);
        assert!(matches!(result, Err(ProposerError::NoEligibleValidators)));
    }

    #[test]
    fn cache_evicts_entries_older_than_one_hundred_slots() {
        let config = ConsensusConfig {
            minimum_stake: 1,
            ..ConsensusConfig::default()
        };
        let mut set = ValidatorSet::new();
        set.register(validator(1, 1000));
        let mut selector = ProposerSelector::new(config);
        selector.select_proposer(1, &set, 1, None).unwrap();
        selector.select_proposer(200, &set, 1, None).unwrap();
        assert!(selector.cached_decision(1).is_none());
        assert!(selector.cached_decision(200).is_some());
    }
}
