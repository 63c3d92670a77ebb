use crate::bridge::{with_timeout, ExecutionBridge};
use crate::config::ConsensusConfig;
use crate::consensus::AttestationError;
use crate::crypto::{CryptoProvider, SignatureUtils};
use crate::types::{Address, AggregatedAttestation, Amount, Attestation, Hash, PrivateKey, Slot, ValidatorSet};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttestationStats {
    pub total: usize,
    pub unique_validators: usize,
    pub participation_rate: f64,
    pub mean_mev_score: f64,
    pub mean_ordering_score: f64,
}

/// Receives per-validator votes on blocks; rejects invalid or duplicate
/// votes; exposes per-block and per-slot aggregated views. Exclusively owns
/// the pending attestations index and the per-validator duplicate-detection
/// index.
pub struct AttestationPool {
    config: ConsensusConfig,
    by_slot: HashMap<Slot, Vec<Attestation>>,
    seen: HashMap<Slot, HashSet<Address>>,
}

impl AttestationPool {
    pub fn new(config: ConsensusConfig) -> Self {
        AttestationPool {
            config,
            by_slot: HashMap::new(),
            seen: HashMap::new(),
        }
    }

    pub async fn create_attestation(
        &self,
        slot: Slot,
        block_hash: Hash,
        validator_index: u64,
        validator_address: Address,
        private_key: &PrivateKey,
        block_number: u64,
        bridge: &dyn ExecutionBridge,
    ) -> Attestation {
        let mev_score = match with_timeout(self.config.bridge_call_timeout_secs, bridge.mev_detected(block_number)).await {
            Ok(detected) => {
                if detected {
                    0.0
                } else {
                    100.0
                }
            }
            Err(e) => {
                warn!("mev query failed, defaulting to clean score: {e}");
                100.0
            }
        };

        let ordering_score = match with_timeout(self.config.bridge_call_timeout_secs, bridge.ordering_score(block_number)).await {
            Ok(verdict) => verdict.score * 100.0,
            Err(e) => {
                warn!("ordering query failed, defaulting to best score: {e}");
                100.0
            }
        };

        let message = Attestation::signing_bytes(slot, &block_hash, validator_index, mev_score, ordering_score);
        let signature = CryptoProvider::sign(private_key, &message).unwrap_or_else(|e| {
            warn!("attestation signing failed unexpectedly: {e}");
            crate::types::Signature([0u8; 64])
        });

        Attestation {
            slot,
            block_hash,
            validator_index,
            validator_address,
            mev_score,
            ordering_score,
            signature,
            received_at: Utc::now().timestamp(),
        }
    }

    pub fn add_attestation(
        &mut self,
        attestation: Attestation,
        validators: &ValidatorSet,
        current_slot: Slot,
    ) -> Result<(), AttestationError> {
        self.evict_expired(current_slot);

        let validator = validators
            .get(&attestation.validator_address)
            .ok_or_else(|| AttestationError::InvalidAttestation("unknown validator".to_string()))?;

        if !validator.is_eligible_to_attest() {
            return Err(AttestationError::InvalidAttestation(
                "validator inactive or slashed".to_string(),
            ));
        }

        if attestation.slot + self.config.attestation_window_slots < current_slot {
            return Err(AttestationError::AttestationTooOld);
        }

        if !attestation.scores_in_range() {
            return Err(AttestationError::InvalidAttestation("score out of range".to_string()));
        }

        let message = Attestation::signing_bytes(
            attestation.slot,
            &attestation.block_hash,
            attestation.validator_index,
            attestation.mev_score,
            attestation.ordering_score,
        );
        SignatureUtils::verify(&validator.public_key, &message, &attestation.signature)
            .map_err(|_| AttestationError::InvalidAttestation("signature verification failed".to_string()))?;

        let slot_seen = self.seen.entry(attestation.slot).or_default();
        if slot_seen.contains(&attestation.validator_address) {
            return Err(AttestationError::DuplicateAttestation);
        }
        slot_seen.insert(attestation.validator_address);

        self.by_slot.entry(attestation.slot).or_default().push(attestation);
        Ok(())
    }

    pub fn get_attestations(&self, slot: Slot) -> Vec<Attestation> {
        self.by_slot.get(&slot).cloned().unwrap_or_default()
    }

    pub fn get_attestations_for_block(&self, block_hash: &Hash) -> Vec<Attestation> {
        self.by_slot
            .values()
            .flat_map(|atts| atts.iter())
            .filter(|a| &a.block_hash == block_hash)
            .cloned()
            .collect()
    }

    pub fn aggregate(&self, attestations: &[Attestation], validators: &ValidatorSet) -> Option<AggregatedAttestation> {
        if attestations.is_empty() {
            return None;
        }
        let slot = attestations[0].slot;
        let block_hash = attestations[0].block_hash;

        let mean_mev_score = mean(attestations.iter().map(|a| a.mev_score));
        let mean_ordering_score = mean(attestations.iter().map(|a| a.ordering_score));
        let attesting_stake = Self::attesting_stake(attestations, validators);

        let signatures: Vec<_> = attestations.iter().map(|a| a.signature).collect();
        let aggregate_signature = SignatureUtils::aggregate_signatures(&signatures).ok()?;

        let mut signer_indices: Vec<u64> = attestations.iter().map(|a| a.validator_index).collect();
        signer_indices.sort_unstable();
        signer_indices.dedup();

        Some(AggregatedAttestation {
            slot,
            block_hash,
            aggregate_signature,
            signer_indices,
            mean_mev_score,
            mean_ordering_score,
            attesting_stake,
        })
    }

    pub fn stats(&self, slot: Slot, active_validator_count: usize) -> AttestationStats {
        let atts = self.get_attestations(slot);
        if atts.is_empty() {
            return AttestationStats::default();
        }
        let unique: HashSet<Address> = atts.iter().map(|a| a.validator_address).collect();
        AttestationStats {
            total: atts.len(),
            unique_validators: unique.len(),
            participation_rate: if active_validator_count == 0 {
                0.0
            } else {
                unique.len() as f64 / active_validator_count as f64
            },
            mean_mev_score: mean(atts.iter().map(|a| a.mev_score)),
            mean_ordering_score: mean(atts.iter().map(|a| a.ordering_score)),
        }
    }

    /// Computes the sum of stakes of unique attesting validators for `atts`.
    pub fn attesting_stake(atts: &[Attestation], validators: &ValidatorSet) -> Amount {
        let mut seen = HashSet::new();
        let mut total: Amount = 0;
        for a in atts {
            if seen.insert(a.validator_address) {
                if let Some(v) = validators.get(&a.validator_address) {
                    total += v.stake;
                }
            }
        }
        total
    }

    fn evict_expired(&mut self, current_slot: Slot) {
        let floor = current_slot.saturating_sub(self.config.attestation_window_slots);
        self.by_slot.retain(|&slot, _| slot >= floor);
        self.seen.retain(|&slot, _| slot >= floor);
    }
}

fn mean(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::types::Validator;

    fn pool_with_validator() -> (AttestationPool, ValidatorSet, KeyPair) {
        let keypair = KeyPair::generate();
        let mut set = ValidatorSet::new();
        set.register(Validator::new(keypair.address, keypair.public_key, 1000, 0));
        (AttestationPool::new(ConsensusConfig::default()), set, keypair)
    }

    fn signed_attestation(keypair: &KeyPair, slot: Slot, block_hash: Hash, mev: f64, ordering: f64) -> Attestation {
        let message = Attestation::signing_bytes(slot, &block_hash, 0, mev, ordering);
        let signature = SignatureUtils::sign(&keypair.signing_key(), &message);
        Attestation {
            slot,
            block_hash,
            validator_index: 0,
            validator_address: keypair.address,
            mev_score: mev,
            ordering_score: ordering,
            signature,
            received_at: 0,
        }
    }

    #[test]
    fn duplicate_attestation_from_same_validator_is_rejected() {
        let (mut pool, set, keypair) = pool_with_validator();
        let a1 = signed_attestation(&keypair, 10, [1u8; 32], 100.0, 100.0);
        let a2 = signed_attestation(&keypair, 10, [2u8; 32], 100.0, 100.0);

        assert!(pool.add_attestation(a1, &set, 10).is_ok());
        let result = pool.add_attestation(a2, &set, 10);
        assert!(matches!(result, Err(AttestationError::DuplicateAttestation)));
        assert_eq!(pool.get_attestations(10).len(), 1);
    }

    #[test]
    fn attestation_exactly_sixty_four_slots_behind_is_accepted() {
        let (mut pool, set, keypair) = pool_with_validator();
        let att = signed_attestation(&keypair, 36, [1u8; 32], 100.0, 100.0);
        assert!(pool.add_attestation(att, &set, 100).is_ok());
    }

    #[test]
    fn attestation_sixty_five_slots_behind_is_rejected() {
        let (mut pool, set, keypair) = pool_with_validator();
        let att = signed_attestation(&keypair, 35, [1u8; 32], 100.0, 100.0);
        let result = pool.add_attestation(att, &set, 100);
        assert!(matches!(result, Err(AttestationError::AttestationTooOld)));
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let (mut pool, set, keypair) = pool_with_validator();
        let mut att = signed_attestation(&keypair, 10, [1u8; 32], 100.0, 100.0);
        att.mev_score = 50.0; // tampered after signing
        let result = pool.add_attestation(att, &set, 10);
        assert!(matches!(result, Err(AttestationError::InvalidAttestation(_))));
    }

    #[test]
    fn aggregate_sums_stake_of_unique_attesting_validators() {
        let pool = AttestationPool::new(ConsensusConfig::default());
        let mut set = ValidatorSet::new();
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        set.register(Validator::new(kp1.address, kp1.public_key, 1000, 0));
        set.register(Validator::new(kp2.address, kp2.public_key, 2000, 0));

        let block_hash = [1u8; 32];
        let make = |kp: &KeyPair, index: u64, mev: f64, ordering: f64| {
            let message = Attestation::signing_bytes(10, &block_hash, index, mev, ordering);
            let signature = SignatureUtils::sign(&kp.signing_key(), &message);
            Attestation {
                slot: 10,
                block_hash,
                validator_index: index,
                validator_address: kp.address,
                mev_score: mev,
                ordering_score: ordering,
                signature,
                received_at: 0,
            }
        };
        let a1 = make(&kp1, 0, 100.0, 100.0);
        let a2 = make(&kp2, 1, 80.0, 90.0);

        let aggregated = pool.aggregate(&[a1, a2], &set).unwrap();
        assert_eq!(aggregated.attesting_stake, 3000);
        assert_eq!(aggregated.mean_mev_score, 90.0);
        assert_eq!(aggregated.unique_validator_count(), 2);
    }
}
