use anti_mev_consensus::bridge::{BridgeValidatorInfo, ExecutionBridge, MockExecutionBridge, OrderingVerdict};
use anti_mev_consensus::config::ConsensusConfig;
use anti_mev_consensus::consensus::{
    AttestationPool, ConsensusError, EngineCoordinator, FinalityEngine, ForkChoice, LocalValidator,
    ProposerSelector, ReputationManager, RewardCalculator,
};
use anti_mev_consensus::crypto::{CryptoProvider, KeyPair, SignatureUtils};
use anti_mev_consensus::types::{Attestation, BeaconState, GenesisSnapshot, Hash, Validator, ValidatorSet};
use std::sync::Arc;

fn keyed_validator(stake: u128) -> (KeyPair, Validator) {
    let keypair = KeyPair::generate();
    let validator = Validator::new(keypair.address, keypair.public_key, stake, 0);
    (keypair, validator)
}

fn genesis_with(validators: Vec<(KeyPair, Validator)>) -> (GenesisSnapshot, Vec<KeyPair>) {
    let mut set = ValidatorSet::new();
    let mut keys = Vec::new();
    for (kp, v) in validators {
        set.register(v);
        keys.push(kp);
    }
    (
        GenesisSnapshot {
            genesis_timestamp: 0,
            validators: set,
            finalized_sequence: Vec::new(),
        },
        keys,
    )
}

#[tokio::test]
async fn coordinator_runs_several_slots_without_error() {
    let stake = 32_000_000_000_000_000_000u128;
    let (local_kp, local_validator) = keyed_validator(stake);
    let local = LocalValidator {
        address: local_kp.address,
        private_key: local_kp.private_key,
    };
    let (snapshot, _keys) = genesis_with(vec![(local_kp, local_validator)]);

    let config = ConsensusConfig {
        slot_duration_ms: 10,
        finalization_delay_slots: 1,
        ..ConsensusConfig::default()
    };
    let bridge = Arc::new(MockExecutionBridge::new());
    let bridge_dyn: Arc<dyn ExecutionBridge> = bridge.clone();

    let coordinator = EngineCoordinator::new(config, snapshot, bridge_dyn, Some(local)).unwrap();

    for slot in 0..4 {
        coordinator.process_slot(slot).await.unwrap();
    }

    let status = coordinator.status().await;
    assert_eq!(status.slots_processed, 4);
}

#[tokio::test]
async fn coordinator_rejects_zero_finality_denominator() {
    let config = ConsensusConfig {
        finality_threshold_denominator: 0,
        ..ConsensusConfig::default()
    };
    let snapshot = GenesisSnapshot {
        genesis_timestamp: 0,
        validators: ValidatorSet::new(),
        finalized_sequence: Vec::new(),
    };
    let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());
    let result = EngineCoordinator::new(config, snapshot, bridge, None);
    assert!(matches!(result, Err(ConsensusError::Configuration(_))));
}

#[tokio::test]
async fn mev_flagged_proposal_reduces_fork_weight_and_blocks_justification() {
    let config = ConsensusConfig::default();
    let mut set = ValidatorSet::new();
    let mut keys = Vec::new();
    for _ in 0..3 {
        let (kp, v) = keyed_validator(1000);
        set.register(v);
        keys.push(kp);
    }
    let mut state = BeaconState::genesis(0, set);

    let bridge = MockExecutionBridge::new();
    bridge.set_mev_flag(1, true).await;

    let fork_choice = ForkChoice::new(config.clone());
    fork_choice
        .add_block(&mut state, [9u8; 32], 1, Hash::default(), &bridge)
        .await
        .unwrap();
    let fork = state.forks[&[9u8; 32]];
    assert!(fork.mev_penalty > 0);

    let mut pool = AttestationPool::new(config.clone());
    let mut engine = FinalityEngine::new(config);
    engine.process_block(&mut state, [9u8; 32], 1, 10, 0);

    for (i, kp) in keys.iter().enumerate() {
        let message = Attestation::signing_bytes(10, &[9u8; 32], i as u64, 0.0, 100.0);
        let signature = SignatureUtils::sign(&kp.signing_key(), &message);
        let att = Attestation {
            slot: 10,
            block_hash: [9u8; 32],
            validator_index: i as u64,
            validator_address: kp.address,
            mev_score: 0.0,
            ordering_score: 100.0,
            signature,
            received_at: 0,
        };
        pool.add_attestation(att, &state.validators, 10).unwrap();
    }

    let justified = engine.check_finality(&mut state, &pool, [9u8; 32], 1, 10, 0).unwrap();
    assert!(!justified, "MEV-tainted attestations must not justify the block");
}

#[tokio::test]
async fn mean_mev_exactly_at_threshold_is_insufficient_to_justify() {
    let config = ConsensusConfig::default();
    let (mut state, keys) = {
        let mut set = ValidatorSet::new();
        let mut keys = Vec::new();
        for _ in 0..3 {
            let (kp, v) = keyed_validator(32_000_000_000_000_000_000);
            set.register(v);
            keys.push(kp);
        }
        (BeaconState::genesis(0, set), keys)
    };

    let mut pool = AttestationPool::new(config.clone());
    let mut engine = FinalityEngine::new(config.clone());
    let block_hash = [4u8; 32];
    engine.process_block(&mut state, block_hash, 1, 10, 0);

    for (i, kp) in keys.iter().enumerate() {
        let message = Attestation::signing_bytes(10, &block_hash, i as u64, config.min_mev_score_to_justify, 100.0);
        let signature = SignatureUtils::sign(&kp.signing_key(), &message);
        let att = Attestation {
            slot: 10,
            block_hash,
            validator_index: i as u64,
            validator_address: kp.address,
            mev_score: config.min_mev_score_to_justify,
            ordering_score: 100.0,
            signature,
            received_at: 0,
        };
        pool.add_attestation(att, &state.validators, 10).unwrap();
    }

    let justified = engine.check_finality(&mut state, &pool, block_hash, 1, 10, 0).unwrap();
    assert!(!justified, "mean MEV score exactly at the threshold must not justify");
}

#[tokio::test]
async fn unreputable_validator_is_excluded_from_proposer_selection() {
    let config = ConsensusConfig {
        minimum_stake: 1,
        ..ConsensusConfig::default()
    };
    let mut set = ValidatorSet::new();
    let (eligible_kp, eligible_validator) = keyed_validator(1000);
    // default reputation: overall = 100, well above the eligibility bar
    set.register(eligible_validator);

    let (_low_kp, mut low_rep_validator) = keyed_validator(1000);
    low_rep_validator.reputation.mev_score = 0.0;
    low_rep_validator.reputation.ordering_score = 0.0;
    low_rep_validator.reputation.uptime_score = 0.0;
    low_rep_validator.reputation.attestation_rate = 0.0;
    set.register(low_rep_validator);

    let mut selector = ProposerSelector::new(config);
    let decision = selector.select_proposer(1, &set, 1, None).unwrap();
    assert_eq!(decision.proposer, eligible_kp.address);
}

#[tokio::test]
async fn reward_calculator_zeroes_unproduced_slots_and_bonuses_clean_ones() {
    let config = ConsensusConfig::default();
    let calculator = RewardCalculator::new(config.clone());

    let missed = calculator.calculate(false, false, 0.0, 100.0);
    assert_eq!(missed, 0);

    let clean = calculator.calculate(true, false, 1.0, 100.0);
    assert!(clean > config.base_reward_per_epoch);

    let tainted = calculator.calculate(true, true, 1.0, 0.0);
    assert!(tainted < clean);
}

#[tokio::test]
async fn reputation_manager_applies_decay_across_the_validator_set() {
    let config = ConsensusConfig {
        reputation_decay_rate_bps: 1000, // 10%
        ..ConsensusConfig::default()
    };
    let (_kp, validator) = keyed_validator(1000);
    let mut set = ValidatorSet::new();
    set.register(validator);
    let mut state = BeaconState::genesis(0, set);

    let manager = ReputationManager::new(config);
    let before = state.validators.get(&state.validators.validators.keys().next().copied().unwrap()).unwrap().reputation.mev_score;
    manager.apply_decay(&mut state);
    let after = state.validators.get(&state.validators.validators.keys().next().copied().unwrap()).unwrap().reputation.mev_score;
    assert!(after < before);
}

#[tokio::test]
async fn bridge_query_failure_during_fork_choice_defaults_to_no_penalty_no_bonus() {
    let config = ConsensusConfig::default();
    let (_kp, validator) = keyed_validator(1000);
    let mut set = ValidatorSet::new();
    set.register(validator);
    let mut state = BeaconState::genesis(0, set);

    let bridge = MockExecutionBridge::new();
    bridge.fail_next_call().await; // fails the mev_detected call
    let fork_choice = ForkChoice::new(config);
    fork_choice
        .add_block(&mut state, [2u8; 32], 1, Hash::default(), &bridge)
        .await
        .unwrap();

    let fork = state.forks[&[2u8; 32]];
    assert_eq!(fork.mev_penalty, 0);
}

#[tokio::test]
async fn bridge_validators_round_trip_through_the_mock() {
    let bridge = MockExecutionBridge::new();
    let addr = KeyPair::generate().address;
    bridge
        .set_validators(vec![BridgeValidatorInfo {
            address: addr,
            stake: 500,
            active: true,
        }])
        .await;
    let validators = bridge.validator_set().await.unwrap();
    assert_eq!(validators[0].address, addr);

    bridge.set_ordering_verdict(1, OrderingVerdict { score: 0.5, fair_ordering: false }).await;
    let verdict = bridge.ordering_score(1).await.unwrap();
    assert!(!verdict.fair_ordering);
}

#[test]
fn crypto_provider_round_trips_signatures() {
    let (private_key, public_key) = CryptoProvider::generate_keypair();
    let message = b"anti-mev attestation payload";
    let signature = CryptoProvider::sign(&private_key, message).unwrap();
    assert!(CryptoProvider::verify(&public_key, message, &signature).is_ok());
}
