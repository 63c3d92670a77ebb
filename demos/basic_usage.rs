// Basic usage example for the anti-MEV PoS consensus core.

use anti_mev_consensus::bridge::{ExecutionBridge, MockExecutionBridge};
use anti_mev_consensus::config::ConsensusConfig;
use anti_mev_consensus::consensus::{EngineCoordinator, LocalValidator};
use anti_mev_consensus::crypto::KeyPair;
use anti_mev_consensus::types::{GenesisSnapshot, Validator, ValidatorSet};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Generate a validator keypair and register it in a one-validator genesis set.
    let keypair = KeyPair::generate();
    println!("Generated validator address: {}", keypair.address);

    let stake = 32_000_000_000_000_000_000u128; // 32 ETH-equivalent, in wei
    let validator = Validator::new(keypair.address, keypair.public_key, stake, 0);

    let mut validators = ValidatorSet::new();
    validators.register(validator);
    println!("Validator set created with {} active validators", validators.active_count());

    let snapshot = GenesisSnapshot {
        genesis_timestamp: 0,
        validators,
        finalized_sequence: Vec::new(),
    };

    let local_validator = LocalValidator {
        address: keypair.address,
        private_key: keypair.private_key,
    };

    // A deterministic in-memory execution bridge stands in for a real
    // EVM execution client for this demo.
    let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());

    let config = ConsensusConfig {
        slot_duration_ms: 50,
        finalization_delay_slots: 1,
        ..ConsensusConfig::default()
    };

    let coordinator = EngineCoordinator::new(config, snapshot, bridge, Some(local_validator))?;

    println!("\n=== Running a handful of slots ===");
    for slot in 0..5 {
        coordinator.process_slot(slot).await?;
        let status = coordinator.status().await;
        println!(
            "slot {slot}: head={:?} justified={:?} finalized={:?} proposed={}",
            status.head, status.justified_head, status.finalized_head, status.blocks_proposed
        );
    }

    let status = coordinator.status().await;
    println!("\nFinal status:");
    println!("  active validators: {}", status.active_validator_count);
    println!("  total stake: {}", status.total_stake);
    println!("  slots processed: {}", status.slots_processed);
    println!("  blocks proposed: {}", status.blocks_proposed);
    println!("  missed slots: {}", status.missed_slots);
    println!("  total rewards credited: {}", status.total_rewards_credited);
    println!("  average finality latency (slots): {:.2}", status.average_finality_latency_slots);

    Ok(())
}
