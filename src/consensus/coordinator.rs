use crate::bridge::{with_timeout, ExecutionBridge, PayloadAttributes};
use crate::config::ConsensusConfig;
use crate::consensus::{AttestationPool, ConsensusError, FinalityEngine, ForkChoice, ReputationManager, RewardCalculator};
use crate::crypto::CryptoProvider;
use crate::types::{Address, Amount, BeaconState, GenesisSnapshot, Hash, PrivateKey, Slot};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Running statistics exposed by the status reader.
#[derive(Debug, Clone, Default)]
struct CoordinatorStats {
    slots_processed: u64,
    blocks_proposed: u64,
    missed_slots: u64,
    total_slot_time_micros: u64,
    total_rewards_credited: Amount,
    last_error_tag: Option<String>,
}

/// A block this node proposed, awaiting its MEV/ordering outcome so the
/// previous slot's proposer can be credited once it is known.
#[derive(Debug, Clone)]
struct PendingProposal {
    proposer: Address,
    block_number: u64,
}

/// A snapshot of the coordinator's externally-visible state, consumed by
/// the surrounding JSON-RPC layer (out of scope for this crate).
#[derive(Debug, Clone)]
pub struct CoreStatus {
    pub slot: Slot,
    pub epoch: u64,
    pub head: Hash,
    pub justified_head: Hash,
    pub finalized_head: Hash,
    pub active_validator_count: usize,
    pub total_stake: Amount,
    pub average_slot_time_ms: f64,
    pub average_finality_latency_slots: f64,
    pub slots_processed: u64,
    pub blocks_proposed: u64,
    pub missed_slots: u64,
    pub total_rewards_credited: Amount,
    pub last_error_tag: Option<String>,
}

/// Identity of the local validator, when this node is itself a proposer.
#[derive(Clone)]
pub struct LocalValidator {
    pub address: Address,
    pub private_key: PrivateKey,
}

/// Orchestrates a slot: proposer selection, block production, attestation,
/// finality checking, reputation and reward accounting. Holds one
/// `Arc<RwLock<T>>` per guarded component; `ForkChoice`, `ReputationManager`
/// and `RewardCalculator` carry no mutable state of their own (they operate
/// entirely through `BeaconState`), so they are not wrapped in a lock — the
/// lock order in the module doc below governs `state`, `attestation_pool`
/// and `finality_engine` only.
///
/// Required lock order: (1) attestation pool, (2) finality engine,
/// (3) beacon state. Read locks may be taken in any order but are released
/// before acquiring any write lock.
pub struct EngineCoordinator {
    config: ConsensusConfig,
    state: Arc<RwLock<BeaconState>>,
    attestation_pool: Arc<RwLock<AttestationPool>>,
    finality_engine: Arc<RwLock<FinalityEngine>>,
    proposer_selector: Arc<RwLock<crate::consensus::ProposerSelector>>,
    fork_choice: ForkChoice,
    reputation_manager: ReputationManager,
    reward_calculator: RewardCalculator,
    bridge: Arc<dyn ExecutionBridge>,
    local_validator: Option<LocalValidator>,
    stats: Arc<RwLock<CoordinatorStats>>,
    pending_proposal: Arc<RwLock<Option<PendingProposal>>>,
}

impl EngineCoordinator {
    pub fn new(
        config: ConsensusConfig,
        snapshot: GenesisSnapshot,
        bridge: Arc<dyn ExecutionBridge>,
        local_validator: Option<LocalValidator>,
    ) -> Result<Self, ConsensusError> {
        if config.finality_threshold_denominator == 0 {
            return Err(ConsensusError::Configuration(
                "finality_threshold_denominator must be non-zero".to_string(),
            ));
        }

        let finalized_sequence = snapshot.finalized_sequence.clone();
        let state = Arc::new(RwLock::new(snapshot.into_beacon_state()));

        Ok(EngineCoordinator {
            attestation_pool: Arc::new(RwLock::new(AttestationPool::new(config.clone()))),
            finality_engine: Arc::new(RwLock::new(FinalityEngine::restore(config.clone(), finalized_sequence))),
            proposer_selector: Arc::new(RwLock::new(crate::consensus::ProposerSelector::new(config.clone()))),
            fork_choice: ForkChoice::new(config.clone()),
            reputation_manager: ReputationManager::new(config.clone()),
            reward_calculator: RewardCalculator::new(config.clone()),
            config,
            state,
            bridge,
            local_validator,
            stats: Arc::new(RwLock::new(CoordinatorStats::default())),
            pending_proposal: Arc::new(RwLock::new(None)),
        })
    }

    /// Runs the full per-slot control flow described in the component design:
    /// propose (if leader) -> attest -> check finality -> reputation/reward.
    pub async fn process_slot(&self, slot: Slot) -> Result<(), ConsensusError> {
        let started = Instant::now();

        self.settle_previous_proposal().await;

        {
            let mut state = self.state.write().await;
            state.advance_slot(slot, self.config.slots_per_epoch);
        }

        let pow_quality = match with_timeout(self.config.bridge_call_timeout_secs, self.bridge.pow_quality()).await {
            Ok(q) => q,
            Err(e) => {
                warn!("pow quality query failed, falling back to 1: {e}");
                1
            }
        };

        let decision = {
            let validators = self.state.read().await.validators.clone();
            let mut selector = self.proposer_selector.write().await;
            selector.select_proposer(slot, &validators, pow_quality, None)
        };

        let decision = match decision {
            Ok(d) => d,
            Err(e) => {
                self.record_missed_slot(format!("{e}")).await;
                return Ok(());
            }
        };
        info!(slot, proposer = %decision.proposer, "proposer elected");

        let mut produced_block: Option<(Hash, u64)> = None;
        if Some(&decision.proposer) == self.local_validator.as_ref().map(|v| &v.address) {
            produced_block = self.propose_block(slot, &decision.proposer).await;
        }

        if let Some((hash, block_number)) = produced_block {
            let parent_hash = self.state.read().await.latest_block_hash;
            if let Err(e) = self
                .fork_choice
                .add_block(&mut *self.state.write().await, hash, block_number, parent_hash, &*self.bridge)
                .await
            {
                warn!("fork choice add-block failed: {e}");
            }
            self.finality_engine.read().await.process_block(
                &mut self.state.write().await,
                hash,
                block_number,
                slot,
                Utc::now().timestamp(),
            );
            *self.pending_proposal.write().await = Some(PendingProposal {
                proposer: decision.proposer,
                block_number,
            });
            let mut stats = self.stats.write().await;
            stats.blocks_proposed += 1;
        }

        self.attest_current_head(slot).await;
        self.check_finality_for_head(slot).await;

        {
            let mut stats = self.stats.write().await;
            stats.slots_processed += 1;
            stats.total_slot_time_micros += started.elapsed().as_micros() as u64;
        }

        Ok(())
    }

    /// Step 6 of the per-slot flow: once the previous slot's proposed block
    /// has a settled MEV/ordering outcome, update that proposer's reputation
    /// and credit the reward it earned.
    async fn settle_previous_proposal(&self) {
        let Some(previous) = self.pending_proposal.write().await.take() else {
            return;
        };

        let timeout_secs = self.config.bridge_call_timeout_secs;
        let mev_detected = match with_timeout(timeout_secs, self.bridge.mev_detected(previous.block_number)).await {
            Ok(detected) => detected,
            Err(e) => {
                warn!("mev query failed while settling prior proposal, assuming clean: {e}");
                false
            }
        };
        let ordering_score = match with_timeout(timeout_secs, self.bridge.ordering_score(previous.block_number)).await {
            Ok(verdict) => verdict.score,
            Err(e) => {
                warn!("ordering query failed while settling prior proposal, assuming perfect: {e}");
                1.0
            }
        };

        let mut state = self.state.write().await;
        self.reputation_manager
            .update(&mut state, &previous.proposer, true, mev_detected, ordering_score * 100.0);
        let reputation_overall = self.reputation_manager.get(&state, &previous.proposer).overall();
        drop(state);

        let reward = self
            .reward_calculator
            .calculate(true, mev_detected, ordering_score, reputation_overall);

        let mut stats = self.stats.write().await;
        stats.total_rewards_credited = stats.total_rewards_credited.saturating_add(reward);
        info!(proposer = %previous.proposer, reward, "credited proposer reward");
    }

    async fn propose_block(&self, slot: Slot, proposer: &Address) -> Option<(Hash, u64)> {
        let head = self.state.read().await.latest_block_hash;
        let justified = self.state.read().await.justified_hash;
        let finalized = self.state.read().await.finalized_hash;

        let attributes = PayloadAttributes {
            timestamp: Utc::now().timestamp(),
            prev_randao: CryptoProvider::generate_random_bytes(32).try_into().unwrap_or([0u8; 32]),
            fee_recipient: *proposer,
        };

        let timeout_secs = self.config.bridge_call_timeout_secs;
        let payload_id = match with_timeout(timeout_secs, self.bridge.notify_fork_choice(head, justified, finalized, Some(attributes))).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("execution bridge returned no payload id, skipping block production");
                return None;
            }
            Err(e) => {
                warn!("notify_fork_choice failed, missing slot {slot}: {e}");
                return None;
            }
        };

        tokio::time::sleep(Duration::from_millis(500)).await;

        let block_hash = match with_timeout(timeout_secs, self.bridge.get_payload(payload_id)).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("get_payload failed, missing slot {slot}: {e}");
                return None;
            }
        };

        if let Err(e) = with_timeout(timeout_secs, self.bridge.submit_payload(block_hash)).await {
            warn!("submit_payload failed, missing slot {slot}: {e}");
            return None;
        }

        if let Err(e) = with_timeout(timeout_secs, self.bridge.notify_fork_choice(block_hash, justified, finalized, None)).await {
            warn!("post-submission notify_fork_choice failed: {e}");
        }

        let block_number = match with_timeout(timeout_secs, self.bridge.block_number_by_hash(block_hash)).await {
            Ok(Some(n)) => n,
            _ => slot,
        };

        Some((block_hash, block_number))
    }

    async fn attest_current_head(&self, slot: Slot) {
        let Some(local) = self.local_validator.clone() else {
            return;
        };
        let head = self.state.read().await.latest_block_hash;
        let block_number = with_timeout(self.config.bridge_call_timeout_secs, self.bridge.block_number_by_hash(head))
            .await
            .ok()
            .flatten()
            .unwrap_or(slot);

        let validator_index = self
            .state
            .read()
            .await
            .validators
            .index_of(&local.address)
            .unwrap_or(0);

        let attestation = self
            .attestation_pool
            .read()
            .await
            .create_attestation(slot, head, validator_index, local.address, &local.private_key, block_number, &*self.bridge)
            .await;

        let validators = self.state.read().await.validators.clone();
        if let Err(e) = self.attestation_pool.write().await.add_attestation(attestation, &validators, slot) {
            debug!("self-attestation rejected: {e}");
        }
    }

    async fn check_finality_for_head(&self, slot: Slot) {
        let head = self.state.read().await.latest_block_hash;
        let block_number = with_timeout(self.config.bridge_call_timeout_secs, self.bridge.block_number_by_hash(head))
            .await
            .ok()
            .flatten()
            .unwrap_or(slot);

        let pool = self.attestation_pool.read().await;
        let mut finality = self.finality_engine.write().await;
        let mut state = self.state.write().await;
        match finality.check_finality(&mut state, &pool, head, block_number, slot, Utc::now().timestamp()) {
            Ok(true) => debug!(slot, block_number, "head is finalized"),
            Ok(false) => {}
            Err(e) => warn!("finality check failed: {e}"),
        }
    }

    async fn record_missed_slot(&self, reason: String) {
        warn!("slot skipped: {reason}");
        let mut stats = self.stats.write().await;
        stats.missed_slots += 1;
        stats.last_error_tag = Some(reason);
    }

    pub async fn status(&self) -> CoreStatus {
        let state = self.state.read().await;
        let finality = self.finality_engine.read().await;
        let stats = self.stats.read().await;

        CoreStatus {
            slot: state.slot,
            epoch: state.epoch,
            head: state.latest_block_hash,
            justified_head: state.justified_hash,
            finalized_head: state.finalized_hash,
            active_validator_count: state.validators.active_count(),
            total_stake: state.total_active_stake(),
            average_slot_time_ms: if stats.slots_processed == 0 {
                0.0
            } else {
                (stats.total_slot_time_micros as f64 / stats.slots_processed as f64) / 1000.0
            },
            average_finality_latency_slots: finality.average_finality_latency_slots(),
            slots_processed: stats.slots_processed,
            blocks_proposed: stats.blocks_proposed,
            missed_slots: stats.missed_slots,
            total_rewards_credited: stats.total_rewards_credited,
            last_error_tag: stats.last_error_tag.clone(),
        }
    }

    pub async fn apply_reputation_decay(&self) {
        self.reputation_manager.apply_decay(&mut *self.state.write().await);
    }

    /// Spawns the background task set from the concurrency model: slot
    /// ticker, slot processor, an idle attestation listener reserved for
    /// future gossip, a periodic finality checker, and an hourly reputation
    /// updater. All honor `shutdown` and are expected to return promptly.
    pub fn spawn_background_tasks(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let (slot_tx, mut slot_rx) = mpsc::channel::<Slot>(16);

        let ticker_shutdown = shutdown.clone();
        let slot_duration = Duration::from_millis(self.config.slot_duration_ms);
        let ticker = tokio::spawn(async move {
            let mut shutdown = ticker_shutdown;
            let mut slot: Slot = 0;
            let mut interval = tokio::time::interval(slot_duration);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if slot_tx.try_send(slot).is_err() {
                            warn!(slot, "slot channel full, dropping tick");
                        } else {
                            slot += 1;
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() { break; }
                    }
                }
            }
        });

        let processor_coordinator = Arc::clone(&self);
        let mut processor_shutdown = shutdown.clone();
        let processor = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(slot) = slot_rx.recv() => {
                        if let Err(e) = processor_coordinator.process_slot(slot).await {
                            error!("slot {slot} processing error: {e}");
                        }
                    }
                    _ = processor_shutdown.changed() => {
                        if *processor_shutdown.borrow() { break; }
                    }
                }
            }
        });

        let mut listener_shutdown = shutdown.clone();
        let attestation_listener = tokio::spawn(async move {
            // Reserved for future gossip ingestion; currently idle.
            let _ = listener_shutdown.changed().await;
        });

        let finality_coordinator = Arc::clone(&self);
        let mut finality_shutdown = shutdown.clone();
        let finality_checker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(slot_duration);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let slot = finality_coordinator.state.read().await.slot;
                        finality_coordinator.check_finality_for_head(slot).await;
                    }
                    _ = finality_shutdown.changed() => {
                        if *finality_shutdown.borrow() { break; }
                    }
                }
            }
        });

        let reputation_coordinator = Arc::clone(&self);
        let reputation_interval = Duration::from_secs(self.config.reputation_decay_interval_secs);
        let reputation_updater = tokio::spawn(async move {
            let mut interval = tokio::time::interval(reputation_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        reputation_coordinator.apply_reputation_decay().await;
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() { break; }
                    }
                }
            }
        });

        vec![ticker, processor, attestation_listener, finality_checker, reputation_updater]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::MockExecutionBridge;
    use crate::crypto::KeyPair;
    use crate::types::{Validator, ValidatorSet};

    fn snapshot_with_local_validator() -> (GenesisSnapshot, LocalValidator) {
        let keypair = KeyPair::generate();
        let mut set = ValidatorSet::new();
        set.register(Validator::new(keypair.address, keypair.public_key, 32_000_000_000_000_000_000, 0));
        let snapshot = GenesisSnapshot {
            genesis_timestamp: 0,
            validators: set,
            finalized_sequence: Vec::new(),
        };
        (
            snapshot,
            LocalValidator {
                address: keypair.address,
                private_key: keypair.private_key,
            },
        )
    }

    #[tokio::test]
    async fn process_slot_elects_the_sole_eligible_validator_as_proposer() {
        let (snapshot, local) = snapshot_with_local_validator();
        let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());
        let coordinator = EngineCoordinator::new(ConsensusConfig::default(), snapshot, bridge, Some(local.clone())).unwrap();

        coordinator.process_slot(0).await.unwrap();
        let status = coordinator.status().await;
        assert_eq!(status.slots_processed, 1);
    }

    #[tokio::test]
    async fn status_reports_zero_averages_before_any_slot_runs() {
        let (snapshot, local) = snapshot_with_local_validator();
        let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());
        let coordinator = EngineCoordinator::new(ConsensusConfig::default(), snapshot, bridge, Some(local)).unwrap();
        let status = coordinator.status().await;
        assert_eq!(status.average_slot_time_ms, 0.0);
    }

    #[tokio::test]
    async fn proposer_is_credited_a_reward_once_its_block_outcome_is_known() {
        let (snapshot, local) = snapshot_with_local_validator();
        let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());
        let coordinator = EngineCoordinator::new(ConsensusConfig::default(), snapshot, bridge, Some(local)).unwrap();

        // Slot 0 proposes a block and stashes it as pending; its clean
        // MEV/ordering outcome (the mock's defaults) is only settled once
        // slot 1 begins.
        coordinator.process_slot(0).await.unwrap();
        assert_eq!(coordinator.status().await.total_rewards_credited, 0);

        coordinator.process_slot(1).await.unwrap();
        let status = coordinator.status().await;
        assert!(status.total_rewards_credited > 0);
    }

    #[tokio::test]
    async fn restoring_from_a_snapshot_carries_forward_the_finalized_sequence() {
        let (mut snapshot, local) = snapshot_with_local_validator();
        snapshot.finalized_sequence = vec![1, 2, 3];
        let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());
        let coordinator = EngineCoordinator::new(ConsensusConfig::default(), snapshot, bridge, Some(local)).unwrap();
        assert_eq!(coordinator.finality_engine.read().await.finalized_sequence(), &[1, 2, 3]);
    }
}
