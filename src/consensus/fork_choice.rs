use crate::bridge::{with_timeout, ExecutionBridge};
use crate::config::ConsensusConfig;
use crate::consensus::ForkChoiceError;
use crate::types::{BeaconState, Fork, Hash};
use tracing::{info, warn};

/// Maintains the set of competing branches and chooses the canonical head.
/// Reads Fork Choice's own fork map via `BeaconState`, which owns it.
pub struct ForkChoice {
    config: ConsensusConfig,
}

impl ForkChoice {
    pub fn new(config: ConsensusConfig) -> Self {
        ForkChoice { config }
    }

    /// Adds (or updates in place) a block's Fork entry, scoring it via the
    /// Execution Bridge, then recomputes and returns the new head.
    pub async fn add_block(
        &self,
        state: &mut BeaconState,
        hash: Hash,
        block_number: u64,
        parent_hash: Hash,
        bridge: &dyn ExecutionBridge,
    ) -> Result<Hash, ForkChoiceError> {
        if parent_hash != Hash::default() && !state.forks.contains_key(&parent_hash) && parent_hash != state.finalized_hash {
            return Err(ForkChoiceError::UnknownParent);
        }

        let base_stake = state.total_active_stake();
        let mut fork = Fork::new(hash, parent_hash, block_number, base_stake);

        match with_timeout(self.config.bridge_call_timeout_secs, bridge.mev_detected(block_number)).await {
            Ok(true) => fork.mev_penalty = base_stake / 2,
            Ok(false) => {}
            Err(e) => warn!("mev query failed on add-block, proceeding with base weight: {e}"),
        }

        match with_timeout(self.config.bridge_call_timeout_secs, bridge.ordering_score(block_number)).await {
            Ok(verdict) if verdict.fair_ordering => {
                fork.ordering_bonus = base_stake
                    .saturating_mul(self.config.fork_ordering_bonus_factor_bps as u128)
                    / 10_000;
            }
            Ok(_) => {}
            Err(e) => warn!("ordering query failed on add-block, proceeding with base weight: {e}"),
        }

        state.forks.insert(hash, fork);

        let head = self.choose_head(state);
        if let Some(new_head) = head {
            if new_head != state.latest_block_hash {
                info!(old = ?state.latest_block_hash, new = ?new_head, "fork choice reorg");
                state.set_latest_block_hash(new_head);
            }
        }
        Ok(state.latest_block_hash)
    }

    /// argmax over effective weight, then height, restricted to forks whose
    /// ancestry includes the latest finalized hash — finality dominates
    /// effective weight.
    pub fn choose_head(&self, state: &BeaconState) -> Option<Hash> {
        let mut best: Option<&Fork> = None;
        for fork in state.forks.values() {
            if !self.descends_from_finalized(state, fork.head) {
                continue;
            }
            best = match best {
                None => Some(fork),
                Some(current) => {
                    if fork.effective_weight() > current.effective_weight()
                        || (fork.effective_weight() == current.effective_weight() && fork.height > current.height)
                    {
                        Some(fork)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.map(|f| f.head)
    }

    fn descends_from_finalized(&self, state: &BeaconState, head: Hash) -> bool {
        if state.finalized_hash == Hash::default() {
            return true;
        }
        let mut cursor = head;
        loop {
            if cursor == state.finalized_hash {
                return true;
            }
            match state.forks.get(&cursor) {
                Some(fork) => cursor = fork.parent,
                None => return false,
            }
        }
    }
}
