use crate::config::ConsensusConfig;
use crate::types::Amount;

/// Computes the reward owed for a block production event.
pub struct RewardCalculator {
    config: ConsensusConfig,
}

impl RewardCalculator {
    pub fn new(config: ConsensusConfig) -> Self {
        RewardCalculator { config }
    }

    /// `ordering_score` is in `[0, 1]`; `reputation_overall` is in `[0, 100]`.
    pub fn calculate(
        &self,
        block_produced: bool,
        mev_detected: bool,
        ordering_score: f64,
        reputation_overall: f64,
    ) -> Amount {
        if !block_produced {
            return 0;
        }

        // Integer arithmetic at 1/100 resolution to avoid floats in the
        // settled reward value. 100 == multiplier of 1.0x.
        let mut multiplier_pct: i64 = 100;

        if mev_detected {
            multiplier_pct -= 50;
        } else {
            multiplier_pct += (self.config.mev_bonus_multiplier_bps / 100) as i64;
        }

        if ordering_score > 0.95 {
            multiplier_pct += (self.config.ordering_bonus_multiplier_bps / 100) as i64;
        }

        if reputation_overall > 90.0 {
            multiplier_pct += 10;
        }

        let multiplier_pct = multiplier_pct.max(0) as u128;
        self.config.base_reward_per_epoch.saturating_mul(multiplier_pct) / 100
    }
}
