use super::{Address, Amount, Epoch, PublicKey, Slot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Below this overall score, MEV/ordering/uptime decay stops (floor).
const REPUTATION_DECAY_FLOOR: f64 = 50.0;

/// Per-validator reputation, composed of four weighted sub-scores.
///
/// `overall = 0.4*mev + 0.3*ordering + 0.2*uptime + 10*attestation_rate`,
/// kept in `[0, 100]` at every observable instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub mev_score: f64,
    pub ordering_score: f64,
    pub uptime_score: f64,
    pub attestation_rate: f64,
    pub total_blocks: u64,
    pub blocks_with_mev: u64,
    pub attestations_made: u64,
    pub attestations_missed: u64,
}

impl Default for Reputation {
    /// Newly observed validators default to a perfect reputation.
    fn default() -> Self {
        Reputation {
            mev_score: 100.0,
            ordering_score: 100.0,
            uptime_score: 100.0,
            attestation_rate: 1.0,
            total_blocks: 0,
            blocks_with_mev: 0,
            attestations_made: 0,
            attestations_missed: 0,
        }
    }
}

impl Reputation {
    pub fn overall(&self) -> f64 {
        (0.4 * self.mev_score + 0.3 * self.ordering_score + 0.2 * self.uptime_score
            + 10.0 * self.attestation_rate)
            .clamp(0.0, 100.0)
    }

    pub fn is_eligible_to_propose(&self, min_reputation: f64) -> bool {
        self.overall() >= min_reputation
    }

    /// Called once per block this validator proposed.
    pub fn record_block_outcome(&mut self, mev_detected: bool) {
        self.total_blocks += 1;
        if mev_detected {
            self.blocks_with_mev += 1;
            self.mev_score = (self.mev_score - 10.0).max(0.0);
        } else {
            self.mev_score = (self.mev_score + 1.0).min(100.0);
        }
    }

    /// Exponentially-smoothed update against an observed ordering score
    /// in `[0, 100]`, weight 0.1 on the new observation.
    pub fn record_ordering(&mut self, observed: f64) {
        let observed = observed.clamp(0.0, 100.0);
        self.ordering_score = 0.9 * self.ordering_score + 0.1 * observed;
    }

    pub fn record_attestation(&mut self, participated: bool) {
        if participated {
            self.attestations_made += 1;
        } else {
            self.attestations_missed += 1;
        }
        let total = self.attestations_made + self.attestations_missed;
        self.attestation_rate = if total == 0 {
            1.0
        } else {
            self.attestations_made as f64 / total as f64
        };
        self.uptime_score = (self.attestation_rate * 100.0).clamp(0.0, 100.0);
    }

    /// Multiply MEV/ordering/uptime by `(1 - rate)`, floored at 50 each.
    /// Once a sub-score reaches the floor, further decay leaves it there.
    pub fn apply_decay(&mut self, rate: f64) {
        self.mev_score = (self.mev_score * (1.0 - rate)).max(REPUTATION_DECAY_FLOOR);
        self.ordering_score = (self.ordering_score * (1.0 - rate)).max(REPUTATION_DECAY_FLOOR);
        self.uptime_score = (self.uptime_score * (1.0 - rate)).max(REPUTATION_DECAY_FLOOR);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Active,
    Inactive,
    Slashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub address: Address,
    pub public_key: PublicKey,
    pub stake: Amount,
    pub status: ValidatorStatus,
    pub last_proposed_slot: Option<Slot>,
    pub reputation: Reputation,
    pub joined_epoch: Epoch,
    pub exit_epoch: Option<Epoch>,
}

impl Validator {
    pub fn new(address: Address, public_key: PublicKey, stake: Amount, joined_epoch: Epoch) -> Self {
        Validator {
            address,
            public_key,
            stake,
            status: ValidatorStatus::Active,
            last_proposed_slot: None,
            reputation: Reputation::default(),
            joined_epoch,
            exit_epoch: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, ValidatorStatus::Active)
    }

    pub fn is_slashed(&self) -> bool {
        matches!(self.status, ValidatorStatus::Slashed)
    }

    /// Active, not slashed, sufficiently staked, and reputable enough to
    /// be a block proposer candidate.
    pub fn is_eligible_to_propose(&self, min_stake: Amount, min_reputation: f64) -> bool {
        self.is_active()
            && !self.is_slashed()
            && self.stake >= min_stake
            && self.reputation.is_eligible_to_propose(min_reputation)
    }

    /// Active and not slashed: the bar for submitting attestations, which
    /// is lower than the proposer-eligibility bar.
    pub fn is_eligible_to_attest(&self) -> bool {
        self.is_active() && !self.is_slashed()
    }

    pub fn slash(&mut self) {
        self.status = ValidatorStatus::Slashed;
    }
}

/// The active validator set, owned exclusively by `BeaconState`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorSet {
    pub validators: HashMap<Address, Validator>,
    /// Deterministic index assignment, ascending by address byte-lex.
    pub indices: HashMap<Address, u64>,
    pub total_active_stake: Amount,
}

impl ValidatorSet {
    pub fn new() -> Self {
        ValidatorSet::default()
    }

    pub fn register(&mut self, validator: Validator) {
        if validator.is_active() && !validator.is_slashed() {
            self.total_active_stake += validator.stake;
        }
        self.validators.insert(validator.address, validator);
        self.reindex();
    }

    /// Re-derive the deterministic address -> index assignment. Called
    /// whenever the validator map's membership changes; indices are stable
    /// identifiers used in signer-index lists, so they are recomputed from
    /// the full sorted address list rather than incrementally assigned.
    fn reindex(&mut self) {
        let mut addrs: Vec<Address> = self.validators.keys().copied().collect();
        addrs.sort();
        self.indices = addrs
            .into_iter()
            .enumerate()
            .map(|(i, a)| (a, i as u64))
            .collect();
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.validators.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Validator> {
        self.validators.get_mut(address)
    }

    pub fn index_of(&self, address: &Address) -> Option<u64> {
        self.indices.get(address).copied()
    }

    pub fn slash(&mut self, address: &Address) -> bool {
        if let Some(v) = self.validators.get_mut(address) {
            if v.is_active() {
                self.total_active_stake = self.total_active_stake.saturating_sub(v.stake);
            }
            v.slash();
            true
        } else {
            false
        }
    }

    /// Active, non-slashed, sufficiently staked and reputable validators,
    /// deterministically ordered by ascending address byte-lex.
    pub fn eligible_proposers(&self, min_stake: Amount, min_reputation: f64) -> Vec<&Validator> {
        let mut out: Vec<&Validator> = self
            .validators
            .values()
            .filter(|v| v.is_eligible_to_propose(min_stake, min_reputation))
            .collect();
        out.sort_by_key(|v| v.address);
        out
    }

    pub fn active_count(&self) -> usize {
        self.validators
            .values()
            .filter(|v| v.is_active() && !v.is_slashed())
            .count()
    }

    /// Recomputes `total_active_stake` from scratch; used as an invariant
    /// check (§3: the sum of active, non-slashed stakes equals this
    /// counter) and after bulk mutation.
    pub fn recompute_total_stake(&mut self) {
        self.total_active_stake = self
            .validators
            .values()
            .filter(|v| v.is_active() && !v.is_slashed())
            .map(|v| v.stake)
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn overall_combines_subscores_with_spec_weights() {
        let rep = Reputation {
            mev_score: 100.0,
            ordering_score: 100.0,
            uptime_score: 100.0,
            attestation_rate: 1.0,
            ..Reputation::default()
        };
        // 0.4*100 + 0.3*100 + 0.2*100 + 10*1.0 clamped to 100
        assert_eq!(rep.overall(), 100.0);
    }

    #[test]
    fn decay_floors_at_fifty_after_many_applications() {
        let mut rep = Reputation {
            mev_score: 50.0,
            ..Reputation::default()
        };
        for _ in 0..200 {
            rep.apply_decay(0.01);
        }
        assert_eq!(rep.mev_score, 50.0);
    }

    #[test]
    fn proposer_eligibility_gates_on_reputation_boundary() {
        let mut rep = Reputation::default();
        // Engineer overall == 69 then == 70 via ordering_score alone.
        rep.mev_score = 0.0;
        rep.uptime_score = 0.0;
        rep.attestation_rate = 0.0;
        rep.ordering_score = (69.0) / 0.3;
        assert!((rep.overall() - 69.0).abs() < 1e-9);
        assert!(!rep.is_eligible_to_propose(70.0));

        rep.ordering_score = 70.0 / 0.3;
        assert!((rep.overall() - 70.0).abs() < 1e-9);
        assert!(rep.is_eligible_to_propose(70.0));
    }

    #[test]
    fn validator_set_reindexes_deterministically_by_address() {
        let mut set = ValidatorSet::new();
        set.register(Validator::new(addr(2), [0u8; 32], 1, 0));
        set.register(Validator::new(addr(1), [0u8; 32], 1, 0));
        assert_eq!(set.index_of(&addr(1)), Some(0));
        assert_eq!(set.index_of(&addr(2)), Some(1));
    }

    #[test]
    fn slashing_removes_stake_from_active_total() {
        let mut set = ValidatorSet::new();
        set.register(Validator::new(addr(1), [0u8; 32], 100, 0));
        assert_eq!(set.total_active_stake, 100);
        set.slash(&addr(1));
        assert_eq!(set.total_active_stake, 0);
        assert!(set.get(&addr(1)).unwrap().is_slashed());
    }
}
