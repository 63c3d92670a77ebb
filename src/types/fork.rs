use super::{Amount, Hash};
use serde::{Deserialize, Serialize};

/// A candidate chain head with a computed effective weight accounting for
/// MEV penalty and ordering bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fork {
    pub head: Hash,
    pub parent: Hash,
    pub height: u64,
    pub base_stake: Amount,
    pub mev_penalty: Amount,
    pub ordering_bonus: Amount,
}

impl Fork {
    pub fn new(head: Hash, parent: Hash, height: u64, base_stake: Amount) -> Self {
        Fork {
            head,
            parent,
            height,
            base_stake,
            mev_penalty: 0,
            ordering_bonus: 0,
        }
    }

    /// base - penalty + bonus; saturates at 0 rather than underflowing.
    pub fn effective_weight(&self) -> Amount {
        self.base_stake
            .saturating_sub(self.mev_penalty)
            .saturating_add(self.ordering_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_weight_applies_penalty_and_bonus() {
        let mut fork = Fork::new([1u8; 32], [0u8; 32], 10, 1000);
        fork.mev_penalty = 500;
        fork.ordering_bonus = 100;
        assert_eq!(fork.effective_weight(), 600);
    }

    #[test]
    fn effective_weight_never_underflows() {
        let mut fork = Fork::new([1u8; 32], [0u8; 32], 10, 100);
        fork.mev_penalty = 1000;
        assert_eq!(fork.effective_weight(), 0);
    }
}
