use super::{BridgeError, BridgeValidatorInfo, ExecutionBridge, OrderingVerdict, PayloadAttributes};
use crate::types::Hash;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Deterministic in-memory bridge used by tests and embedders who want a
/// stand-in execution layer without standing up real infrastructure.
/// Every query is driven by values set directly on the struct rather than
/// network calls.
#[derive(Debug)]
pub struct MockExecutionBridge {
    inner: RwLock<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    pow_quality: u64,
    mev_flags: HashMap<u64, bool>,
    ordering_verdicts: HashMap<u64, OrderingVerdict>,
    block_numbers: HashMap<Hash, u64>,
    validators: Vec<BridgeValidatorInfo>,
    next_payload_id: u64,
    payloads: HashMap<u64, Hash>,
    submitted: Vec<Hash>,
    fail_next_call: bool,
}

impl Default for MockExecutionBridge {
    fn default() -> Self {
        MockExecutionBridge {
            inner: RwLock::new(MockState {
                pow_quality: 1,
                ..MockState::default()
            }),
        }
    }
}

impl MockExecutionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_pow_quality(&self, quality: u64) {
        self.inner.write().await.pow_quality = quality;
    }

    pub async fn set_mev_flag(&self, block_number: u64, detected: bool) {
        self.inner.write().await.mev_flags.insert(block_number, detected);
    }

    pub async fn set_ordering_verdict(&self, block_number: u64, verdict: OrderingVerdict) {
        self.inner
            .write()
            .await
            .ordering_verdicts
            .insert(block_number, verdict);
    }

    pub async fn set_validators(&self, validators: Vec<BridgeValidatorInfo>) {
        self.inner.write().await.validators = validators;
    }

    pub async fn register_block(&self, hash: Hash, block_number: u64) {
        self.inner.write().await.block_numbers.insert(hash, block_number);
    }

    /// Causes the next single bridge call to fail, for exercising the
    /// degrade-and-log paths. Resets itself after one failure.
    pub async fn fail_next_call(&self) {
        self.inner.write().await.fail_next_call = true;
    }

    async fn maybe_fail(&self) -> Result<(), BridgeError> {
        let mut state = self.inner.write().await;
        if state.fail_next_call {
            state.fail_next_call = false;
            return Err(BridgeError::Rpc("injected test failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionBridge for MockExecutionBridge {
    async fn notify_fork_choice(
        &self,
        _head: Hash,
        _safe: Hash,
        _finalized: Hash,
        _attributes: Option<PayloadAttributes>,
    ) -> Result<Option<u64>, BridgeError> {
        self.maybe_fail().await?;
        let mut state = self.inner.write().await;
        if _attributes.is_none() {
            return Ok(None);
        }
        let id = state.next_payload_id;
        state.next_payload_id += 1;
        let payload_hash = crate::crypto::Hasher::hash(&id.to_be_bytes());
        state.payloads.insert(id, payload_hash);
        Ok(Some(id))
    }

    async fn get_payload(&self, payload_id: u64) -> Result<Hash, BridgeError> {
        self.maybe_fail().await?;
        self.inner
            .read()
            .await
            .payloads
            .get(&payload_id)
            .copied()
            .ok_or(BridgeError::UnknownBlock)
    }

    async fn submit_payload(&self, block_hash: Hash) -> Result<(), BridgeError> {
        self.maybe_fail().await?;
        self.inner.write().await.submitted.push(block_hash);
        Ok(())
    }

    async fn pow_quality(&self) -> Result<u64, BridgeError> {
        self.maybe_fail().await?;
        Ok(self.inner.read().await.pow_quality)
    }

    async fn mev_detected(&self, block_number: u64) -> Result<bool, BridgeError> {
        self.maybe_fail().await?;
        Ok(self
            .inner
            .read()
            .await
            .mev_flags
            .get(&block_number)
            .copied()
            .unwrap_or(false))
    }

    async fn ordering_score(&self, block_number: u64) -> Result<OrderingVerdict, BridgeError> {
        self.maybe_fail().await?;
        Ok(self
            .inner
            .read()
            .await
            .ordering_verdicts
            .get(&block_number)
            .copied()
            .unwrap_or(OrderingVerdict {
                score: 1.0,
                fair_ordering: true,
            }))
    }

    async fn validator_set(&self) -> Result<Vec<BridgeValidatorInfo>, BridgeError> {
        self.maybe_fail().await?;
        Ok(self.inner.read().await.validators.clone())
    }

    async fn block_number_by_hash(&self, hash: Hash) -> Result<Option<u64>, BridgeError> {
        self.maybe_fail().await?;
        Ok(self.inner.read().await.block_numbers.get(&hash).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[tokio::test]
    async fn pow_quality_defaults_to_one() {
        let bridge = MockExecutionBridge::new();
        assert_eq!(bridge.pow_quality().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let bridge = MockExecutionBridge::new();
        bridge.fail_next_call().await;
        assert!(bridge.pow_quality().await.is_err());
        assert!(bridge.pow_quality().await.is_ok());
    }

    #[tokio::test]
    async fn mev_flag_defaults_to_false_when_unset() {
        let bridge = MockExecutionBridge::new();
        assert!(!bridge.mev_detected(5).await.unwrap());
        bridge.set_mev_flag(5, true).await;
        assert!(bridge.mev_detected(5).await.unwrap());
    }

    #[tokio::test]
    async fn validator_set_reports_whatever_was_configured() {
        let bridge = MockExecutionBridge::new();
        bridge
            .set_validators(vec![BridgeValidatorInfo {
                address: Address::ZERO,
                stake: 100,
                active: true,
            }])
            .await;
        let validators = bridge.validator_set().await.unwrap();
        assert_eq!(validators.len(), 1);
    }
}
