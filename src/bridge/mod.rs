pub mod mock;

pub use mock::MockExecutionBridge;

use crate::types::{Address, Amount, Hash};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("execution bridge call timed out")]
    Timeout,
    #[error("execution bridge RPC error: {0}")]
    Rpc(String),
    #[error("unknown block hash")]
    UnknownBlock,
}

/// Payload-building attributes supplied with a fork-choice notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadAttributes {
    pub timestamp: i64,
    pub prev_randao: [u8; 32],
    pub fee_recipient: Address,
}

/// Snapshot of a validator as reported by the execution layer's validator
/// set query.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeValidatorInfo {
    pub address: Address,
    pub stake: Amount,
    pub active: bool,
}

/// Result of the ordering-score query: a normalized score plus the boolean
/// fair-ordering verdict used directly by Fork Choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderingVerdict {
    pub score: f64,
    pub fair_ordering: bool,
}

/// Bounds a single bridge call to `timeout_secs`, turning an elapsed timer
/// into `BridgeError::Timeout`. Every bridge call site in this crate goes
/// through this wrapper.
pub async fn with_timeout<T, Fut>(timeout_secs: u64, fut: Fut) -> Result<T, BridgeError>
where
    Fut: std::future::Future<Output = Result<T, BridgeError>>,
{
    match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::Timeout),
    }
}

/// The narrow client contract between the consensus core and the execution
/// layer: the four-step payload protocol plus the five read-only queries.
/// Object-safe via `async-trait` so it can be shared as `Arc<dyn ExecutionBridge>`.
#[async_trait]
pub trait ExecutionBridge: Send + Sync {
    async fn notify_fork_choice(
        &self,
        head: Hash,
        safe: Hash,
        finalized: Hash,
        attributes: Option<PayloadAttributes>,
    ) -> Result<Option<u64>, BridgeError>;

    async fn get_payload(&self, payload_id: u64) -> Result<Hash, BridgeError>;

    async fn submit_payload(&self, block_hash: Hash) -> Result<(), BridgeError>;

    async fn pow_quality(&self) -> Result<u64, BridgeError>;

    async fn mev_detected(&self, block_number: u64) -> Result<bool, BridgeError>;

    async fn ordering_score(&self, block_number: u64) -> Result<OrderingVerdict, BridgeError>;

    async fn validator_set(&self) -> Result<Vec<BridgeValidatorInfo>, BridgeError>;

    async fn block_number_by_hash(&self, hash: Hash) -> Result<Option<u64>, BridgeError>;
}
