pub mod bridge;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod storage;
pub mod types;
pub mod validator;

pub use bridge::{ExecutionBridge, MockExecutionBridge};
pub use config::{ConsensusConfig, NodeConfig};
pub use consensus::{CoreStatus, EngineCoordinator, LocalValidator};

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use types::GenesisSnapshot;

/// Top-level node: the ambient `NodeConfig` plus a wired-up consensus core.
/// Network transport and persistent storage are out of scope, per the
/// surrounding node's responsibilities; this struct owns only what the core
/// needs to run.
pub struct Node {
    pub config: NodeConfig,
    pub coordinator: Arc<EngineCoordinator>,
    shutdown_tx: watch::Sender<bool>,
}

impl Node {
    pub fn new(
        config: NodeConfig,
        snapshot: GenesisSnapshot,
        bridge: Arc<dyn ExecutionBridge>,
        local_validator: Option<LocalValidator>,
    ) -> Result<Self> {
        let coordinator = EngineCoordinator::new(config.consensus.clone(), snapshot, bridge, local_validator)?;
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Ok(Node {
            config,
            coordinator: Arc::new(coordinator),
            shutdown_tx,
        })
    }

    /// Spawns the background task set and returns immediately; callers use
    /// `shutdown()` to request a graceful stop.
    pub fn start(&self) -> Vec<tokio::task::JoinHandle<()>> {
        info!(chain_id = self.config.consensus.chain_id, "starting consensus core");
        let shutdown_rx = self.shutdown_tx.subscribe();
        Arc::clone(&self.coordinator).spawn_background_tasks(shutdown_rx)
    }

    pub async fn status(&self) -> CoreStatus {
        self.coordinator.status().await
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
