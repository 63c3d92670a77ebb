use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::types::NetworkId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub validator: ValidatorConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
    pub consensus: ConsensusConfig,
}

/// Chain-identity and tunable thresholds consumed by the consensus core.
/// Surrounding config, per the "out of core scope" note, but the core
/// requires one of these to construct its components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub chain_id: u64,
    pub slot_duration_ms: u64,
    pub slots_per_epoch: u64,
    pub minimum_stake: u128,
    pub finality_threshold_numerator: u64,
    pub finality_threshold_denominator: u64,
    pub justification_delay_slots: u64,
    pub finalization_delay_slots: u64,
    pub base_reward_per_epoch: u128,
    pub mev_bonus_multiplier_bps: u32,
    pub ordering_bonus_multiplier_bps: u32,
    /// Fork-choice ordering bonus factor, expressed as (factor - 1) in
    /// basis points. Default 1000 = a 1.1x factor on base stake.
    pub fork_ordering_bonus_factor_bps: u32,
    pub slashing_percentage_bps: u32,
    pub inactivity_penalty: u128,
    pub pow_influence_bps: u32,
    pub reputation_decay_rate_bps: u32,
    pub min_reputation_to_propose: f64,
    pub min_mev_score_to_justify: f64,
    pub min_ordering_score_to_justify: f64,
    pub attestation_window_slots: u64,
    pub proposer_cache_size: u64,
    pub checkpoint_retention_count: u64,
    pub bridge_call_timeout_secs: u64,
    pub reputation_decay_interval_secs: u64,
    /// Seed for the protocol-wide deterministic VRF keypair. Every
    /// validator derives the same keypair from this value, so the
    /// selector's VRF evaluation (§4.1 step 4) is reproducible by any
    /// correct implementation rather than tied to a personal secret.
    pub vrf_seed: [u8; 32],
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            chain_id: 1,
            slot_duration_ms: 12_000,
            slots_per_epoch: 32,
            minimum_stake: 32_000_000_000_000_000_000,
            finality_threshold_numerator: 2,
            finality_threshold_denominator: 3,
            justification_delay_slots: 1,
            finalization_delay_slots: 2,
            base_reward_per_epoch: 1_000_000_000_000_000_000,
            mev_bonus_multiplier_bps: 2_000,
            ordering_bonus_multiplier_bps: 1_500,
            fork_ordering_bonus_factor_bps: 1_000,
            slashing_percentage_bps: 500,
            inactivity_penalty: 0,
            pow_influence_bps: 3_000,
            reputation_decay_rate_bps: 100,
            min_reputation_to_propose: 70.0,
            min_mev_score_to_justify: 80.0,
            min_ordering_score_to_justify: 90.0,
            attestation_window_slots: 64,
            proposer_cache_size: 100,
            checkpoint_retention_count: 100,
            bridge_call_timeout_secs: 30,
            reputation_decay_interval_secs: 3_600,
            vrf_seed: [0u8; 32],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: NetworkId,
    pub listen_address: String,
    pub port: u16,
    pub max_peers: usize,
    pub bootstrap_nodes: Vec<String>,
    pub enable_mdns: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub db_url: Option<String>,
    pub cache_size: usize,
    pub sync_mode: SyncMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub enabled: bool,
    pub keystore_path: Option<PathBuf>,
    pub keystore_password: Option<String>,
    pub graffiti: Option<String>,
    pub fee_recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub listen_address: String,
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_address: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncMode {
    Full,
    Fast,
    Light,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            validator: ValidatorConfig::default(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
            consensus: ConsensusConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            network_id: NetworkId::Devnet,
            listen_address: "0.0.0.0".to_string(),
            port: 9000,
            max_peers: 50,
            bootstrap_nodes: Vec::new(),
            enable_mdns: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("./data"),
            db_url: None,
            cache_size: 1024 * 1024 * 100, // 100MB
            sync_mode: SyncMode::Full,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            enabled: false,
            keystore_path: None,
            keystore_password: None,
            graffiti: None,
            fee_recipient: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            enabled: true,
            listen_address: "127.0.0.1:8080".to_string(),
            cors_origins: vec!["*".to_string()],
            max_request_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            enabled: false,
            listen_address: "127.0.0.1:9090".to_string(),
            namespace: "anti_mev_consensus".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl NodeConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}