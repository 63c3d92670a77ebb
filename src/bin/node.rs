use clap::{Arg, Command};
use anti_mev_consensus::{
    bridge::{ExecutionBridge, MockExecutionBridge},
    config::NodeConfig,
    consensus::LocalValidator,
    crypto::KeyPair,
    storage::SnapshotStore,
    types::{GenesisSnapshot, ValidatorSet},
    Node,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("anti-mev-consensus-node")
        .version("0.1.0")
        .about("Anti-MEV Proof of Stake consensus node")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.json"),
        )
        .arg(
            Arg::new("genesis")
                .short('g')
                .long("genesis")
                .value_name("FILE")
                .help("Genesis snapshot file path")
                .default_value("genesis.json"),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory path")
                .default_value("./data"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Network to connect to")
                .value_parser(["mainnet", "testnet", "devnet"])
                .default_value("devnet"),
        )
        .arg(
            Arg::new("validator-key")
                .long("validator-key")
                .value_name("FILE")
                .help("Private key file to run as a local validator"),
        )
        .arg(
            Arg::new("log-level")
                .short('v')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .get_matches();

    let log_level = matches.get_one::<String>("log-level").unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(format!("anti_mev_consensus={}", log_level))
        .init();

    info!("Starting anti-MEV PoS consensus node v0.1.0");

    let config_path = PathBuf::from(matches.get_one::<String>("config").unwrap());
    let mut config = if config_path.exists() {
        info!("Loading configuration from: {:?}", config_path);
        NodeConfig::load_from_file(&config_path)?
    } else {
        info!("Using default configuration");
        NodeConfig::default()
    };

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = PathBuf::from(data_dir);
    }

    if let Some(network) = matches.get_one::<String>("network") {
        config.network.network_id = match network.as_str() {
            "mainnet" => anti_mev_consensus::types::NetworkId::Mainnet,
            "testnet" => anti_mev_consensus::types::NetworkId::Testnet,
            "devnet" => anti_mev_consensus::types::NetworkId::Devnet,
            _ => anti_mev_consensus::types::NetworkId::Devnet,
        };
    }

    let genesis_path = PathBuf::from(matches.get_one::<String>("genesis").unwrap());
    let snapshot = if genesis_path.exists() {
        info!("Loading genesis snapshot from: {:?}", genesis_path);
        SnapshotStore::load_from_file(&genesis_path)?
    } else {
        info!("No genesis snapshot found, starting an empty validator set");
        GenesisSnapshot {
            genesis_timestamp: 0,
            validators: ValidatorSet::new(),
            finalized_sequence: Vec::new(),
        }
    };

    let local_validator = match matches.get_one::<String>("validator-key") {
        Some(keyfile) => {
            let key_content = std::fs::read_to_string(keyfile)?;
            let key_data: serde_json::Value = serde_json::from_str(&key_content)?;
            let private_key_hex = key_data["private_key"]
                .as_str()
                .ok_or("Invalid key file format")?;
            let keypair = KeyPair::from_hex(private_key_hex)?;
            config.validator.enabled = true;
            info!(address = %keypair.address, "running as a local validator");
            Some(LocalValidator {
                address: keypair.address,
                private_key: keypair.private_key,
            })
        }
        None => None,
    };

    let bridge: Arc<dyn ExecutionBridge> = Arc::new(MockExecutionBridge::new());

    match Node::new(config, snapshot, bridge, local_validator) {
        Ok(node) => {
            info!("Node initialized successfully");
            let handles = node.start();

            tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
            info!("Received shutdown signal, stopping gracefully...");
            node.shutdown();

            for handle in handles {
                let _ = handle.await;
            }
        }
        Err(e) => {
            error!("Failed to initialize node: {}", e);
            return Err(e.into());
        }
    }

    info!("Node stopped");
    Ok(())
}
