use clap::{Arg, Command};
use anti_mev_consensus::crypto::KeyPair;
use anti_mev_consensus::storage::SnapshotStore;
use anti_mev_consensus::types::{GenesisSnapshot, Validator, ValidatorSet};
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("validator")
        .version("0.1.0")
        .about("Anti-MEV PoS validator utilities")
        .subcommand(
            Command::new("generate-keys")
                .about("Generate validator keypair")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file for the private key")
                        .default_value("validator_key.json"),
                ),
        )
        .subcommand(
            Command::new("show-address")
                .about("Show validator address from private key")
                .arg(
                    Arg::new("keyfile")
                        .short('k')
                        .long("keyfile")
                        .value_name("FILE")
                        .help("Private key file")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Register a validator into a genesis snapshot")
                .arg(
                    Arg::new("keyfile")
                        .short('k')
                        .long("keyfile")
                        .value_name("FILE")
                        .help("Private key file")
                        .required(true),
                )
                .arg(
                    Arg::new("stake")
                        .short('s')
                        .long("stake")
                        .value_name("AMOUNT")
                        .help("Initial stake amount, in wei")
                        .required(true),
                )
                .arg(
                    Arg::new("genesis")
                        .short('g')
                        .long("genesis")
                        .value_name("FILE")
                        .help("Genesis snapshot file to create or update")
                        .default_value("genesis.json"),
                ),
        )
        .get_matches();

    tracing_subscriber::fmt().init();

    match matches.subcommand() {
        Some(("generate-keys", sub_matches)) => {
            let output_file = sub_matches.get_one::<String>("output").unwrap();
            generate_validator_keys(output_file)?;
        }
        Some(("show-address", sub_matches)) => {
            let keyfile = sub_matches.get_one::<String>("keyfile").unwrap();
            show_validator_address(keyfile)?;
        }
        Some(("register", sub_matches)) => {
            let keyfile = sub_matches.get_one::<String>("keyfile").unwrap();
            let stake = sub_matches.get_one::<String>("stake").unwrap();
            let genesis = sub_matches.get_one::<String>("genesis").unwrap();
            register_validator(keyfile, stake, genesis)?;
        }
        _ => {
            error!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn generate_validator_keys(output_file: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Generating new validator keypair...");

    let keypair = KeyPair::generate();

    let key_data = serde_json::json!({
        "private_key": hex::encode(keypair.private_key),
        "public_key": hex::encode(keypair.public_key),
        "address": keypair.address.to_string(),
    });

    std::fs::write(output_file, serde_json::to_string_pretty(&key_data)?)?;

    info!("Validator keypair generated successfully!");
    info!("Private key saved to: {}", output_file);
    info!("Public key: {}", hex::encode(keypair.public_key));
    info!("Address: {}", keypair.address);
    info!("Keep the private key file secure, it is never recoverable if lost.");

    Ok(())
}

fn show_validator_address(keyfile: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Reading validator key from: {}", keyfile);

    let key_content = std::fs::read_to_string(keyfile)?;
    let key_data: serde_json::Value = serde_json::from_str(&key_content)?;

    let private_key_hex = key_data["private_key"]
        .as_str()
        .ok_or("Invalid key file format")?;

    let keypair = KeyPair::from_hex(private_key_hex)?;

    info!("Validator Information:");
    info!("Address: {}", keypair.address);
    info!("Public Key: {}", hex::encode(keypair.public_key));

    Ok(())
}

fn register_validator(
    keyfile: &str,
    stake: &str,
    genesis_file: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let key_content = std::fs::read_to_string(keyfile)?;
    let key_data: serde_json::Value = serde_json::from_str(&key_content)?;

    let private_key_hex = key_data["private_key"]
        .as_str()
        .ok_or("Invalid key file format")?;

    let keypair = KeyPair::from_hex(private_key_hex)?;
    let stake_amount: u128 = stake.parse()?;

    let genesis_path = PathBuf::from(genesis_file);
    let mut snapshot = if genesis_path.exists() {
        SnapshotStore::load_from_file(&genesis_path)?
    } else {
        GenesisSnapshot {
            genesis_timestamp: 0,
            validators: ValidatorSet::new(),
            finalized_sequence: Vec::new(),
        }
    };

    let epoch = 0;
    snapshot
        .validators
        .register(Validator::new(keypair.address, keypair.public_key, stake_amount, epoch));
    SnapshotStore::save_to_file(&snapshot, &genesis_path)?;

    info!("Validator registered:");
    info!("  Address: {}", keypair.address);
    info!("  Stake: {} wei", stake_amount);
    info!("  Genesis snapshot updated: {}", genesis_file);

    Ok(())
}
