use crate::types::GenesisSnapshot;
use std::path::Path;

/// Loads and persists the initialization snapshot (validator set with
/// reputations, finalized sequence) the core accepts at startup. Actual
/// long-term persistence of chain history lives in the surrounding node;
/// this mirrors the teacher's `NodeConfig::load_from_file`/`save_to_file`
/// pattern for the one artifact this crate itself must round-trip.
pub struct SnapshotStore;

impl SnapshotStore {
    pub fn load_from_file(path: &Path) -> Result<GenesisSnapshot, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: GenesisSnapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    pub fn save_to_file(snapshot: &GenesisSnapshot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Validator, ValidatorSet};

    #[test]
    fn snapshot_round_trips_through_a_file() {
        let mut validators = ValidatorSet::new();
        validators.register(Validator::new(crate::types::Address::ZERO, [0u8; 32], 1000, 0));
        let snapshot = GenesisSnapshot {
            genesis_timestamp: 123,
            validators,
            finalized_sequence: vec![1, 2, 3],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        SnapshotStore::save_to_file(&snapshot, &path).unwrap();
        let loaded = SnapshotStore::load_from_file(&path).unwrap();

        assert_eq!(loaded.genesis_timestamp, 123);
        assert_eq!(loaded.finalized_sequence, vec![1, 2, 3]);
    }
}
