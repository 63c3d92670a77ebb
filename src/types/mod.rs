pub mod attestation;
pub mod beacon_state;
pub mod checkpoint;
pub mod fork;
pub mod proposer;
pub mod validator;

pub use attestation::*;
pub use beacon_state::*;
pub use checkpoint::*;
pub use fork::*;
pub use proposer::*;
pub use validator::*;

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Hash = [u8; 32];
pub type PublicKey = [u8; 32];
pub type PrivateKey = [u8; 32];

/// Wei-scale quantity. `u64` cannot hold the default minimum stake
/// (32 * 10^18), so stakes and rewards are carried as `u128` throughout.
pub type Amount = u128;
pub type Nonce = u64;
pub type Slot = u64;
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl serde::Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 64 {
            return Err(serde::de::Error::custom("invalid signature length"));
        }
        let mut array = [0u8; 64];
        array.copy_from_slice(&bytes);
        Ok(Signature(array))
    }
}

/// A 20-byte EVM-style address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<PublicKey> for Address {
    /// The last 20 bytes of `sha256(public_key)`, mirroring the
    /// keccak-last-20-bytes convention of EVM address derivation while
    /// keeping this crate's hashing on sha2 throughout.
    fn from(public_key: PublicKey) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(public_key);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..32]);
        Address(bytes)
    }
}

impl TryFrom<&str> for Address {
    type Error = hex::FromHexError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut array = [0u8; 20];
        array.copy_from_slice(&bytes);
        Ok(Address(array))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkId {
    Mainnet = 1,
    Testnet = 2,
    Devnet = 3,
}

impl Default for NetworkId {
    fn default() -> Self {
        NetworkId::Devnet
    }
}
