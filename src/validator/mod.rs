use crate::bridge::ExecutionBridge;
use crate::consensus::{AttestationPool, LocalValidator};
use crate::crypto::KeyPair;
use crate::types::{Attestation, Hash, Slot};

/// Thin wrapper around a validator's keypair, handing out the pieces the
/// Engine Coordinator needs to act as a local proposer/attester.
pub struct ValidatorService {
    keypair: Option<KeyPair>,
    is_active: bool,
}

impl ValidatorService {
    pub fn new() -> Self {
        ValidatorService {
            keypair: None,
            is_active: false,
        }
    }

    pub fn load_keypair(&mut self, private_key: crate::types::PrivateKey) -> Result<(), Box<dyn std::error::Error>> {
        let keypair = KeyPair::from_private_key(private_key)?;
        self.keypair = Some(keypair);
        Ok(())
    }

    pub fn start_validating(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.keypair.is_none() {
            return Err("no keypair loaded".into());
        }
        self.is_active = true;
        Ok(())
    }

    pub fn stop_validating(&mut self) {
        self.is_active = false;
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_address(&self) -> Option<crate::types::Address> {
        self.keypair.as_ref().map(|kp| kp.address)
    }

    pub fn as_local_validator(&self) -> Option<LocalValidator> {
        self.keypair.as_ref().map(|kp| LocalValidator {
            address: kp.address,
            private_key: kp.private_key,
        })
    }

    pub async fn create_attestation(
        &self,
        pool: &AttestationPool,
        slot: Slot,
        block_hash: Hash,
        validator_index: u64,
        block_number: u64,
        bridge: &dyn ExecutionBridge,
    ) -> Result<Attestation, Box<dyn std::error::Error>> {
        let keypair = self.keypair.as_ref().ok_or("no keypair available")?;
        Ok(pool
            .create_attestation(
                slot,
                block_hash,
                validator_index,
                keypair.address,
                &keypair.private_key,
                block_number,
                bridge,
            )
            .await)
    }
}

impl Default for ValidatorService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_without_a_keypair_fails() {
        let mut service = ValidatorService::new();
        assert!(service.start_validating().is_err());
    }

    #[test]
    fn loading_a_keypair_allows_activation() {
        let mut service = ValidatorService::new();
        let keypair = KeyPair::generate();
        service.load_keypair(keypair.private_key).unwrap();
        assert!(service.start_validating().is_ok());
        assert!(service.is_active());
        assert_eq!(service.get_address(), Some(keypair.address));
    }
}
