use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProposerError {
    #[error("no eligible validators for this slot")]
    NoEligibleValidators,
}

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),
    #[error("duplicate attestation from validator for this slot")]
    DuplicateAttestation,
    #[error("attestation slot is too far behind the current slot")]
    AttestationTooOld,
}

#[derive(Debug, Error)]
pub enum FinalityError {
    #[error("unknown checkpoint")]
    InvalidCheckpoint,
    #[error("signature aggregation failed")]
    AggregationFailed,
}

#[derive(Debug, Error)]
pub enum ForkChoiceError {
    #[error("block references an unknown parent")]
    UnknownParent,
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Proposer(#[from] ProposerError),
    #[error(transparent)]
    Attestation(#[from] AttestationError),
    #[error(transparent)]
    Finality(#[from] FinalityError),
    #[error(transparent)]
    ForkChoice(#[from] ForkChoiceError),
    #[error("configuration error: {0}")]
    Configuration(String),
}
