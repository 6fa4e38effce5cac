use crate::primitives::{ExecutionAddress, PublicKeyBytes, SignatureBytes};
use serde::{Deserialize, Serialize};

/// A validator's declared preferences for block-builder relays: who should
/// receive the fee and how much gas the payload may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRegistrationData {
    pub fee_recipient: ExecutionAddress,
    pub gas_limit: u64,
    pub timestamp: u64,
    pub pubkey: PublicKeyBytes,
}

/// A [`ValidatorRegistrationData`] stapled with the validator's signature over
/// it. Registrations are content-addressed by `pubkey`: the latest signed
/// registration for a key supersedes any prior one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedValidatorRegistrationData {
    pub message: ValidatorRegistrationData,
    pub signature: SignatureBytes,
}
