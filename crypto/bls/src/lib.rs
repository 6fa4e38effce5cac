//! The narrow signing contract the proposal pipeline and registration
//! scheduler depend on: hand a (pubkey, signing root) to an oracle, get back
//! a signature. The oracle may be a local keystore or a remote threshold
//! signer; this crate models only the boundary, never an implementation.

use std::fmt;
use std::future::Future;

use types::{Hash256, PublicKeyBytes, SignatureBytes};

/// Anything capable of producing a BLS signature over a signing root on
/// behalf of a validator.
///
/// Implementations may internally await a network round trip (e.g. a
/// threshold-signing ceremony across a committee); from the caller's
/// perspective this is still a single logical signing call.
pub trait SigningOracle: Send + Sync {
    fn sign(
        &self,
        pubkey: PublicKeyBytes,
        signing_root: Hash256,
    ) -> impl Future<Output = Result<SignatureBytes, Error>> + Send;
}

#[derive(Debug)]
pub enum Error {
    /// The oracle has no key material for this validator.
    UnknownValidator(PublicKeyBytes),
    /// The signing round itself failed (timeout, quorum not reached, ...).
    SigningFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownValidator(pubkey) => {
                write!(f, "no signing key for validator {pubkey:?}")
            }
            Error::SigningFailed(msg) => write!(f, "signing failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
