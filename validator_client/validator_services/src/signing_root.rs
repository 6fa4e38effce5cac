//! Stand-in signing-root derivation.
//!
//! The consensus spec computes a signing root via SSZ hash-tree-root over a
//! domain-separated container; that wire format is out of scope here. What
//! the pipeline's own invariants need is *some* stable digest of "this
//! epoch" or "this exact block" to hand the signing oracle — so this module
//! derives one from the opaque fields directly, rather than reimplementing
//! SSZ.

use sha2::{Digest, Sha256};
use types::{Epoch, Hash256, Slot};

pub fn randao_reveal_signing_root(epoch: Epoch) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(b"randao_reveal");
    hasher.update(epoch.as_u64().to_le_bytes());
    Hash256::from_slice(&hasher.finalize())
}

pub fn block_signing_root(slot: Slot, proposer_index: u64, parent_root: Hash256) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(b"beacon_block");
    hasher.update(slot.as_u64().to_le_bytes());
    hasher.update(proposer_index.to_le_bytes());
    hasher.update(parent_root.as_slice());
    Hash256::from_slice(&hasher.finalize())
}

pub fn registration_signing_root(pubkey: &types::PublicKeyBytes, timestamp: u64) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(b"validator_registration");
    hasher.update(pubkey.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    Hash256::from_slice(&hasher.finalize())
}
