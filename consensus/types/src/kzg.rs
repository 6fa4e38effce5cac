use serde::{Deserialize, Serialize};

/// The number of bytes in a single data blob, per the data-availability-sampling scheme.
pub const BYTES_PER_BLOB: usize = 131_072;

/// A polynomial commitment to a blob. Opaque to the pipeline: never inspected,
/// only forwarded between `get_block` and `submit_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KzgCommitment(pub [u8; 48]);

/// A proof that a `KzgCommitment` evaluates to the claimed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KzgProof(pub [u8; 48]);

/// A single data blob. Not signed directly; only its commitment is bound into
/// the block body, so a blob may be forwarded between pipeline stages without
/// re-verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob(pub Vec<u8>);

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Blob").field(&self.0.len()).finish()
    }
}
