use crate::execution_payload::{ExecutionPayload, ExecutionPayloadHeader};
use crate::fork_name::ForkName;
use crate::kzg::{Blob, KzgCommitment, KzgProof};
use crate::primitives::{Graffiti, Hash256, SignatureBytes};
use crate::slot_epoch::Slot;
use superstruct::superstruct;

/// A full (non-blinded) beacon block body, generalized across forks.
///
/// Everything the pipeline never inspects (attestations, deposits, sync
/// aggregates, ...) lives in `opaque`; only the fields each fork introduces
/// that matter to the pipeline's own invariants are named.
#[superstruct(
    variants(Phase0, Altair, Bellatrix, Capella, Deneb, Electra),
    variant_attributes(derive(Debug, Clone, PartialEq))
)]
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub graffiti: Graffiti,
    #[superstruct(only(Bellatrix, Capella, Deneb, Electra))]
    pub execution_payload: ExecutionPayload,
    #[superstruct(only(Deneb, Electra))]
    pub blob_kzg_commitments: Vec<KzgCommitment>,
    /// Remaining fork-specific operations, never inspected by the pipeline.
    pub opaque: Vec<u8>,
}

/// The blinded counterpart of [`BeaconBlockBody`]: the execution payload is
/// replaced by its header so a builder may reveal the full payload later.
#[superstruct(
    variants(Phase0, Altair, Bellatrix, Capella, Deneb, Electra),
    variant_attributes(derive(Debug, Clone, PartialEq))
)]
#[derive(Debug, Clone, PartialEq)]
pub struct BlindedBeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub graffiti: Graffiti,
    #[superstruct(only(Bellatrix, Capella, Deneb, Electra))]
    pub execution_payload_header: ExecutionPayloadHeader,
    #[superstruct(only(Deneb, Electra))]
    pub blob_kzg_commitments: Vec<KzgCommitment>,
    pub opaque: Vec<u8>,
}

impl BeaconBlockBody {
    pub fn fork_name(&self) -> ForkName {
        match self {
            BeaconBlockBody::Phase0(_) => ForkName::Phase0,
            BeaconBlockBody::Altair(_) => ForkName::Altair,
            BeaconBlockBody::Bellatrix(_) => ForkName::Bellatrix,
            BeaconBlockBody::Capella(_) => ForkName::Capella,
            BeaconBlockBody::Deneb(_) => ForkName::Deneb,
            BeaconBlockBody::Electra(_) => ForkName::Electra,
        }
    }
}

impl BlindedBeaconBlockBody {
    pub fn fork_name(&self) -> ForkName {
        match self {
            BlindedBeaconBlockBody::Phase0(_) => ForkName::Phase0,
            BlindedBeaconBlockBody::Altair(_) => ForkName::Altair,
            BlindedBeaconBlockBody::Bellatrix(_) => ForkName::Bellatrix,
            BlindedBeaconBlockBody::Capella(_) => ForkName::Capella,
            BlindedBeaconBlockBody::Deneb(_) => ForkName::Deneb,
            BlindedBeaconBlockBody::Electra(_) => ForkName::Electra,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body: BeaconBlockBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlindedBeaconBlock {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body: BlindedBeaconBlockBody,
}

impl BeaconBlock {
    pub fn fork_name(&self) -> ForkName {
        self.body.fork_name()
    }
}

impl BlindedBeaconBlock {
    pub fn fork_name(&self) -> ForkName {
        self.body.fork_name()
    }
}

/// The KZG proofs and data blobs accompanying a Deneb-or-later full block.
/// Not signed: only the commitments inside the block body are bound by the
/// proposer's signature, so these are forwarded from `get_block` to
/// `submit_block` unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlobsBundle {
    pub kzg_proofs: Vec<KzgProof>,
    pub blobs: Vec<Blob>,
}

/// A block produced by the beacon node for a given slot, not yet signed.
///
/// The variant (fork, blinded-ness) is fixed at construction time and the
/// pipeline's dispatch is exhaustive over it; see [`VersionedProposal::fork_name`].
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedProposal {
    Full {
        block: BeaconBlock,
        blobs_bundle: Option<BlobsBundle>,
    },
    Blinded {
        block: BlindedBeaconBlock,
    },
}

impl VersionedProposal {
    pub fn fork_name(&self) -> ForkName {
        match self {
            VersionedProposal::Full { block, .. } => block.fork_name(),
            VersionedProposal::Blinded { block } => block.fork_name(),
        }
    }

    pub fn is_blinded(&self) -> bool {
        matches!(self, VersionedProposal::Blinded { .. })
    }

    pub fn slot(&self) -> Slot {
        match self {
            VersionedProposal::Full { block, .. } => block.slot,
            VersionedProposal::Blinded { block } => block.slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: SignatureBytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedBlindedBeaconBlock {
    pub message: BlindedBeaconBlock,
    pub signature: SignatureBytes,
}

/// The signed, submission-ready counterpart of [`VersionedProposal`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignedVersionedProposal {
    Full {
        signed_block: SignedBeaconBlock,
        blobs_bundle: Option<BlobsBundle>,
    },
    Blinded {
        signed_block: SignedBlindedBeaconBlock,
    },
}

impl SignedVersionedProposal {
    pub fn fork_name(&self) -> ForkName {
        match self {
            SignedVersionedProposal::Full { signed_block, .. } => signed_block.message.fork_name(),
            SignedVersionedProposal::Blinded { signed_block } => signed_block.message.fork_name(),
        }
    }
}

// Wire (de)serialization belongs to the external beacon-node HTTP client,
// which works with the raw, pre-validation representation (see `eth2::raw`).
#[allow(dead_code)]
fn _assert_send_sync() {
    fn assert<T: Send + Sync>() {}
    assert::<VersionedProposal>();
    assert::<SignedVersionedProposal>();
}
