//! Raw, pre-validation wire shapes returned by the beacon-node REST API.
//!
//! These mirror the beacon node's actual response envelopes, where fields
//! that are only present for some fork/blinded combinations are modeled as
//! `Option`. Converting a raw response into the core's closed
//! [`types::VersionedProposal`] sum type — and rejecting a response whose
//! mandatory fields are missing — is the proposal pipeline's job, not this
//! crate's; see `validator_services::block_service`.

use serde::{Deserialize, Serialize};
use types::{
    ExecutionAddress, ForkName, Graffiti, Hash256, KzgCommitment, KzgProof, PublicKeyBytes,
    SignatureBytes, Slot,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProposerDuty {
    pub pubkey: PublicKeyBytes,
    pub validator_index: u64,
    pub slot: Slot,
}

/// The envelope around `GET /eth/v1/validator/duties/proposer/{epoch}`.
///
/// `data` is `None` when the beacon node replies with a null payload, which
/// the client treats as [`crate::Error::EmptyResponse`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProposerDutiesResponse {
    pub dependent_root: Hash256,
    pub data: Option<Vec<ProposerDuty>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawExecutionPayload {
    pub block_hash: Hash256,
    pub fee_recipient: ExecutionAddress,
    #[serde(with = "serde_u64_str")]
    pub block_number: u64,
    #[serde(default)]
    pub opaque: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawExecutionPayloadHeader {
    pub block_hash: Hash256,
    pub fee_recipient: ExecutionAddress,
    #[serde(with = "serde_u64_str")]
    pub block_number: u64,
    pub transactions_root: Hash256,
}

/// Raw beacon-block body. At most one of `execution_payload` /
/// `execution_payload_header` is set, depending on whether the response is
/// blinded; either may be absent entirely on a malformed response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub graffiti: Graffiti,
    #[serde(default)]
    pub execution_payload: Option<RawExecutionPayload>,
    #[serde(default)]
    pub execution_payload_header: Option<RawExecutionPayloadHeader>,
    #[serde(default)]
    pub blob_kzg_commitments: Option<Vec<KzgCommitment>>,
    #[serde(default)]
    pub opaque: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBeaconBlock {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body: Option<RawBeaconBlockBody>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBlobsBundle {
    pub kzg_proofs: Vec<KzgProof>,
    pub blobs: Vec<types::Blob>,
}

/// The envelope around `GET /eth/v3/validator/blocks/{slot}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetBlockResponse {
    pub version: ForkName,
    #[serde(default)]
    pub execution_payload_blinded: bool,
    pub data: Option<RawBeaconBlock>,
    #[serde(default)]
    pub blobs_bundle: Option<RawBlobsBundle>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProposalPreparationData {
    pub validator_index: u64,
    pub fee_recipient: ExecutionAddress,
}

mod serde_u64_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
