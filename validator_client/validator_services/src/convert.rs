//! Converts the beacon node's raw, pre-validation response into the core's
//! closed [`VersionedProposal`] sum type, enforcing the structural
//! invariant that the body, and execution payload/header where the fork
//! mandates one, must be present or the response is rejected before
//! signing.

use eth2::types::{GetBlockResponse, RawBeaconBlockBody};
use eth2::Error;
use types::{
    BeaconBlock, BeaconBlockBody, BeaconBlockBodyAltair, BeaconBlockBodyBellatrix,
    BeaconBlockBodyCapella, BeaconBlockBodyDeneb, BeaconBlockBodyElectra, BeaconBlockBodyPhase0,
    BlindedBeaconBlock, BlindedBeaconBlockBody, BlindedBeaconBlockBodyAltair,
    BlindedBeaconBlockBodyBellatrix, BlindedBeaconBlockBodyCapella, BlindedBeaconBlockBodyDeneb,
    BlindedBeaconBlockBodyElectra, BlindedBeaconBlockBodyPhase0, BlobsBundle, ForkName,
    VersionedProposal,
};

/// Converts a raw `get_block` response into a [`VersionedProposal`], or
/// `Error::MalformedResponse` if any field mandatory for the response's
/// fork/blinded-ness is missing. `Error::EmptyResponse` if there is no block
/// at all.
pub fn convert(raw: GetBlockResponse) -> Result<VersionedProposal, Error> {
    let fork = raw.version;
    let blinded = raw.execution_payload_blinded;
    let raw_block = raw.data.ok_or(Error::EmptyResponse)?;
    let raw_body = raw_block
        .body
        .ok_or_else(|| Error::MalformedResponse("missing block body".into()))?;

    if blinded {
        let body = build_blinded_body(fork, raw_body)?;
        Ok(VersionedProposal::Blinded {
            block: BlindedBeaconBlock {
                slot: raw_block.slot,
                proposer_index: raw_block.proposer_index,
                parent_root: raw_block.parent_root,
                state_root: raw_block.state_root,
                body,
            },
        })
    } else {
        let body = build_full_body(fork, raw_body)?;
        let blobs_bundle = raw.blobs_bundle.map(|b| BlobsBundle {
            kzg_proofs: b.kzg_proofs,
            blobs: b.blobs,
        });
        Ok(VersionedProposal::Full {
            block: BeaconBlock {
                slot: raw_block.slot,
                proposer_index: raw_block.proposer_index,
                parent_root: raw_block.parent_root,
                state_root: raw_block.state_root,
                body,
            },
            blobs_bundle,
        })
    }
}

fn execution_payload(raw: &RawBeaconBlockBody) -> Result<types::ExecutionPayload, Error> {
    raw.execution_payload
        .clone()
        .map(|p| types::ExecutionPayload {
            block_hash: p.block_hash,
            fee_recipient: p.fee_recipient,
            block_number: p.block_number,
            opaque: p.opaque,
        })
        .ok_or_else(|| Error::MalformedResponse("missing execution payload".into()))
}

fn blob_kzg_commitments(raw: &RawBeaconBlockBody) -> Result<Vec<types::KzgCommitment>, Error> {
    raw.blob_kzg_commitments
        .clone()
        .ok_or_else(|| Error::MalformedResponse("missing blob KZG commitments".into()))
}

fn build_full_body(fork: ForkName, raw: RawBeaconBlockBody) -> Result<BeaconBlockBody, Error> {
    let randao_reveal = raw.randao_reveal;
    let graffiti = raw.graffiti;
    let opaque = raw.opaque.clone();

    Ok(match fork {
        ForkName::Phase0 => BeaconBlockBody::Phase0(BeaconBlockBodyPhase0 {
            randao_reveal,
            graffiti,
            opaque,
        }),
        ForkName::Altair => BeaconBlockBody::Altair(BeaconBlockBodyAltair {
            randao_reveal,
            graffiti,
            opaque,
        }),
        ForkName::Bellatrix => BeaconBlockBody::Bellatrix(BeaconBlockBodyBellatrix {
            randao_reveal,
            graffiti,
            execution_payload: execution_payload(&raw)?,
            opaque,
        }),
        ForkName::Capella => BeaconBlockBody::Capella(BeaconBlockBodyCapella {
            randao_reveal,
            graffiti,
            execution_payload: execution_payload(&raw)?,
            opaque,
        }),
        ForkName::Deneb => BeaconBlockBody::Deneb(BeaconBlockBodyDeneb {
            randao_reveal,
            graffiti,
            execution_payload: execution_payload(&raw)?,
            blob_kzg_commitments: blob_kzg_commitments(&raw)?,
            opaque,
        }),
        ForkName::Electra => BeaconBlockBody::Electra(BeaconBlockBodyElectra {
            randao_reveal,
            graffiti,
            execution_payload: execution_payload(&raw)?,
            blob_kzg_commitments: blob_kzg_commitments(&raw)?,
            opaque,
        }),
    })
}

fn execution_payload_header(
    raw: &RawBeaconBlockBody,
) -> Result<types::ExecutionPayloadHeader, Error> {
    raw.execution_payload_header
        .clone()
        .map(|h| types::ExecutionPayloadHeader {
            block_hash: h.block_hash,
            fee_recipient: h.fee_recipient,
            block_number: h.block_number,
            transactions_root: h.transactions_root,
        })
        .ok_or_else(|| Error::MalformedResponse("missing execution payload header".into()))
}

fn build_blinded_body(
    fork: ForkName,
    raw: RawBeaconBlockBody,
) -> Result<BlindedBeaconBlockBody, Error> {
    let randao_reveal = raw.randao_reveal;
    let graffiti = raw.graffiti;
    let opaque = raw.opaque.clone();

    Ok(match fork {
        ForkName::Phase0 => BlindedBeaconBlockBody::Phase0(BlindedBeaconBlockBodyPhase0 {
            randao_reveal,
            graffiti,
            opaque,
        }),
        ForkName::Altair => BlindedBeaconBlockBody::Altair(BlindedBeaconBlockBodyAltair {
            randao_reveal,
            graffiti,
            opaque,
        }),
        ForkName::Bellatrix => BlindedBeaconBlockBody::Bellatrix(BlindedBeaconBlockBodyBellatrix {
            randao_reveal,
            graffiti,
            execution_payload_header: execution_payload_header(&raw)?,
            opaque,
        }),
        ForkName::Capella => BlindedBeaconBlockBody::Capella(BlindedBeaconBlockBodyCapella {
            randao_reveal,
            graffiti,
            execution_payload_header: execution_payload_header(&raw)?,
            opaque,
        }),
        // The blinded-Deneb path checks `Body.ExecutionPayloadHeader` but the
        // response shape is the same non-blinded-looking `DenebBlinded`
        // container either way; the blob KZG commitments are still required
        // on the body.
        ForkName::Deneb => BlindedBeaconBlockBody::Deneb(BlindedBeaconBlockBodyDeneb {
            randao_reveal,
            graffiti,
            execution_payload_header: execution_payload_header(&raw)?,
            blob_kzg_commitments: blob_kzg_commitments(&raw)?,
            opaque,
        }),
        ForkName::Electra => BlindedBeaconBlockBody::Electra(BlindedBeaconBlockBodyElectra {
            randao_reveal,
            graffiti,
            execution_payload_header: execution_payload_header(&raw)?,
            blob_kzg_commitments: blob_kzg_commitments(&raw)?,
            opaque,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth2::types::{RawBeaconBlock, RawBlobsBundle, RawExecutionPayload};
    use types::{Blob, Graffiti, Hash256, KzgCommitment, KzgProof, SignatureBytes, Slot};

    fn raw_deneb_body(with_payload: bool) -> RawBeaconBlockBody {
        RawBeaconBlockBody {
            randao_reveal: SignatureBytes::zero(),
            graffiti: Graffiti::zero(),
            execution_payload: with_payload.then(|| RawExecutionPayload {
                block_hash: Hash256::ZERO,
                fee_recipient: Default::default(),
                block_number: 1,
                opaque: vec![],
            }),
            execution_payload_header: None,
            blob_kzg_commitments: Some(vec![KzgCommitment([0u8; 48]); 3]),
            opaque: vec![],
        }
    }

    #[test]
    fn deneb_round_trip_preserves_blobs() {
        let raw = GetBlockResponse {
            version: ForkName::Deneb,
            execution_payload_blinded: false,
            data: Some(RawBeaconBlock {
                slot: Slot::new(100),
                proposer_index: 7,
                parent_root: Hash256::ZERO,
                state_root: Hash256::ZERO,
                body: Some(raw_deneb_body(true)),
            }),
            blobs_bundle: Some(RawBlobsBundle {
                kzg_proofs: vec![KzgProof([1u8; 48]); 3],
                blobs: vec![Blob(vec![0u8; 10]); 3],
            }),
        };

        let proposal = convert(raw).expect("structurally valid deneb response");
        match proposal {
            VersionedProposal::Full { block, blobs_bundle } => {
                assert_eq!(block.fork_name(), ForkName::Deneb);
                let bundle = blobs_bundle.expect("deneb carries a blobs bundle");
                assert_eq!(bundle.kzg_proofs.len(), 3);
                assert_eq!(bundle.blobs.len(), 3);
            }
            VersionedProposal::Blinded { .. } => panic!("expected a full proposal"),
        }
    }

    #[test]
    fn capella_missing_execution_payload_is_malformed() {
        let raw = GetBlockResponse {
            version: ForkName::Capella,
            execution_payload_blinded: false,
            data: Some(RawBeaconBlock {
                slot: Slot::new(10),
                proposer_index: 1,
                parent_root: Hash256::ZERO,
                state_root: Hash256::ZERO,
                body: Some(RawBeaconBlockBody {
                    randao_reveal: SignatureBytes::zero(),
                    graffiti: Graffiti::zero(),
                    execution_payload: None,
                    execution_payload_header: None,
                    blob_kzg_commitments: None,
                    opaque: vec![],
                }),
            }),
            blobs_bundle: None,
        };

        let err = convert(raw).expect_err("missing execution payload must be rejected");
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn phase0_requires_no_execution_payload() {
        let raw = GetBlockResponse {
            version: ForkName::Phase0,
            execution_payload_blinded: false,
            data: Some(RawBeaconBlock {
                slot: Slot::new(1),
                proposer_index: 0,
                parent_root: Hash256::ZERO,
                state_root: Hash256::ZERO,
                body: Some(RawBeaconBlockBody {
                    randao_reveal: SignatureBytes::zero(),
                    graffiti: Graffiti::zero(),
                    execution_payload: None,
                    execution_payload_header: None,
                    blob_kzg_commitments: None,
                    opaque: vec![],
                }),
            }),
            blobs_bundle: None,
        };

        let proposal = convert(raw).expect("phase0 has no execution payload invariant");
        assert_eq!(proposal.fork_name(), ForkName::Phase0);
    }
}
