//! Core data types shared by the proposal pipeline, registration scheduler,
//! and discovery service: slots/epochs, the fork-version lattice, the
//! versioned-proposal sum type, and validator registrations.
//!
//! Wire formats (SSZ block bodies, the node-discovery v5 protocol) are
//! treated as opaque by design; this crate models only the fields the core's
//! own invariants touch.

mod beacon_block;
mod chain_spec;
mod execution_payload;
mod fork_name;
mod kzg;
mod primitives;
mod slot_epoch;
mod validator_registration;

pub use beacon_block::{
    BeaconBlock, BeaconBlockBody, BeaconBlockBodyAltair, BeaconBlockBodyBellatrix,
    BeaconBlockBodyCapella, BeaconBlockBodyDeneb, BeaconBlockBodyElectra, BeaconBlockBodyPhase0,
    BlindedBeaconBlock, BlindedBeaconBlockBody, BlindedBeaconBlockBodyAltair,
    BlindedBeaconBlockBodyBellatrix, BlindedBeaconBlockBodyCapella, BlindedBeaconBlockBodyDeneb,
    BlindedBeaconBlockBodyElectra, BlindedBeaconBlockBodyPhase0, BlobsBundle, SignedBeaconBlock,
    SignedBlindedBeaconBlock, SignedVersionedProposal, VersionedProposal,
};
pub use chain_spec::ChainSpec;
pub use execution_payload::{ExecutionPayload, ExecutionPayloadHeader};
pub use fork_name::ForkName;
pub use kzg::{Blob, KzgCommitment, KzgProof, BYTES_PER_BLOB};
pub use primitives::{ExecutionAddress, Graffiti, Hash256, PublicKeyBytes, SignatureBytes};
pub use slot_epoch::{Epoch, Slot};
pub use validator_registration::{SignedValidatorRegistrationData, ValidatorRegistrationData};
