use crate::primitives::{ExecutionAddress, Hash256};
use serde::{Deserialize, Serialize};

/// The execution-layer block carried by a Bellatrix-or-later proposal.
///
/// The body of the payload (transactions, withdrawals, ...) is treated as an
/// opaque blob by the pipeline; only the fields the pipeline's own invariants
/// touch are modeled explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    pub block_hash: Hash256,
    pub fee_recipient: ExecutionAddress,
    pub block_number: u64,
    /// Remaining SSZ-encoded fields (transactions, withdrawals, parent hash, ...),
    /// never inspected by the pipeline.
    pub opaque: Vec<u8>,
}

/// The header standing in for an [`ExecutionPayload`] in a blinded proposal,
/// allowing a third-party builder to reveal the full payload after signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadHeader {
    pub block_hash: Hash256,
    pub fee_recipient: ExecutionAddress,
    pub block_number: u64,
    pub transactions_root: Hash256,
}

impl From<&ExecutionPayload> for ExecutionPayloadHeader {
    fn from(payload: &ExecutionPayload) -> Self {
        Self {
            block_hash: payload.block_hash,
            fee_recipient: payload.fee_recipient,
            block_number: payload.block_number,
            transactions_root: Hash256::ZERO,
        }
    }
}
