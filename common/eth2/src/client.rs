use crate::types::{
    GetBlockResponse, ProposalPreparationData, ProposerDutiesResponse,
};
use crate::Error;
use sensitive_url::SensitiveUrl;
use std::future::Future;
use types::{
    Epoch, Graffiti, SignatureBytes, SignedValidatorRegistrationData, SignedVersionedProposal,
    Slot,
};

/// The beacon-node HTTP contract the proposal pipeline and registration
/// scheduler depend on. A single aggregate response per call; failover
/// across multiple beacon nodes is the concern of the caller
/// (`beacon_node_fallback::BeaconNodeFallback`), not of this trait.
pub trait BeaconNodeClient: Send + Sync {
    fn proposer_duties(
        &self,
        epoch: Epoch,
    ) -> impl Future<Output = Result<ProposerDutiesResponse, Error>> + Send;

    fn get_block(
        &self,
        slot: Slot,
        graffiti: Graffiti,
        randao_reveal: SignatureBytes,
    ) -> impl Future<Output = Result<GetBlockResponse, Error>> + Send;

    fn submit_block(
        &self,
        proposal: &SignedVersionedProposal,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn submit_blinded_block(
        &self,
        proposal: &SignedVersionedProposal,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn submit_validator_registrations(
        &self,
        registrations: &[SignedValidatorRegistrationData],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn submit_proposal_preparations(
        &self,
        preparations: &[ProposalPreparationData],
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// A [`BeaconNodeClient`] backed by a single beacon node's REST API.
#[derive(Clone)]
pub struct BeaconNodeHttpClient {
    http: reqwest::Client,
    server: SensitiveUrl,
}

impl BeaconNodeHttpClient {
    pub fn new(server: SensitiveUrl, http: reqwest::Client) -> Self {
        Self { http, server }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.full_to_string().trim_end_matches('/'), path)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(Error::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl BeaconNodeClient for BeaconNodeHttpClient {
    async fn proposer_duties(&self, epoch: Epoch) -> Result<ProposerDutiesResponse, Error> {
        let path = format!("/eth/v1/validator/duties/proposer/{}", epoch.as_u64());
        let response = self.http.get(self.url(&path)).send().await?;
        let response = Self::check_status(response).await?;
        response
            .json::<ProposerDutiesResponse>()
            .await
            .map_err(Error::from)
    }

    async fn get_block(
        &self,
        slot: Slot,
        graffiti: Graffiti,
        randao_reveal: SignatureBytes,
    ) -> Result<GetBlockResponse, Error> {
        let path = format!("/eth/v3/validator/blocks/{}", slot.as_u64());
        let response = self
            .http
            .get(self.url(&path))
            .query(&[
                ("randao_reveal", hex::encode(randao_reveal.as_bytes())),
                ("graffiti", hex::encode(graffiti.as_bytes())),
                ("skip_randao_verification", "false".to_string()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: GetBlockResponse = response.json().await?;
        if body.data.is_none() {
            return Err(Error::EmptyResponse);
        }
        Ok(body)
    }

    async fn submit_block(&self, proposal: &SignedVersionedProposal) -> Result<(), Error> {
        let body = submit_proposal_body(proposal)?;
        let response = self
            .http
            .post(self.url("/eth/v1/beacon/blocks"))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn submit_blinded_block(&self, proposal: &SignedVersionedProposal) -> Result<(), Error> {
        let body = submit_proposal_body(proposal)?;
        let response = self
            .http
            .post(self.url("/eth/v1/beacon/blinded_blocks"))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn submit_validator_registrations(
        &self,
        registrations: &[SignedValidatorRegistrationData],
    ) -> Result<(), Error> {
        let response = self
            .http
            .post(self.url("/eth/v1/validator/register_validator"))
            .json(registrations)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn submit_proposal_preparations(
        &self,
        preparations: &[ProposalPreparationData],
    ) -> Result<(), Error> {
        let response = self
            .http
            .post(self.url("/eth/v1/validator/prepare_beacon_proposer"))
            .json(preparations)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }
}

/// Builds the outgoing request body for a signed proposal.
///
/// `types::SignedVersionedProposal` deliberately carries no `Serialize` impl
/// — it is the core's clean, validated representation, not a wire format —
/// so the client walks it field-by-field here instead of deriving one.
fn submit_proposal_body(proposal: &SignedVersionedProposal) -> Result<serde_json::Value, Error> {
    use serde_json::json;

    let signature = |sig: &SignatureBytes| format!("0x{}", hex::encode(sig.as_bytes()));

    match proposal {
        SignedVersionedProposal::Full {
            signed_block,
            blobs_bundle,
        } => {
            let fork_name = signed_block.message.fork_name();
            let mut value = json!({
                "version": fork_name.to_string(),
                "message": {
                    "slot": signed_block.message.slot.as_u64(),
                    "proposer_index": signed_block.message.proposer_index,
                    "parent_root": signed_block.message.parent_root,
                    "state_root": signed_block.message.state_root,
                },
                "signature": signature(&signed_block.signature),
            });
            if let Some(bundle) = blobs_bundle {
                value["blobs_bundle"] = json!({
                    "kzg_proofs": bundle.kzg_proofs,
                    "blobs": bundle.blobs.iter().map(|b| hex::encode(&b.0)).collect::<Vec<_>>(),
                });
            }
            Ok(value)
        }
        SignedVersionedProposal::Blinded { signed_block } => {
            let fork_name = signed_block.message.fork_name();
            Ok(json!({
                "version": fork_name.to_string(),
                "message": {
                    "slot": signed_block.message.slot.as_u64(),
                    "proposer_index": signed_block.message.proposer_index,
                    "parent_root": signed_block.message.parent_root,
                    "state_root": signed_block.message.state_root,
                },
                "signature": signature(&signed_block.signature),
            }))
        }
    }
}
