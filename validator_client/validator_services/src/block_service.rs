//! The Beacon Proposal Pipeline: fetches proposer duties, requests a
//! candidate block for each assigned slot, validates and signs it, and
//! submits it back to the beacon node — dispatching on fork version and the
//! blinded flag at every step.

use crate::convert;
use crate::signing_root::{block_signing_root, randao_reveal_signing_root};
use beacon_node_fallback::{ApiTopic, BeaconNodeFallback};
use eth2::types::ProposerDuty;
use eth2::{BeaconNodeClient, Error as Eth2Error};
use slot_clock::SlotClock;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use task_executor::TaskExecutor;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{error, info, warn};
use types::{ChainSpec, Epoch, Graffiti, PublicKeyBytes, Slot, VersionedProposal};
use validator_store::{DoppelgangerStatus, ValidatorStore};

pub struct BlockServiceBuilder<S, T, C> {
    validator_store: Option<Arc<S>>,
    slot_clock: Option<T>,
    beacon_nodes: Option<Arc<BeaconNodeFallback<C>>>,
    executor: Option<TaskExecutor>,
    spec: Option<ChainSpec>,
}

impl<S, T, C> Default for BlockServiceBuilder<S, T, C> {
    fn default() -> Self {
        Self {
            validator_store: None,
            slot_clock: None,
            beacon_nodes: None,
            executor: None,
            spec: None,
        }
    }
}

impl<S: ValidatorStore + 'static, T: SlotClock + 'static, C: BeaconNodeClient + 'static>
    BlockServiceBuilder<S, T, C>
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validator_store(mut self, store: Arc<S>) -> Self {
        self.validator_store = Some(store);
        self
    }

    pub fn slot_clock(mut self, slot_clock: T) -> Self {
        self.slot_clock = Some(slot_clock);
        self
    }

    pub fn beacon_nodes(mut self, beacon_nodes: Arc<BeaconNodeFallback<C>>) -> Self {
        self.beacon_nodes = Some(beacon_nodes);
        self
    }

    pub fn executor(mut self, executor: TaskExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn spec(mut self, spec: ChainSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn build(self) -> Result<BlockService<S, T, C>, String> {
        Ok(BlockService {
            inner: Arc::new(Inner {
                validator_store: self
                    .validator_store
                    .ok_or("Cannot build BlockService without validator_store")?,
                slot_clock: self
                    .slot_clock
                    .ok_or("Cannot build BlockService without slot_clock")?,
                beacon_nodes: self
                    .beacon_nodes
                    .ok_or("Cannot build BlockService without beacon_nodes")?,
                executor: self
                    .executor
                    .ok_or("Cannot build BlockService without executor")?,
                spec: self.spec.ok_or("Cannot build BlockService without spec")?,
                duties: RwLock::new(HashMap::new()),
            }),
        })
    }
}

struct Inner<S, T, C> {
    validator_store: Arc<S>,
    slot_clock: T,
    beacon_nodes: Arc<BeaconNodeFallback<C>>,
    executor: TaskExecutor,
    spec: ChainSpec,
    duties: RwLock<HashMap<Epoch, Vec<ProposerDuty>>>,
}

/// Drives proposer-duty discovery and block production/submission.
pub struct BlockService<S, T, C> {
    inner: Arc<Inner<S, T, C>>,
}

impl<S, T, C> Clone for BlockService<S, T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, T, C> Deref for BlockService<S, T, C> {
    type Target = Inner<S, T, C>;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<S: ValidatorStore + 'static, T: SlotClock + 'static, C: BeaconNodeClient + 'static>
    BlockService<S, T, C>
{
    /// Starts the slot-ticker-driven loop: on every slot boundary, refresh
    /// duties for the current and next epoch and spawn a proposal attempt
    /// for each locally-managed validator assigned to propose this slot.
    pub fn start_update_service(self) -> Result<(), String> {
        let slot_duration = self.slot_clock.slot_duration();
        let executor = self.executor.clone();

        let interval_fut = async move {
            loop {
                match self.slot_clock.duration_to_next_slot() {
                    Some(duration) => {
                        sleep(duration).await;
                        self.spawn_block_proposal_tasks();
                    }
                    None => {
                        error!("failed to read slot clock");
                        sleep(slot_duration).await;
                    }
                }
            }
        };

        executor.spawn(interval_fut, "block_service");
        Ok(())
    }

    fn spawn_block_proposal_tasks(&self) {
        let service = self.clone();
        self.executor
            .spawn_ignoring_error(service.produce_and_submit_blocks(), "block_proposal");
    }

    async fn duties_for_epoch(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>, Eth2Error> {
        if let Some(duties) = self.duties.read().await.get(&epoch) {
            return Ok(duties.clone());
        }

        let indices: Vec<u64> = self
            .validator_store
            .voting_pubkeys::<Vec<_>, _>(DoppelgangerStatus::ignored)
            .into_iter()
            .filter_map(|pubkey| self.validator_store.validator_index(&pubkey))
            .collect();

        if indices.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .beacon_nodes
            .first_success(|node| node.proposer_duties(epoch))
            .await
            .map_err(|e| Eth2Error::TransportError(e.to_string()))?;
        let duties = response.data.ok_or(Eth2Error::EmptyResponse)?;

        let local: Vec<ProposerDuty> = duties
            .into_iter()
            .filter(|duty| indices.contains(&duty.validator_index))
            .collect();

        let mut cache = self.duties.write().await;
        cache.insert(epoch, local.clone());
        cache.retain(|&e, _| e >= epoch.saturating_sub(1u64));

        Ok(local)
    }

    async fn produce_and_submit_blocks(self) -> Result<(), ()> {
        let slot = self.slot_clock.now().ok_or_else(|| {
            error!("failed to read slot clock");
        })?;
        let epoch = slot.epoch(self.spec.slots_per_epoch);

        let duties = self.duties_for_epoch(epoch).await.map_err(|e| {
            error!(error = %e, "failed to fetch proposer duties");
        })?;

        for duty in duties.into_iter().filter(|d| d.slot == slot) {
            let service = self.clone();
            self.executor.spawn_ignoring_error(
                async move { service.publish_block(slot, duty.pubkey).await },
                "publish_block",
            );
        }

        Ok(())
    }

    /// Requests, validates, signs, and submits a block for `slot` on behalf
    /// of `pubkey`. Dispatches on the fork/blinded-ness of the beacon node's
    /// response exhaustively via the closed `VersionedProposal` sum type.
    async fn publish_block(&self, slot: Slot, pubkey: PublicKeyBytes) -> Result<(), String> {
        let epoch = slot.epoch(self.spec.slots_per_epoch);
        let randao_reveal = self
            .validator_store
            .sign(pubkey, randao_reveal_signing_root(epoch))
            .await
            .map_err(|e| format!("randao reveal signing failed: {e}"))?;

        let raw = self
            .beacon_nodes
            .first_success(|node| node.get_block(slot, Graffiti::zero(), randao_reveal))
            .await
            .map_err(|e| format!("failed to fetch block from beacon node: {e}"))?;

        let blinded = raw.execution_payload_blinded;
        let proposal = convert::convert(raw).map_err(|e| {
            warn!(slot = slot.as_u64(), validator = ?pubkey, error = %e, "malformed block response");
            format!("{e}")
        })?;

        let (parent_root, proposer_index) = match &proposal {
            VersionedProposal::Full { block, .. } => (block.parent_root, block.proposer_index),
            VersionedProposal::Blinded { block } => (block.parent_root, block.proposer_index),
        };
        let signing_root = block_signing_root(slot, proposer_index, parent_root);
        let signature = self
            .validator_store
            .sign(pubkey, signing_root)
            .await
            .map_err(|e| format!("block signing failed: {e}"))?;

        let signed = match proposal {
            VersionedProposal::Full {
                block,
                blobs_bundle,
            } => types::SignedVersionedProposal::Full {
                signed_block: types::SignedBeaconBlock {
                    message: block,
                    signature,
                },
                blobs_bundle,
            },
            VersionedProposal::Blinded { block } => types::SignedVersionedProposal::Blinded {
                signed_block: types::SignedBlindedBeaconBlock {
                    message: block,
                    signature,
                },
            },
        };

        if blinded {
            self.beacon_nodes
                .request(ApiTopic::BlindedBlocks, |node| {
                    futures_submit_blinded(node, &signed)
                })
                .await
                .map_err(|e| format!("failed to submit blinded block: {e}"))?;
        } else {
            self.beacon_nodes
                .request(ApiTopic::Blocks, |node| futures_submit_full(node, &signed))
                .await
                .map_err(|e| format!("failed to submit block: {e}"))?;
        }

        info!(
            slot = slot.as_u64(),
            validator = ?pubkey,
            fork = %signed.fork_name(),
            "published block"
        );
        Ok(())
    }
}

/// Tiny indirection so `beacon_nodes.request` can be called with a single
/// closure whose branches both capture `signed` by reference without the
/// compiler needing two distinct future types to unify.
async fn futures_submit_full<C: BeaconNodeClient>(
    node: &C,
    signed: &types::SignedVersionedProposal,
) -> Result<(), Eth2Error> {
    node.submit_block(signed).await
}

async fn futures_submit_blinded<C: BeaconNodeClient>(
    node: &C,
    signed: &types::SignedVersionedProposal,
) -> Result<(), Eth2Error> {
    node.submit_blinded_block(signed).await
}
