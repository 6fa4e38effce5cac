//! The Registration Scheduler: batches validator-to-relay registrations in a
//! single cache and flushes it to the configured beacon node(s) on a
//! deterministic per-operator cadence, so that many co-located validator
//! clients don't all submit on the same slot.

use beacon_node_fallback::{ApiTopic, BeaconNodeFallback};
use eth2::types::ProposalPreparationData;
use eth2::BeaconNodeClient;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use task_executor::TaskExecutor;
use tracing::{error, info, warn};
use types::{PublicKeyBytes, SignedValidatorRegistrationData, Slot};
use validator_store::ValidatorStore;

/// Registrations are submitted in batches of at most this many per request,
/// matching the relay-side limit assumed by the source system.
pub const MAX_BATCH_SIZE: usize = 500;

struct Cache {
    registrations: HashMap<PublicKeyBytes, SignedValidatorRegistrationData>,
    last_submission_slot: Option<Slot>,
}

struct Inner<S, C> {
    cache: Mutex<Cache>,
    validator_store: Arc<S>,
    beacon_nodes: Arc<BeaconNodeFallback<C>>,
    executor: TaskExecutor,
    operator_id: u64,
    slots_per_epoch: u64,
}

/// Accepts registrations as they're produced and flushes the accumulated set
/// on the cadence determined by [`should_flush`]. Each flush also resubmits
/// fee-recipient proposal preparations for the same validators, since both
/// are derived from the same registration cache and share a cadence in the
/// source system.
pub struct RegistrationService<S, C> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for RegistrationService<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S, C> Deref for RegistrationService<S, C> {
    type Target = Inner<S, C>;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<S: ValidatorStore + 'static, C: BeaconNodeClient + 'static> RegistrationService<S, C> {
    pub fn new(
        validator_store: Arc<S>,
        beacon_nodes: Arc<BeaconNodeFallback<C>>,
        executor: TaskExecutor,
        operator_id: u64,
        slots_per_epoch: u64,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: Mutex::new(Cache {
                    registrations: HashMap::new(),
                    last_submission_slot: None,
                }),
                validator_store,
                beacon_nodes,
                executor,
                operator_id,
                slots_per_epoch,
            }),
        }
    }

    /// Replaces the cached registration for `registration`'s validator, if
    /// any. Never touches the network; the next `tick` decides whether to
    /// flush.
    pub fn submit_registration(&self, registration: SignedValidatorRegistrationData) {
        let pubkey = registration.message.pubkey;
        self.cache.lock().registrations.insert(pubkey, registration);
    }

    /// Called once per slot by the caller's ticker. Flushes the cached
    /// registrations to the beacon node(s) if `slot` satisfies the flush
    /// predicate, then records `slot` as the new last-submission slot.
    ///
    /// The flush predicate guarantees every operator flushes at least once
    /// every two epochs even if its designated slot-in-epoch is missed (e.g.
    /// the client was offline), while spreading different operators'
    /// submissions across different slots within an epoch so they don't all
    /// hit the relay at once.
    pub fn tick(&self, slot: Slot) {
        let last_submission_slot = self.cache.lock().last_submission_slot;

        if !should_flush(
            slot,
            last_submission_slot,
            self.operator_id,
            self.slots_per_epoch,
        ) {
            return;
        }

        let batch: Vec<SignedValidatorRegistrationData> = {
            let mut cache = self.cache.lock();
            cache.last_submission_slot = Some(slot);
            cache.registrations.values().cloned().collect()
        };

        if batch.is_empty() {
            return;
        }

        let service = self.clone();
        self.executor.spawn_ignoring_error(
            async move { service.flush_batch(batch).await },
            "registration_flush",
        );
    }

    async fn flush_batch(self, batch: Vec<SignedValidatorRegistrationData>) -> Result<(), ()> {
        let total = batch.len();
        let mut failed_chunks = 0usize;

        for chunk in batch.chunks(MAX_BATCH_SIZE) {
            let result = self
                .beacon_nodes
                .request(ApiTopic::Registrations, |node| {
                    node.submit_validator_registrations(chunk)
                })
                .await;

            if let Err(e) = result {
                warn!(error = %e, chunk_size = chunk.len(), "registration chunk submission failed");
                failed_chunks += 1;
            }
        }

        if failed_chunks > 0 {
            error!(
                total,
                failed_chunks, "registration flush had failing chunks"
            );
            return Err(());
        }

        info!(total, "flushed validator registrations");
        self.flush_proposal_preparations(&batch).await;
        Ok(())
    }

    /// Resubmits fee-recipient proposal preparations for every validator in
    /// `batch`. Best-effort: a failure here does not fail the registration
    /// flush, since the beacon node falls back to its own default recipient
    /// until the next successful submission.
    async fn flush_proposal_preparations(&self, batch: &[SignedValidatorRegistrationData]) {
        let preparations: Vec<ProposalPreparationData> = batch
            .iter()
            .filter_map(|reg| {
                let validator_index = self.validator_store.validator_index(&reg.message.pubkey)?;
                Some(ProposalPreparationData {
                    validator_index,
                    fee_recipient: reg.message.fee_recipient,
                })
            })
            .collect();

        if preparations.is_empty() {
            return;
        }

        let result = self
            .beacon_nodes
            .request(ApiTopic::ProposalPreparations, |node| {
                node.submit_proposal_preparations(&preparations)
            })
            .await;

        if let Err(e) = result {
            warn!(error = %e, "proposal preparation submission failed");
        }
    }
}

/// `Δ ≥ S ∧ slot mod S == op_mod`, or the two-epoch catch-up `Δ ≥ 2S + op_mod`
/// — whichever comes first — where `S` is `slots_per_epoch` and `op_mod` is
/// `operator_id mod S`.
fn should_flush(
    slot: Slot,
    last_submission_slot: Option<Slot>,
    operator_id: u64,
    slots_per_epoch: u64,
) -> bool {
    let op_mod = operator_id % slots_per_epoch;
    let delta = match last_submission_slot {
        None => return true,
        Some(last) => slot.as_u64().saturating_sub(last.as_u64()),
    };

    let on_cadence = delta >= slots_per_epoch && slot.as_u64() % slots_per_epoch == op_mod;
    let catch_up = delta >= 2 * slots_per_epoch + op_mod;

    on_cadence || catch_up
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushes_on_first_tick_regardless_of_slot() {
        assert!(should_flush(Slot::new(3), None, 5, 32));
    }

    #[test]
    fn flushes_at_the_operator_designated_slot() {
        // slots_per_epoch=32, operator_id=5 => op_mod=5; slot 37 = epoch*32+5.
        assert!(should_flush(Slot::new(37), Some(Slot::new(4)), 5, 32));
    }

    #[test]
    fn does_not_flush_off_cadence_slot_within_the_guard_window() {
        // slot 101 is not a multiple-of-32-plus-5 slot, and delta (97) is
        // under the two-epoch (69) catch-up only if computed from a recent
        // last-submission; with last=4, delta=97 >= 2*32+5=69, so this must
        // flush via the catch-up path instead of staying silent.
        assert!(should_flush(Slot::new(101), Some(Slot::new(4)), 5, 32));
    }

    #[test]
    fn stays_silent_before_either_threshold_is_reached() {
        // last submission at slot 37 (on-cadence), next tick at slot 40: not
        // on this operator's slot, and delta (3) is far under the catch-up.
        assert!(!should_flush(Slot::new(40), Some(Slot::new(37)), 5, 32));
    }

    #[test]
    fn catch_up_fires_even_off_cadence_after_two_epochs() {
        // last=37, op_mod=5. 2*32+5=69 => slot 106 not on cadence
        // (106 % 32 = 10 != 5) but delta=69 triggers the catch-up guard.
        assert!(should_flush(Slot::new(106), Some(Slot::new(37)), 5, 32));
        assert!(!should_flush(Slot::new(105), Some(Slot::new(37)), 5, 32));
    }

    #[test]
    fn batches_into_chunks_of_at_most_max_batch_size() {
        let pubkey = |b: u8| {
            let mut bytes = [0u8; 48];
            bytes[0] = b;
            PublicKeyBytes::from(bytes)
        };
        let registrations: Vec<SignedValidatorRegistrationData> = (0..1250u32)
            .map(|i| SignedValidatorRegistrationData {
                message: types::ValidatorRegistrationData {
                    fee_recipient: Default::default(),
                    gas_limit: 30_000_000,
                    timestamp: 0,
                    pubkey: pubkey((i % 255) as u8),
                },
                signature: types::SignatureBytes::zero(),
            })
            .collect();

        let chunks: Vec<_> = registrations.chunks(MAX_BATCH_SIZE).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 250);
    }

    struct StubOracle;

    impl bls::SigningOracle for StubOracle {
        async fn sign(
            &self,
            _pubkey: PublicKeyBytes,
            _signing_root: types::Hash256,
        ) -> Result<types::SignatureBytes, bls::Error> {
            Ok(types::SignatureBytes::zero())
        }
    }

    struct RecordingNode {
        preparations_submitted: std::sync::Mutex<Vec<ProposalPreparationData>>,
    }

    impl eth2::BeaconNodeClient for RecordingNode {
        async fn proposer_duties(
            &self,
            _epoch: types::Epoch,
        ) -> Result<eth2::types::ProposerDutiesResponse, eth2::Error> {
            unimplemented!("not exercised by this test")
        }

        async fn get_block(
            &self,
            _slot: Slot,
            _graffiti: types::Graffiti,
            _randao_reveal: types::SignatureBytes,
        ) -> Result<eth2::types::GetBlockResponse, eth2::Error> {
            unimplemented!("not exercised by this test")
        }

        async fn submit_block(
            &self,
            _proposal: &types::SignedVersionedProposal,
        ) -> Result<(), eth2::Error> {
            unimplemented!("not exercised by this test")
        }

        async fn submit_blinded_block(
            &self,
            _proposal: &types::SignedVersionedProposal,
        ) -> Result<(), eth2::Error> {
            unimplemented!("not exercised by this test")
        }

        async fn submit_validator_registrations(
            &self,
            _registrations: &[SignedValidatorRegistrationData],
        ) -> Result<(), eth2::Error> {
            Ok(())
        }

        async fn submit_proposal_preparations(
            &self,
            preparations: &[ProposalPreparationData],
        ) -> Result<(), eth2::Error> {
            self.preparations_submitted
                .lock()
                .unwrap()
                .extend_from_slice(preparations);
            Ok(())
        }
    }

    fn pubkey(byte: u8) -> PublicKeyBytes {
        let mut bytes = [0u8; 48];
        bytes[0] = byte;
        PublicKeyBytes::from(bytes)
    }

    #[tokio::test]
    async fn flush_resubmits_proposal_preparations_for_known_validators() {
        let store = std::sync::Arc::new(validator_store::LocalValidatorStore::new(
            [pubkey(1)],
            std::sync::Arc::new(StubOracle),
        ));
        store.set_validator_index(pubkey(1), 7);

        let node = std::sync::Arc::new(RecordingNode {
            preparations_submitted: std::sync::Mutex::new(Vec::new()),
        });
        let beacon_nodes = Arc::new(BeaconNodeFallback::new(vec![node.clone()]));
        let (executor, _signal) = task_executor::TaskExecutor::new(tokio::runtime::Handle::current());

        let service = RegistrationService::new(store, beacon_nodes, executor, 0, 32);
        let batch = vec![SignedValidatorRegistrationData {
            message: types::ValidatorRegistrationData {
                fee_recipient: Default::default(),
                gas_limit: 30_000_000,
                timestamp: 0,
                pubkey: pubkey(1),
            },
            signature: types::SignatureBytes::zero(),
        }];

        service.flush_batch(batch).await.unwrap();

        let submitted = node.preparations_submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].validator_index, 7);
    }
}
