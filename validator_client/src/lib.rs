//! Wires the three subsystems — the Beacon Proposal Pipeline, the
//! Registration Scheduler, and the Discovery Service — into one runnable
//! core, sharing a single [`TaskExecutor`] and beacon-node fallback set.

mod config;

pub use config::Config;

use beacon_node_fallback::BeaconNodeFallback;
use discovery::DiscoveryService;
use eth2::BeaconNodeClient;
use slot_clock::SlotClock;
use std::sync::Arc;
use task_executor::TaskExecutor;
use tokio::time::sleep;
use tracing::{debug, error};
use types::ChainSpec;
use validator_services::{BlockService, BlockServiceBuilder, RegistrationService};
use validator_store::ValidatorStore;

/// Owns the three subsystems for the lifetime of the process. Dropping it
/// (or its [`TaskExecutor`]'s shutdown signal firing) stops every spawned
/// task.
pub struct ValidatorClient<S, T, C> {
    block_service: BlockService<S, T, C>,
    registration_service: RegistrationService<S, C>,
    discovery: DiscoveryService,
    slot_clock: T,
    executor: TaskExecutor,
}

impl<S, T, C> ValidatorClient<S, T, C>
where
    S: ValidatorStore + 'static,
    T: SlotClock + 'static,
    C: BeaconNodeClient + 'static,
{
    /// Builds the core from a [`Config`] and its already-constructed
    /// dependencies. `spec` carries the fork schedule the proposal pipeline
    /// needs to pick a signing domain; `beacon_nodes` is shared by the
    /// proposal pipeline and the registration scheduler so both failover
    /// over the same endpoint set.
    pub fn new(
        config: Config,
        validator_store: Arc<S>,
        slot_clock: T,
        beacon_nodes: Arc<BeaconNodeFallback<C>>,
        spec: ChainSpec,
        executor: TaskExecutor,
    ) -> Result<Self, String> {
        logging::init_tracing();

        let block_service = BlockServiceBuilder::new()
            .validator_store(validator_store.clone())
            .slot_clock(slot_clock.clone())
            .beacon_nodes(beacon_nodes.clone())
            .executor(executor.clone())
            .spec(spec)
            .build()?;

        let registration_service = RegistrationService::new(
            validator_store,
            beacon_nodes,
            executor.clone(),
            config.operator_id,
            config.slots_per_epoch,
        );

        let discovery = DiscoveryService::new(config.discovery, executor.clone())
            .map_err(|e| format!("failed to construct discovery service: {e}"))?;

        Ok(Self {
            block_service,
            registration_service,
            discovery,
            slot_clock,
            executor,
        })
    }

    /// Binds the discovery socket, starts the proposal pipeline's slot
    /// ticker, starts the random-walk discovery loop, and starts the
    /// registration scheduler's slot ticker. Returns once every subsystem
    /// has been spawned; the subsystems themselves run until the executor's
    /// shutdown signal fires.
    pub async fn start(self) -> Result<(), String> {
        self.discovery
            .start()
            .await
            .map_err(|e| format!("discovery service failed to bind: {e}"))?;

        self.discovery.bootstrap(|event| {
            debug!(addr = %event.address, "discovered peer");
        });

        // Spawn the registration ticker (borrows `self`) before consuming
        // `self.block_service` below, since a partial move of one field
        // would otherwise make the whole struct unborrowable.
        self.spawn_registration_ticker();
        self.block_service.start_update_service()?;

        Ok(())
    }

    /// Accepts a registration for caching; the registration scheduler's own
    /// ticker decides when to actually submit it.
    pub fn submit_registration(&self, registration: types::SignedValidatorRegistrationData) {
        self.registration_service.submit_registration(registration);
    }

    fn spawn_registration_ticker(&self) {
        let registration_service = self.registration_service.clone();
        let slot_clock = self.slot_clock.clone();
        let slot_duration = slot_clock.slot_duration();

        let ticker = async move {
            loop {
                match slot_clock.duration_to_next_slot() {
                    Some(duration) => {
                        sleep(duration).await;
                        if let Some(slot) = slot_clock.now() {
                            registration_service.tick(slot);
                        }
                    }
                    None => {
                        error!("failed to read slot clock");
                        sleep(slot_duration).await;
                    }
                }
            }
        };

        self.executor.spawn(ticker, "registration_service");
    }
}
