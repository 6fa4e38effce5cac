use sensitive_url::SensitiveUrl;
use std::time::Duration;
use types::Slot;

/// The structured configuration value the core accepts in place of parsing
/// its own CLI flags: beacon-node endpoints and slot timing for the
/// proposal pipeline and registration scheduler, plus the discovery
/// service's own subset in [`discovery::Config`].
#[derive(Debug, Clone)]
pub struct Config {
    pub beacon_nodes: Vec<SensitiveUrl>,
    pub operator_id: u64,
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    pub genesis_slot: Slot,
    pub genesis_time: Duration,
    pub discovery: discovery::Config,
}
