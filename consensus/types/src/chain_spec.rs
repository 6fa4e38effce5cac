use crate::{Epoch, ForkName};
use std::collections::HashMap;

/// The subset of the consensus protocol's configuration the core needs: how
/// slots map to epochs, and at which epoch each fork activates.
#[derive(Debug, Clone)]
pub struct ChainSpec {
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    fork_epochs: HashMap<ForkName, Epoch>,
}

impl ChainSpec {
    /// A mainnet-shaped spec with every fork activated at genesis, suitable for
    /// networks that have already completed all known upgrades.
    pub fn mainnet() -> Self {
        let mut fork_epochs = HashMap::new();
        for fork in ForkName::list_all() {
            fork_epochs.insert(fork, Epoch::new(0));
        }
        Self {
            slots_per_epoch: 32,
            seconds_per_slot: 12,
            fork_epochs,
        }
    }

    pub fn set_fork_epoch(&mut self, fork: ForkName, epoch: Epoch) {
        self.fork_epochs.insert(fork, epoch);
    }

    pub fn fork_epoch(&self, fork: ForkName) -> Option<Epoch> {
        self.fork_epochs.get(&fork).copied()
    }

    /// The highest fork whose activation epoch has passed by `epoch`, or
    /// `Phase0` if no fork schedule is configured.
    pub fn fork_name_at_epoch(&self, epoch: Epoch) -> ForkName {
        ForkName::list_all()
            .into_iter()
            .rev()
            .find(|fork| self.fork_epochs.get(fork).is_some_and(|act| epoch >= *act))
            .unwrap_or(ForkName::Phase0)
    }

    pub fn fork_name_at_slot(&self, slot: crate::Slot) -> ForkName {
        self.fork_name_at_epoch(slot.epoch(self.slots_per_epoch))
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}
