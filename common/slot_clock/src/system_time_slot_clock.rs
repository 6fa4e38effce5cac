use super::SlotClock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use types::Slot;

/// Determines the present slot from the operating system's wall clock.
#[derive(Clone)]
pub struct SystemTimeSlotClock {
    genesis_slot: Slot,
    genesis_duration: Duration,
    slot_duration: Duration,
}

impl SystemTimeSlotClock {
    fn now_since_unix_epoch() -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time is before the unix epoch")
    }
}

impl SlotClock for SystemTimeSlotClock {
    fn new(genesis_slot: Slot, genesis_duration: Duration, slot_duration: Duration) -> Self {
        if slot_duration.as_millis() == 0 {
            panic!("SystemTimeSlotClock cannot have a < 1ms slot duration");
        }
        Self {
            genesis_slot,
            genesis_duration,
            slot_duration,
        }
    }

    fn now(&self) -> Option<Slot> {
        self.slot_of(Self::now_since_unix_epoch())
    }

    fn is_prior_to_genesis(&self) -> Option<bool> {
        Some(Self::now_since_unix_epoch() < self.genesis_duration)
    }

    fn now_duration(&self) -> Option<Duration> {
        Some(Self::now_since_unix_epoch())
    }

    fn slot_of(&self, now: Duration) -> Option<Slot> {
        let since_genesis = now.checked_sub(self.genesis_duration)?;
        let slot = Slot::from((since_genesis.as_millis() / self.slot_duration.as_millis()) as u64);
        Some(slot + self.genesis_slot)
    }

    fn duration_to_slot(&self, slot: Slot) -> Option<Duration> {
        self.start_of(slot)?
            .checked_sub(Self::now_since_unix_epoch())
    }

    fn duration_to_next_slot(&self) -> Option<Duration> {
        let now = Self::now_since_unix_epoch();
        if now < self.genesis_duration {
            return self.genesis_duration.checked_sub(now);
        }
        self.start_of(self.slot_of(now)? + 1)?.checked_sub(now)
    }

    fn duration_to_next_epoch(&self, slots_per_epoch: u64) -> Option<Duration> {
        let now = Self::now_since_unix_epoch();
        if now < self.genesis_duration {
            return self.genesis_duration.checked_sub(now);
        }
        let next_epoch_start = (self.slot_of(now)?.epoch(slots_per_epoch) + 1).start_slot(slots_per_epoch);
        self.start_of(next_epoch_start)?.checked_sub(now)
    }

    fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    fn genesis_slot(&self) -> Slot {
        self.genesis_slot
    }

    fn genesis_duration(&self) -> Duration {
        self.genesis_duration
    }

    fn start_of(&self, slot: Slot) -> Option<Duration> {
        let slots_since_genesis: u32 = slot.as_u64().checked_sub(self.genesis_slot.as_u64())?.try_into().ok()?;
        self.genesis_duration
            .checked_add(self.slot_duration.checked_mul(slots_since_genesis)?)
    }
}
