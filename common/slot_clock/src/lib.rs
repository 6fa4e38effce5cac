//! The slot ticker contract shared by the proposal pipeline and registration
//! scheduler: both are driven by "time until the next slot boundary" rather
//! than reading the wall clock directly, so tests can substitute
//! [`ManualSlotClock`] for real time.

use std::time::Duration;
use types::Slot;

mod manual_slot_clock;
mod system_time_slot_clock;

pub use manual_slot_clock::ManualSlotClock;
pub use system_time_slot_clock::SystemTimeSlotClock;

/// Translates wall-clock time into slots, tolerant of clock drift.
///
/// Implementations never panic on a `now` prior to genesis; they return
/// `None` and let the caller decide how to wait.
pub trait SlotClock: Send + Sync + Sized + Clone {
    /// Creates a new slot clock where the first slot is `genesis_slot`, the
    /// time of genesis is `genesis_duration` (since the unix epoch), and each
    /// slot is `slot_duration` long.
    fn new(genesis_slot: Slot, genesis_duration: Duration, slot_duration: Duration) -> Self;

    /// Returns the slot at this present time.
    fn now(&self) -> Option<Slot>;

    /// Returns `true` if the current time is prior to the genesis time.
    fn is_prior_to_genesis(&self) -> Option<bool>;

    /// Returns the present time as a `Duration` since the unix epoch.
    fn now_duration(&self) -> Option<Duration>;

    /// Returns the slot containing the given `duration` since the unix epoch.
    fn slot_of(&self, duration: Duration) -> Option<Slot>;

    /// Returns the duration from `now` until `slot` starts.
    fn duration_to_slot(&self, slot: Slot) -> Option<Duration>;

    /// Returns the duration until the start of the next slot.
    fn duration_to_next_slot(&self) -> Option<Duration>;

    /// Returns the duration until the start of the next epoch.
    fn duration_to_next_epoch(&self, slots_per_epoch: u64) -> Option<Duration>;

    /// Returns the duration of each slot.
    fn slot_duration(&self) -> Duration;

    /// Returns the first slot this clock is aware of.
    fn genesis_slot(&self) -> Slot;

    /// Returns the duration from the unix epoch until genesis.
    fn genesis_duration(&self) -> Duration;

    /// Returns the duration since the start of `slot` until `now`, given
    /// `now` falls within `slot`.
    fn start_of(&self, slot: Slot) -> Option<Duration>;

    /// Returns the present slot, allowing for `tolerance` of clock drift into
    /// the future (a response arriving just before the boundary is treated as
    /// belonging to the next slot).
    fn now_with_future_tolerance(&self, tolerance: Duration) -> Option<Slot> {
        self.now_duration()
            .and_then(|now| self.slot_of(now + tolerance))
    }

    /// As [`Self::now_with_future_tolerance`], but tolerant of drift into the past.
    fn now_with_past_tolerance(&self, tolerance: Duration) -> Option<Slot> {
        self.now_duration()
            .and_then(|now| self.slot_of(now.saturating_sub(tolerance)))
    }
}
