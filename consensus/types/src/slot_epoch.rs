use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

macro_rules! impl_u64_wrapper {
    ($name:ident) => {
        #[derive(
            Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            pub fn saturating_add(&self, other: impl Into<Self>) -> Self {
                Self(self.0.saturating_add(other.into().0))
            }

            pub fn saturating_sub(&self, other: impl Into<Self>) -> Self {
                Self(self.0.saturating_sub(other.into().0))
            }

            pub fn checked_sub(&self, other: impl Into<Self>) -> Option<Self> {
                self.0.checked_sub(other.into().0).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(n)
            }
        }

        impl From<$name> for u64 {
            fn from(n: $name) -> Self {
                n.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Add<u64> for $name {
            type Output = Self;
            fn add(self, rhs: u64) -> Self {
                Self(self.0 + rhs)
            }
        }

        impl Sub<u64> for $name {
            type Output = Self;
            fn sub(self, rhs: u64) -> Self {
                Self(self.0 - rhs)
            }
        }
    };
}

/// The fundamental time unit of the consensus protocol: a monotonically increasing,
/// fixed-duration window in which at most one block may be proposed.
impl_u64_wrapper!(Slot);
/// A span of `slots_per_epoch` consecutive slots.
impl_u64_wrapper!(Epoch);

impl Slot {
    /// Returns the epoch containing this slot under the given `slots_per_epoch`.
    pub fn epoch(&self, slots_per_epoch: u64) -> Epoch {
        Epoch::new(self.as_u64() / slots_per_epoch)
    }

    /// Returns `self mod slots_per_epoch`, i.e. the position of this slot within its epoch.
    pub fn position_in_epoch(&self, slots_per_epoch: u64) -> u64 {
        self.as_u64() % slots_per_epoch
    }
}

impl Epoch {
    pub fn start_slot(&self, slots_per_epoch: u64) -> Slot {
        Slot::new(self.as_u64() * slots_per_epoch)
    }
}
