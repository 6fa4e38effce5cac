use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// A protocol-revision discriminator drawn from a closed, ordered set.
///
/// Every later variant strictly supersedes earlier ones at their respective
/// fork-activation epoch. New forks are added at the end; the pipeline's
/// dispatch is exhaustive over this enum so an unhandled addition fails to
/// compile rather than falling through at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
}

impl ForkName {
    pub const fn list_all() -> [ForkName; 6] {
        [
            ForkName::Phase0,
            ForkName::Altair,
            ForkName::Bellatrix,
            ForkName::Capella,
            ForkName::Deneb,
            ForkName::Electra,
        ]
    }

    /// Bellatrix and later may carry an execution payload (or header, if blinded).
    pub fn execution_enabled(&self) -> bool {
        *self >= ForkName::Bellatrix
    }

    /// Deneb and later additionally carry KZG commitments/proofs and blob sidecars.
    pub fn deneb_enabled(&self) -> bool {
        *self >= ForkName::Deneb
    }
}

impl std::fmt::Display for ForkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ForkName::Phase0 => "phase0",
            ForkName::Altair => "altair",
            ForkName::Bellatrix => "bellatrix",
            ForkName::Capella => "capella",
            ForkName::Deneb => "deneb",
            ForkName::Electra => "electra",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ForkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phase0" => Ok(ForkName::Phase0),
            "altair" => Ok(ForkName::Altair),
            "bellatrix" => Ok(ForkName::Bellatrix),
            "capella" => Ok(ForkName::Capella),
            "deneb" => Ok(ForkName::Deneb),
            "electra" => Ok(ForkName::Electra),
            other => Err(format!("unknown fork name: {other}")),
        }
    }
}
