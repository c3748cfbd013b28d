use serde::{Deserialize, Serialize};

use crate::{
    consts::SLOTS_PER_EPOCH,
    containers::Fork,
    primitives::{Epoch, Slot, Version},
};

/// Fork tags for the phases this chain can run in.
///
/// Behavior diverges between phases in exactly three places: the Engine API
/// method version, blob commitment processing, and sidecar verification.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Capella,
    Deneb,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub capella_fork_version: Version,
    pub deneb_fork_version: Version,
    pub deneb_fork_epoch: Epoch,
    pub seconds_per_slot: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capella_fork_version: Version::new([1, 0, 0, 0]),
            deneb_fork_version: Version::new([4, 0, 0, 0]),
            deneb_fork_epoch: 0,
            seconds_per_slot: 12,
        }
    }
}

impl Config {
    #[must_use]
    pub fn phase_at_epoch(&self, epoch: Epoch) -> Phase {
        if epoch >= self.deneb_fork_epoch {
            Phase::Deneb
        } else {
            Phase::Capella
        }
    }

    #[must_use]
    pub fn phase_at_slot(&self, slot: Slot) -> Phase {
        self.phase_at_epoch(slot / SLOTS_PER_EPOCH)
    }

    #[must_use]
    pub const fn version(&self, phase: Phase) -> Version {
        match phase {
            Phase::Capella => self.capella_fork_version,
            Phase::Deneb => self.deneb_fork_version,
        }
    }

    #[must_use]
    pub fn active_fork_version_for_slot(&self, slot: Slot) -> Version {
        self.version(self.phase_at_slot(slot))
    }

    #[must_use]
    pub fn fork_at_epoch(&self, epoch: Epoch) -> Fork {
        let current_phase = self.phase_at_epoch(epoch);

        let (previous_version, epoch) = match current_phase {
            Phase::Capella => (self.capella_fork_version, 0),
            Phase::Deneb => {
                if self.deneb_fork_epoch == 0 {
                    (self.deneb_fork_version, 0)
                } else {
                    (self.capella_fork_version, self.deneb_fork_epoch)
                }
            }
        };

        Fork {
            previous_version,
            current_version: self.version(current_phase),
            epoch,
        }
    }
}
