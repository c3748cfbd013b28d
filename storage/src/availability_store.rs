use anyhow::Result;
use ssz::{Decode as _, Encode as _};
use types::{
    consts::MAX_BLOBS_PER_BLOCK,
    containers::{BeaconBlockBody, BlobSidecar, BlobSidecars},
    primitives::Slot,
};

use crate::{db::Database, error::Error};

/// Verified blob sidecars keyed by `(slot, sidecar index)`.
///
/// Sidecars only land here after `VerifySidecars` passed, so availability
/// is monotone for a slot until the pruner removes it.
pub struct AvailabilityStore {
    db: Database,
}

impl AvailabilityStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn persist(&self, sidecars: &BlobSidecars) -> Result<()> {
        let pairs = sidecars
            .iter()
            .map(|sidecar| {
                let key = sidecar_key(sidecar.beacon_block_header.slot, sidecar.index as u8);
                (key, sidecar.as_ssz_bytes())
            })
            .collect::<Vec<_>>();

        self.db.put_batch(pairs)
    }

    /// Whether every commitment in `body` is backed by a persisted,
    /// position-matching sidecar for `slot`.
    pub fn is_data_available(&self, slot: Slot, body: &BeaconBlockBody) -> Result<bool> {
        for (index, commitment) in body.blob_kzg_commitments.iter().enumerate() {
            let Some(bytes) = self.db.get(sidecar_key(slot, index as u8))? else {
                return Ok(false);
            };

            let sidecar = BlobSidecar::from_ssz_bytes(&bytes)
                .map_err(|_| Error::CorruptValue { what: "sidecar" })?;

            if sidecar.kzg_commitment != *commitment {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn get_blob_sidecars(&self, slot: Slot) -> Result<Vec<BlobSidecar>> {
        let mut sidecars = vec![];

        for index in 0..MAX_BLOBS_PER_BLOCK {
            let Some(bytes) = self.db.get(sidecar_key(slot, index as u8))? else {
                break;
            };

            let sidecar = BlobSidecar::from_ssz_bytes(&bytes)
                .map_err(|_| Error::CorruptValue { what: "sidecar" })?;

            sidecars.push(sidecar);
        }

        Ok(sidecars)
    }

    pub fn prune(&self, start_slot: Slot, end_slot: Slot) -> Result<()> {
        self.db
            .delete_range(sidecar_key(start_slot, 0)..sidecar_key(end_slot, 0))
    }
}

fn sidecar_key(slot: Slot, index: u8) -> Vec<u8> {
    let mut key = slot.to_be_bytes().to_vec();
    key.push(index);
    key
}
