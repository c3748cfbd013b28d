use anyhow::Result;
use ssz::{Decode as _, Encode as _};
use tree_hash::TreeHash as _;
use types::{
    containers::BeaconBlock,
    primitives::{Slot, B256},
};

use crate::{db::Database, error::Error};

const ROOT_TO_SLOT_SUFFIX: &[u8] = b"r2s";
const EXECUTION_TO_SLOT_SUFFIX: &[u8] = b"e2s";

/// Finalized blocks by slot, with secondary indices from block root and
/// execution block number back to the slot. Index writes share the batch
/// with the primary write.
pub struct BlockStore {
    db: Database,
}

impl BlockStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn set(&self, block: &BeaconBlock) -> Result<()> {
        let slot_bytes = slot_key(block.slot);
        let root = block.tree_hash_root();
        let execution_number = block.body.execution_payload.block_number;

        self.db.put_batch([
            (slot_bytes.to_vec(), block.as_ssz_bytes()),
            (root_key(root), slot_bytes.to_vec()),
            (execution_key(execution_number), slot_bytes.to_vec()),
        ])
    }

    pub fn get(&self, slot: Slot) -> Result<Option<BeaconBlock>> {
        self.db
            .get(slot_key(slot))?
            .map(|bytes| {
                BeaconBlock::from_ssz_bytes(&bytes)
                    .map_err(|_| Error::CorruptValue { what: "block" }.into())
            })
            .transpose()
    }

    pub fn get_slot_by_root(&self, root: B256) -> Result<Option<Slot>> {
        self.get_slot_at(root_key(root))
    }

    pub fn get_slot_by_execution_number(&self, number: u64) -> Result<Option<Slot>> {
        self.get_slot_at(execution_key(number))
    }

    pub fn prune(&self, start_slot: Slot, end_slot: Slot) -> Result<()> {
        for slot in start_slot..end_slot {
            let Some(block) = self.get(slot)? else {
                continue;
            };

            self.db.delete(root_key(block.tree_hash_root()))?;
            self.db
                .delete(execution_key(block.body.execution_payload.block_number))?;
        }

        self.db
            .delete_range(slot_key(start_slot).to_vec()..slot_key(end_slot).to_vec())
    }

    fn get_slot_at(&self, key: Vec<u8>) -> Result<Option<Slot>> {
        self.db
            .get(key)?
            .map(|bytes| {
                let bytes = <[u8; 8]>::try_from(bytes.as_slice())
                    .map_err(|_| Error::CorruptValue { what: "slot index" })?;
                Ok(Slot::from_be_bytes(bytes))
            })
            .transpose()
    }
}

fn slot_key(slot: Slot) -> [u8; 8] {
    slot.to_be_bytes()
}

fn root_key(root: B256) -> Vec<u8> {
    let mut key = root.as_slice().to_vec();
    key.extend_from_slice(ROOT_TO_SLOT_SUFFIX);
    key
}

fn execution_key(number: u64) -> Vec<u8> {
    let mut key = number.to_be_bytes().to_vec();
    key.extend_from_slice(EXECUTION_TO_SLOT_SUFFIX);
    key
}
