use anyhow::Result;
use helpers::accessors::get_randao_mix;
use types::{
    beacon_state::BeaconState,
    containers::{BeaconBlockHeader, BlobSidecar, Validator},
    primitives::{Epoch, Gwei, Slot, ValidatorIndex, B256},
};

use crate::{
    availability_store::AvailabilityStore, block_store::BlockStore, db::Database,
    deposit_store::DepositStore, state_store::StateStore,
};

/// Facade over the four stores. The Node-API read surface delegates to the
/// query methods at the bottom.
pub struct StorageBackend {
    blocks: BlockStore,
    deposits: DepositStore,
    availability: AvailabilityStore,
    states: StateStore,
}

impl StorageBackend {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            blocks: BlockStore::new(Database::in_memory()),
            deposits: DepositStore::new(Database::in_memory()),
            availability: AvailabilityStore::new(Database::in_memory()),
            states: StateStore::new(),
        }
    }

    #[must_use]
    pub const fn block_store(&self) -> &BlockStore {
        &self.blocks
    }

    #[must_use]
    pub const fn deposit_store(&self) -> &DepositStore {
        &self.deposits
    }

    #[must_use]
    pub const fn availability_store(&self) -> &AvailabilityStore {
        &self.availability
    }

    #[must_use]
    pub const fn state_store(&self) -> &StateStore {
        &self.states
    }

    pub fn block_header_at_slot(&self, slot: Slot) -> Result<Option<BeaconBlockHeader>> {
        Ok(self.blocks.get(slot)?.map(|block| block.to_header()))
    }

    pub fn validator_by_id(&self, index: ValidatorIndex) -> Result<Option<Validator>> {
        let state = self.states.state_from_context()?;
        Ok(state.validators.get(index as usize).copied())
    }

    pub fn randao_at_epoch(&self, epoch: Epoch) -> Result<B256> {
        let state = self.states.state_from_context()?;
        Ok(get_randao_mix(&state, epoch))
    }

    pub fn blob_sidecars_at_slot(&self, slot: Slot) -> Result<Vec<BlobSidecar>> {
        self.availability.get_blob_sidecars(slot)
    }

    pub fn state_at_slot(&self, slot: Slot) -> Result<Option<BeaconState>> {
        let state = self.states.state_from_context()?;
        Ok((state.slot == slot).then_some(state))
    }

    pub fn block_rewards_at_slot(&self, slot: Slot) -> Result<Option<BlockRewards>> {
        // Stake only moves through deposits, withdrawals, and slashing
        // burns; proposing itself pays nothing.
        Ok(self.blocks.get(slot)?.map(|block| BlockRewards {
            proposer_index: block.proposer_index,
            total: 0,
        }))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockRewards {
    pub proposer_index: ValidatorIndex,
    pub total: Gwei,
}
