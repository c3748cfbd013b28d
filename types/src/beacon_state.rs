use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{
    consts::{
        EpochsPerHistoricalVector, EpochsPerSlashingsVector, HistoricalRootsLimit,
        SlotsPerHistoricalRoot, ValidatorRegistryLimit,
    },
    containers::{BeaconBlockHeader, Eth1Data, ExecutionPayloadHeader, Fork, Validator},
    primitives::{DepositIndex, Gwei, Slot, ValidatorIndex, WithdrawalIndex, B256},
};

/// The consensus-layer state.
///
/// There is a single writer at any time: the state processor during a
/// transition. Speculative work (payload attributes, state-root
/// computation) clones the state and never writes back. Balances change
/// only through `helpers::mutators`; the three rings are indexed modulo
/// their lengths.
#[derive(Clone, PartialEq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BeaconState {
    // > Versioning
    pub fork: Fork,
    pub genesis_validators_root: B256,
    pub slot: Slot,

    // > History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<B256, SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<B256, SlotsPerHistoricalRoot>,
    pub historical_roots: VariableList<B256, HistoricalRootsLimit>,

    // > Eth1
    pub eth1_data: Eth1Data,
    pub eth1_deposit_index: DepositIndex,
    pub latest_execution_payload_header: ExecutionPayloadHeader,

    // > Registry
    pub validators: VariableList<Validator, ValidatorRegistryLimit>,
    pub balances: VariableList<Gwei, ValidatorRegistryLimit>,

    // > Randomness
    pub randao_mixes: FixedVector<B256, EpochsPerHistoricalVector>,

    // > Withdrawals
    pub next_withdrawal_index: WithdrawalIndex,
    pub next_withdrawal_validator_index: ValidatorIndex,

    // > Slashings
    pub slashings: FixedVector<Gwei, EpochsPerSlashingsVector>,
    pub total_slashing: Gwei,
}
