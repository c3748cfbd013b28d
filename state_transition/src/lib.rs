pub mod block_processing;
pub mod context;
pub mod epoch_processing;
pub mod error;
pub mod genesis;
pub mod slot_processing;

use anyhow::{ensure, Result};
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    config::Config,
    containers::BeaconBlock,
    nonstandard::{ValidatorUpdate, ValidatorUpdates},
    primitives::Gwei,
};

pub use crate::{context::ProcessingContext, error::Error};

/// Applies `block` to `state` and reports the stake deltas the consensus
/// engine needs. Deterministic: no clocks, no randomness, index-ordered
/// traversal throughout.
pub fn state_transition(
    config: &Config,
    context: ProcessingContext,
    state: &mut BeaconState,
    block: &BeaconBlock,
) -> Result<ValidatorUpdates> {
    let pre_transition_balances = effective_balances(state);

    // > Process slots (including those with no blocks) since block
    slot_processing::process_slots(state, block.slot)?;

    // > Process block
    block_processing::process_block(config, context, state, block)?;

    // > Verify state root
    if !context.skip_validate_result {
        let computed = state.tree_hash_root();

        ensure!(
            block.state_root == computed,
            Error::StateRootMismatch {
                computed,
                in_block: block.state_root,
            },
        );
    }

    Ok(diff_validator_updates(state, &pre_transition_balances))
}

fn effective_balances(state: &BeaconState) -> Vec<Gwei> {
    state
        .validators
        .iter()
        .map(|validator| validator.effective_balance)
        .collect()
}

/// Every validator whose effective balance differs from the snapshot,
/// including ones created since, exactly once and index-ordered.
#[must_use]
pub fn diff_validator_updates(state: &BeaconState, pre: &[Gwei]) -> ValidatorUpdates {
    state
        .validators
        .iter()
        .enumerate()
        .filter(|(index, validator)| {
            pre.get(*index) != Some(&validator.effective_balance)
        })
        .map(|(_, validator)| ValidatorUpdate {
            pubkey: validator.pubkey,
            effective_balance: validator.effective_balance,
        })
        .collect()
}

/// The full validator set as updates. Used once, at genesis.
#[must_use]
pub fn all_validator_updates(state: &BeaconState) -> ValidatorUpdates {
    diff_validator_updates(state, &[])
}

#[cfg(test)]
mod tests {
    use helpers::accessors::{
        get_beacon_proposer_index, get_randao_mix, latest_block_root,
    };
    use types::{
        consts::MAX_EFFECTIVE_BALANCE,
        containers::{BeaconBlockBody, ExecutionPayload, ExecutionPayloadHeader},
        primitives::{ExecutionBlockHash, B256},
    };

    use crate::genesis::initialize_premined_beacon_state_from_eth1;

    use super::*;

    fn genesis_state(config: &Config) -> BeaconState {
        let deposits = (0..2)
            .map(|index| crate::genesis::tests::signed_deposit(config, index as u8 + 1, index))
            .collect::<Vec<_>>();

        let payload_header = ExecutionPayloadHeader {
            block_hash: ExecutionBlockHash::repeat_byte(0xcc),
            ..ExecutionPayloadHeader::default()
        };

        initialize_premined_beacon_state_from_eth1(
            config,
            &deposits,
            &payload_header,
            config.deneb_fork_version,
        )
        .expect("the genesis deposits are valid")
    }

    fn valid_block(config: &Config, state: &BeaconState) -> BeaconBlock {
        let mut advanced = state.clone();
        slot_processing::process_slots(&mut advanced, 1).unwrap();

        let payload = ExecutionPayload {
            parent_hash: advanced.latest_execution_payload_header.block_hash,
            prev_randao: get_randao_mix(&advanced, 0),
            timestamp: advanced.latest_execution_payload_header.timestamp + 12,
            block_hash: ExecutionBlockHash::repeat_byte(0xdd),
            block_number: 1,
            ..ExecutionPayload::default()
        };

        let mut block = BeaconBlock {
            slot: 1,
            proposer_index: get_beacon_proposer_index(&advanced, 1).unwrap(),
            parent_root: latest_block_root(&advanced),
            state_root: B256::ZERO,
            body: BeaconBlockBody {
                eth1_data: advanced.eth1_data,
                execution_payload: payload,
                ..BeaconBlockBody::default()
            },
        };

        let context = ProcessingContext {
            skip_validate_randao: true,
            skip_validate_result: true,
            ..ProcessingContext::default()
        };

        let mut speculative = state.clone();
        state_transition(config, context, &mut speculative, &block).unwrap();
        block.state_root = speculative.tree_hash_root();

        block
    }

    #[test]
    fn a_valid_state_root_passes_and_transitions_match() {
        let config = Config::default();
        let state = genesis_state(&config);
        let block = valid_block(&config, &state);

        let context = ProcessingContext {
            skip_validate_randao: true,
            ..ProcessingContext::default()
        };

        let mut node_a = state.clone();
        let mut node_b = state;

        let updates_a = state_transition(&config, context, &mut node_a, &block).unwrap();
        let updates_b = state_transition(&config, context, &mut node_b, &block).unwrap();

        assert_eq!(node_a.tree_hash_root(), node_b.tree_hash_root());
        assert_eq!(node_a.tree_hash_root(), block.state_root);
        assert_eq!(updates_a, updates_b);
        assert!(updates_a.is_empty());
    }

    #[test]
    fn a_wrong_state_root_is_fatal() {
        let config = Config::default();
        let state = genesis_state(&config);

        let mut block = valid_block(&config, &state);
        block.state_root = B256::repeat_byte(0x66);

        let context = ProcessingContext {
            skip_validate_randao: true,
            ..ProcessingContext::default()
        };

        let mut working = state;
        let error = state_transition(&config, context, &mut working, &block)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert!(matches!(error, Error::StateRootMismatch { .. }));
    }

    #[test]
    fn genesis_updates_cover_the_full_set() {
        let config = Config::default();
        let state = genesis_state(&config);

        let updates = all_validator_updates(&state);

        assert_eq!(updates.len(), 2);
        assert!(updates
            .iter()
            .all(|update| update.effective_balance == MAX_EFFECTIVE_BALANCE));
    }
}
