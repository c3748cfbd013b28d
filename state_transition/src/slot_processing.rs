use anyhow::{ensure, Result};
use helpers::misc::is_epoch_start;
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState, consts::SLOTS_PER_HISTORICAL_ROOT, primitives::Slot,
};

use crate::{epoch_processing, error::Error};

pub fn process_slot(state: &mut BeaconState) {
    let slot = state.slot;

    // > Cache state root
    let previous_state_root = state.tree_hash_root();
    state.state_roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize] = previous_state_root;

    // > Cache latest block header state root
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    // > Cache block root
    let previous_block_root = state.latest_block_header.tree_hash_root();
    state.block_roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize] = previous_block_root;
}

pub fn process_slots(state: &mut BeaconState, target: Slot) -> Result<()> {
    // The test for equality is intentional. A transition that would rewind
    // the state must fail here rather than while verifying the state root.
    ensure!(
        state.slot <= target,
        Error::SlotsCannotRewind {
            state_slot: state.slot,
            target,
        },
    );

    while state.slot < target {
        process_slot(state);

        if is_epoch_start(state.slot + 1) {
            epoch_processing::process_epoch(state)?;
        }

        state.slot += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use types::primitives::B256;

    use super::*;

    #[test]
    fn advancing_empty_slots_caches_roots() {
        let mut state = BeaconState {
            slot: 10,
            ..BeaconState::default()
        };

        process_slots(&mut state, 13).unwrap();

        assert_eq!(state.slot, 13);
        assert!(state.validators.is_empty());

        let header_root = state.latest_block_header.tree_hash_root();

        for slot in 10..13 {
            assert_eq!(state.block_roots[slot], header_root);
            assert_ne!(state.state_roots[slot], B256::ZERO);
        }

        assert_eq!(state.block_roots[13], B256::ZERO);
    }

    #[test]
    fn the_header_state_root_is_filled_once() {
        let mut state = BeaconState {
            slot: 1,
            ..BeaconState::default()
        };

        assert!(state.latest_block_header.state_root.is_zero());

        process_slots(&mut state, 2).unwrap();

        assert!(!state.latest_block_header.state_root.is_zero());
    }

    #[test]
    fn rewinding_fails() {
        let mut state = BeaconState {
            slot: 10,
            ..BeaconState::default()
        };

        process_slots(&mut state, 9).unwrap_err();
    }

    #[test]
    fn advancing_to_the_current_slot_is_a_no_op() {
        let mut state = BeaconState {
            slot: 10,
            ..BeaconState::default()
        };

        process_slots(&mut state, 10).unwrap();

        assert_eq!(state.slot, 10);
        assert_eq!(state.block_roots[10], B256::ZERO);
    }
}
