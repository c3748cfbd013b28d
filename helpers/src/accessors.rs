use ethereum_hashing::hash_fixed;
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    consts::{
        CHURN_LIMIT_QUOTIENT, DOMAIN_BEACON_PROPOSER, EFFECTIVE_BALANCE_INCREMENT,
        EPOCHS_PER_HISTORICAL_VECTOR, MAX_EFFECTIVE_BALANCE, MIN_PER_EPOCH_CHURN_LIMIT,
        SLOTS_PER_HISTORICAL_ROOT,
    },
    containers::Validator,
    primitives::{Epoch, Gwei, PublicKeyBytes, Slot, ValidatorIndex, B256},
};

use crate::{error::Error, misc::compute_epoch_at_slot, predicates::is_active_validator};

const MAX_RANDOM_BYTE: u64 = u8::MAX as u64;

#[must_use]
pub fn get_current_epoch(state: &BeaconState) -> Epoch {
    compute_epoch_at_slot(state.slot)
}

#[must_use]
pub fn get_randao_mix(state: &BeaconState, epoch: Epoch) -> B256 {
    state.randao_mixes[(epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize]
}

/// Root of the block applied at `slot`, as long as it is still in the ring.
pub fn get_block_root_at_slot(state: &BeaconState, slot: Slot) -> Result<B256, Error> {
    if slot >= state.slot || state.slot > slot + SLOTS_PER_HISTORICAL_ROOT {
        return Err(Error::SlotOutOfRange {
            slot,
            state_slot: state.slot,
        });
    }

    Ok(state.block_roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize])
}

/// Root of the latest applied block header. During slot processing the
/// header's `state_root` has already been filled in, so this matches what
/// the proposer of the next block commits to as `parent_root`.
#[must_use]
pub fn latest_block_root(state: &BeaconState) -> B256 {
    state.latest_block_header.tree_hash_root()
}

pub fn validator(state: &BeaconState, index: ValidatorIndex) -> Result<&Validator, Error> {
    state
        .validators
        .get(index as usize)
        .ok_or(Error::ValidatorIndexOutOfBounds { index })
}

pub fn balance(state: &BeaconState, index: ValidatorIndex) -> Result<Gwei, Error> {
    state
        .balances
        .get(index as usize)
        .copied()
        .ok_or(Error::ValidatorIndexOutOfBounds { index })
}

#[must_use]
pub fn validator_index_by_pubkey(
    state: &BeaconState,
    pubkey: PublicKeyBytes,
) -> Option<ValidatorIndex> {
    state
        .validators
        .iter()
        .position(|validator| validator.pubkey == pubkey)
        .map(|index| index as ValidatorIndex)
}

#[must_use]
pub fn get_active_validator_indices(state: &BeaconState, epoch: Epoch) -> Vec<ValidatorIndex> {
    state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| is_active_validator(validator, epoch))
        .map(|(index, _)| index as ValidatorIndex)
        .collect()
}

#[must_use]
pub fn get_total_active_balance(state: &BeaconState) -> Gwei {
    let epoch = get_current_epoch(state);

    let sum = state
        .validators
        .iter()
        .filter(|validator| is_active_validator(validator, epoch))
        .map(|validator| validator.effective_balance)
        .sum();

    EFFECTIVE_BALANCE_INCREMENT.max(sum)
}

#[must_use]
pub fn get_validator_churn_limit(state: &BeaconState) -> u64 {
    let active = get_active_validator_indices(state, get_current_epoch(state)).len() as u64;
    MIN_PER_EPOCH_CHURN_LIMIT.max(active / CHURN_LIMIT_QUOTIENT)
}

/// The deterministic, stake-weighted proposer expectation for `slot`.
///
/// Candidates are drawn from the index-ordered active set with an
/// effective-balance acceptance test, seeded by the epoch's RANDAO mix and
/// the slot. Leader election itself belongs to the consensus engine; this
/// only has to be reproducible on every node.
pub fn get_beacon_proposer_index(state: &BeaconState, slot: Slot) -> Result<ValidatorIndex, Error> {
    let epoch = compute_epoch_at_slot(slot);
    let indices = get_active_validator_indices(state, epoch);

    if indices.is_empty() {
        return Err(Error::NoActiveValidators);
    }

    let mix = get_randao_mix(state, epoch);

    let mut preimage = Vec::with_capacity(44);
    preimage.extend_from_slice(DOMAIN_BEACON_PROPOSER.as_slice());
    preimage.extend_from_slice(mix.as_slice());
    preimage.extend_from_slice(&slot.to_le_bytes());
    let seed = hash_fixed(&preimage);

    let total = indices.len() as u64;

    for round in 0u64..total.saturating_mul(MAX_RANDOM_BYTE).max(MAX_RANDOM_BYTE) {
        let mut round_preimage = Vec::with_capacity(40);
        round_preimage.extend_from_slice(&seed);
        round_preimage.extend_from_slice(&round.to_le_bytes());
        let random = hash_fixed(&round_preimage);

        let offset = u64::from_le_bytes(
            random[..8]
                .try_into()
                .expect("slicing eight bytes out of a 32-byte hash cannot fail"),
        );

        let candidate = indices[(offset % total) as usize];
        let random_byte = u64::from(random[8]);
        let effective_balance = validator(state, candidate)?.effective_balance;

        if effective_balance * MAX_RANDOM_BYTE >= MAX_EFFECTIVE_BALANCE * random_byte {
            return Ok(candidate);
        }
    }

    Err(Error::UnableToSelectProposer)
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use types::consts::FAR_FUTURE_EPOCH;

    use super::*;

    fn active_validator(pubkey_byte: u8) -> Validator {
        Validator {
            pubkey: PublicKeyBytes::from([pubkey_byte; 48]),
            effective_balance: MAX_EFFECTIVE_BALANCE,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        }
    }

    fn state_with_validators(count: u8) -> BeaconState {
        let validators = (0..count).map(active_validator).collect::<Vec<_>>();
        let balances = vec![MAX_EFFECTIVE_BALANCE; count as usize];

        BeaconState {
            slot: 1,
            validators: VariableList::new(validators)
                .expect("validator count is below the limit"),
            balances: VariableList::new(balances).expect("balance count is below the limit"),
            ..BeaconState::default()
        }
    }

    #[test]
    fn pubkey_lookup_finds_the_right_index() {
        let state = state_with_validators(4);

        assert_eq!(
            validator_index_by_pubkey(&state, PublicKeyBytes::from([2; 48])),
            Some(2),
        );
        assert_eq!(
            validator_index_by_pubkey(&state, PublicKeyBytes::from([9; 48])),
            None,
        );
    }

    #[test]
    fn proposer_selection_is_deterministic_and_in_range() {
        let state = state_with_validators(7);

        let first = get_beacon_proposer_index(&state, 5).unwrap();
        let second = get_beacon_proposer_index(&state, 5).unwrap();

        assert_eq!(first, second);
        assert!(first < 7);
    }

    #[test]
    fn proposer_selection_fails_without_active_validators() {
        let state = BeaconState {
            slot: 1,
            ..BeaconState::default()
        };

        assert_eq!(
            get_beacon_proposer_index(&state, 1),
            Err(Error::NoActiveValidators),
        );
    }

    #[test]
    fn block_root_lookup_respects_the_ring_bounds() {
        let mut state = state_with_validators(1);
        state.slot = 10;
        state.block_roots[9] = B256::repeat_byte(9);

        assert_eq!(get_block_root_at_slot(&state, 9).unwrap(), B256::repeat_byte(9));
        assert!(get_block_root_at_slot(&state, 10).is_err());
    }
}
