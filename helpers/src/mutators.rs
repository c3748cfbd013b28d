use core::cmp::Ordering;

use types::{
    beacon_state::BeaconState,
    consts::{
        EPOCHS_PER_SLASHINGS_VECTOR, FAR_FUTURE_EPOCH, MIN_SLASHING_PENALTY_QUOTIENT,
        MIN_VALIDATOR_WITHDRAWABILITY_DELAY,
    },
    primitives::{Gwei, ValidatorIndex},
};

use crate::{
    accessors::{get_current_epoch, get_validator_churn_limit},
    error::Error,
    misc::compute_activation_exit_epoch,
};

pub fn balance_mut(
    state: &mut BeaconState,
    index: ValidatorIndex,
) -> Result<&mut Gwei, Error> {
    state
        .balances
        .get_mut(index as usize)
        .ok_or(Error::ValidatorIndexOutOfBounds { index })
}

pub fn increase_balance(
    state: &mut BeaconState,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let balance = balance_mut(state, index)?;

    *balance = balance.checked_add(delta).ok_or(Error::BalanceOverflow)?;

    Ok(())
}

pub fn decrease_balance(
    state: &mut BeaconState,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let balance = balance_mut(state, index)?;

    *balance = balance.saturating_sub(delta);

    Ok(())
}

pub fn initiate_validator_exit(
    state: &mut BeaconState,
    index: ValidatorIndex,
) -> Result<(), Error> {
    // > Return if validator already initiated exit
    if state
        .validators
        .get(index as usize)
        .ok_or(Error::ValidatorIndexOutOfBounds { index })?
        .exit_epoch
        != FAR_FUTURE_EPOCH
    {
        return Ok(());
    }

    // > Compute exit queue epoch
    let mut exit_queue_epoch = compute_activation_exit_epoch(get_current_epoch(state));
    let mut exit_queue_churn = 0;

    for validator in state.validators.iter() {
        let exit_epoch = validator.exit_epoch;

        if exit_epoch == FAR_FUTURE_EPOCH {
            continue;
        }

        match exit_epoch.cmp(&exit_queue_epoch) {
            Ordering::Less => {}
            Ordering::Equal => exit_queue_churn += 1,
            Ordering::Greater => {
                exit_queue_epoch = exit_epoch;
                exit_queue_churn = 1;
            }
        }
    }

    if exit_queue_churn >= get_validator_churn_limit(state) {
        exit_queue_epoch += 1;
    }

    // > Set validator exit epoch and withdrawable epoch
    let validator = state
        .validators
        .get_mut(index as usize)
        .ok_or(Error::ValidatorIndexOutOfBounds { index })?;

    validator.exit_epoch = exit_queue_epoch;

    validator.withdrawable_epoch = exit_queue_epoch
        .checked_add(MIN_VALIDATOR_WITHDRAWABILITY_DELAY)
        .ok_or(Error::EpochOverflow)?;

    Ok(())
}

pub fn slash_validator(state: &mut BeaconState, index: ValidatorIndex) -> Result<(), Error> {
    initiate_validator_exit(state, index)?;

    let epoch = get_current_epoch(state);

    let validator = state
        .validators
        .get_mut(index as usize)
        .ok_or(Error::ValidatorIndexOutOfBounds { index })?;

    validator.slashed = true;
    validator.withdrawable_epoch = validator
        .withdrawable_epoch
        .max(epoch.checked_add(EPOCHS_PER_SLASHINGS_VECTOR).ok_or(Error::EpochOverflow)?);

    let effective_balance = validator.effective_balance;

    state.slashings[(epoch % EPOCHS_PER_SLASHINGS_VECTOR) as usize] += effective_balance;
    state.total_slashing += effective_balance;

    decrease_balance(state, index, effective_balance / MIN_SLASHING_PENALTY_QUOTIENT)
}
