use anyhow::{ensure, Result};
use helpers::{
    accessors::{
        get_current_epoch, get_randao_mix, get_total_active_balance, get_validator_churn_limit,
    },
    misc::compute_activation_exit_epoch,
    mutators::{decrease_balance, initiate_validator_exit},
    predicates::{
        is_active_validator, is_eligible_for_activation, is_eligible_for_activation_queue,
    },
};
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    consts::{
        EFFECTIVE_BALANCE_INCREMENT, EJECTION_BALANCE, EPOCHS_PER_HISTORICAL_VECTOR,
        EPOCHS_PER_SLASHINGS_VECTOR, HYSTERESIS_DOWNWARD_MULTIPLIER, HYSTERESIS_QUOTIENT,
        HYSTERESIS_UPWARD_MULTIPLIER, MAX_EFFECTIVE_BALANCE, PROPORTIONAL_SLASHING_MULTIPLIER,
        SLOTS_PER_EPOCH, SLOTS_PER_HISTORICAL_ROOT,
    },
    merkle::hash_pair,
};

use crate::error::Error;

pub fn process_epoch(state: &mut BeaconState) -> Result<()> {
    process_justification_and_finalization(state);
    process_registry_updates(state)?;
    process_slashings(state)?;
    process_effective_balance_updates(state);
    process_slashings_reset(state);
    process_randao_mixes_reset(state);
    process_historical_roots_update(state)?;

    Ok(())
}

fn process_justification_and_finalization(_state: &mut BeaconState) {
    // The consensus engine finalizes every block it decides; there are no
    // FFG checkpoints to track in this state.
}

fn process_registry_updates(state: &mut BeaconState) -> Result<()> {
    let current_epoch = get_current_epoch(state);

    // > Process activation eligibility and ejections
    let mut ejections = vec![];

    for (index, validator) in state.validators.iter_mut().enumerate() {
        if is_eligible_for_activation_queue(validator) {
            validator.activation_eligibility_epoch = current_epoch + 1;
        }

        if is_active_validator(validator, current_epoch)
            && validator.effective_balance <= EJECTION_BALANCE
        {
            ejections.push(index as u64);
        }
    }

    for index in ejections {
        initiate_validator_exit(state, index)?;
    }

    // > Queue validators eligible for activation and not yet dequeued
    let mut activation_queue = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| is_eligible_for_activation(state, validator))
        .map(|(index, validator)| (validator.activation_eligibility_epoch, index))
        .collect::<Vec<_>>();

    activation_queue.sort_unstable();

    // > Dequeue validators for activation up to churn limit
    let churn_limit = get_validator_churn_limit(state) as usize;
    let activation_epoch = compute_activation_exit_epoch(current_epoch);

    for (_, index) in activation_queue.into_iter().take(churn_limit) {
        state
            .validators
            .get_mut(index)
            .ok_or(Error::RegistryFull)?
            .activation_epoch = activation_epoch;
    }

    Ok(())
}

fn process_slashings(state: &mut BeaconState) -> Result<()> {
    let epoch = get_current_epoch(state);
    let total_balance = get_total_active_balance(state);

    let adjusted_total_slashing_balance = total_balance
        .min(state.total_slashing.saturating_mul(PROPORTIONAL_SLASHING_MULTIPLIER));

    let penalized = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.slashed
                && epoch + EPOCHS_PER_SLASHINGS_VECTOR / 2 == validator.withdrawable_epoch
        })
        .map(|(index, validator)| {
            let increment = EFFECTIVE_BALANCE_INCREMENT;
            let penalty_numerator =
                validator.effective_balance / increment * adjusted_total_slashing_balance;
            let penalty = penalty_numerator / total_balance * increment;
            (index as u64, penalty)
        })
        .collect::<Vec<_>>();

    for (index, penalty) in penalized {
        decrease_balance(state, index, penalty)?;
    }

    Ok(())
}

fn process_effective_balance_updates(state: &mut BeaconState) {
    let hysteresis_increment = EFFECTIVE_BALANCE_INCREMENT / HYSTERESIS_QUOTIENT;
    let downward_threshold = hysteresis_increment * HYSTERESIS_DOWNWARD_MULTIPLIER;
    let upward_threshold = hysteresis_increment * HYSTERESIS_UPWARD_MULTIPLIER;

    let balances = state.balances.to_vec();

    for (validator, balance) in state.validators.iter_mut().zip(balances) {
        if balance + downward_threshold < validator.effective_balance
            || validator.effective_balance + upward_threshold < balance
        {
            validator.effective_balance =
                MAX_EFFECTIVE_BALANCE.min(balance - balance % EFFECTIVE_BALANCE_INCREMENT);
        }
    }
}

fn process_slashings_reset(state: &mut BeaconState) {
    let next_epoch = get_current_epoch(state) + 1;
    let position = (next_epoch % EPOCHS_PER_SLASHINGS_VECTOR) as usize;

    let cleared = state.slashings[position];
    state.slashings[position] = 0;
    state.total_slashing = state.total_slashing.saturating_sub(cleared);
}

fn process_randao_mixes_reset(state: &mut BeaconState) {
    let current_epoch = get_current_epoch(state);
    let next_epoch = current_epoch + 1;

    state.randao_mixes[(next_epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize] =
        get_randao_mix(state, current_epoch);
}

fn process_historical_roots_update(state: &mut BeaconState) -> Result<()> {
    let next_epoch = get_current_epoch(state) + 1;

    if next_epoch % (SLOTS_PER_HISTORICAL_ROOT / SLOTS_PER_EPOCH) == 0 {
        let summary_root = hash_pair(
            state.block_roots.tree_hash_root(),
            state.state_roots.tree_hash_root(),
        );

        ensure!(
            state.historical_roots.push(summary_root).is_ok(),
            Error::HistoricalRootsFull,
        );
    }

    Ok(())
}
