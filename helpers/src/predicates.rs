use types::{
    beacon_state::BeaconState,
    consts::{ETH1_ADDRESS_WITHDRAWAL_PREFIX, FAR_FUTURE_EPOCH, MAX_EFFECTIVE_BALANCE},
    containers::Validator,
    primitives::{Epoch, Gwei},
};

use crate::accessors::get_current_epoch;

#[must_use]
pub fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

#[must_use]
pub fn is_slashable_validator(validator: &Validator, epoch: Epoch) -> bool {
    !validator.slashed
        && validator.activation_epoch <= epoch
        && epoch < validator.withdrawable_epoch
}

#[must_use]
pub fn is_eligible_for_activation_queue(validator: &Validator) -> bool {
    validator.activation_eligibility_epoch == FAR_FUTURE_EPOCH
        && validator.effective_balance == MAX_EFFECTIVE_BALANCE
}

// Finality is instant under the BFT engine, so eligibility only waits for
// the epoch that recorded it.
#[must_use]
pub fn is_eligible_for_activation(state: &BeaconState, validator: &Validator) -> bool {
    validator.activation_eligibility_epoch <= get_current_epoch(state)
        && validator.activation_epoch == FAR_FUTURE_EPOCH
}

#[must_use]
pub fn has_eth1_withdrawal_credential(validator: &Validator) -> bool {
    validator.withdrawal_credentials[0] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
}

#[must_use]
pub fn is_fully_withdrawable_validator(
    validator: &Validator,
    balance: Gwei,
    epoch: Epoch,
) -> bool {
    has_eth1_withdrawal_credential(validator)
        && validator.withdrawable_epoch <= epoch
        && balance > 0
}

#[must_use]
pub fn is_partially_withdrawable_validator(validator: &Validator, balance: Gwei) -> bool {
    has_eth1_withdrawal_credential(validator)
        && validator.effective_balance == MAX_EFFECTIVE_BALANCE
        && balance > MAX_EFFECTIVE_BALANCE
}
