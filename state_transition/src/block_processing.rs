use anyhow::{ensure, Result};
use ethereum_hashing::hash_fixed;
use helpers::{
    accessors::{
        get_beacon_proposer_index, get_current_epoch, get_randao_mix, validator,
        validator_index_by_pubkey,
    },
    mutators::{decrease_balance, increase_balance, slash_validator},
    predicates::{
        is_fully_withdrawable_validator, is_partially_withdrawable_validator,
        is_slashable_validator,
    },
    signing::{deposit_signing_root, randao_signing_root, verify_signature, SignatureKind},
};
use log::debug;
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    config::{Config, Phase},
    consts::{
        EFFECTIVE_BALANCE_INCREMENT, EPOCHS_PER_HISTORICAL_VECTOR, FAR_FUTURE_EPOCH,
        MAX_BLOBS_PER_BLOCK, MAX_DEPOSITS, MAX_EFFECTIVE_BALANCE, MAX_WITHDRAWALS_PER_PAYLOAD,
        MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP,
    },
    containers::{
        BeaconBlock, BeaconBlockBody, BeaconBlockHeader, Deposit, DepositMessage,
        ExecutionPayload, Validator, Withdrawal,
    },
    primitives::{Address, B256},
};

use crate::{context::ProcessingContext, error::Error};

pub fn process_block(
    config: &Config,
    context: ProcessingContext,
    state: &mut BeaconState,
    block: &BeaconBlock,
) -> Result<()> {
    // `prev_randao` in the payload commits to the mix as the proposer saw
    // it, before this block's own reveal is folded in.
    let pre_block_mix = get_randao_mix(state, get_current_epoch(state));

    process_block_header(state, block)?;
    process_randao(context, state, &block.body)?;
    process_eth1_data(state, &block.body)?;
    process_operations(config, state, &block.body)?;
    process_execution_payload(context, state, &block.body.execution_payload, pre_block_mix)?;
    process_withdrawals(state, &block.body.execution_payload)?;
    process_blob_kzg_commitments(config, state, &block.body)?;

    Ok(())
}

pub fn process_block_header(state: &mut BeaconState, block: &BeaconBlock) -> Result<()> {
    // > Verify that the slots match
    ensure!(
        block.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    // > Verify that the block is newer than latest block header
    ensure!(
        block.slot > state.latest_block_header.slot,
        Error::BlockIsNotNewer {
            header_slot: state.latest_block_header.slot,
            block_slot: block.slot,
        },
    );

    // > Verify that proposer index is the correct index
    let computed = get_beacon_proposer_index(state, block.slot)?;

    ensure!(
        block.proposer_index == computed,
        Error::ProposerMismatch {
            computed,
            in_block: block.proposer_index,
        },
    );

    // > Verify that the parent matches
    let computed_parent = state.latest_block_header.tree_hash_root();

    ensure!(
        block.parent_root == computed_parent,
        Error::ParentRootMismatch {
            computed: computed_parent,
            in_block: block.parent_root,
        },
    );

    // > Verify proposer is not slashed
    ensure!(
        !validator(state, block.proposer_index)?.slashed,
        Error::ProposerSlashed {
            index: block.proposer_index,
        },
    );

    // > Cache current block as the new latest block
    state.latest_block_header = BeaconBlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: B256::ZERO,
        body_root: block.body.tree_hash_root(),
    };

    Ok(())
}

pub fn process_randao(
    context: ProcessingContext,
    state: &mut BeaconState,
    body: &BeaconBlockBody,
) -> Result<()> {
    let epoch = get_current_epoch(state);

    // > Verify RANDAO reveal
    if !context.skip_validate_randao {
        let proposer = validator(state, state.latest_block_header.proposer_index)?;

        verify_signature(
            proposer.pubkey,
            randao_signing_root(state, epoch),
            body.randao_reveal,
            SignatureKind::Randao,
        )
        .map_err(|_| Error::RandaoInvalid)?;
    }

    // > Mix in RANDAO reveal
    let mix = get_randao_mix(state, epoch)
        ^ B256::from(hash_fixed(body.randao_reveal.as_bytes()));

    state.randao_mixes[(epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize] = mix;

    Ok(())
}

pub fn process_eth1_data(state: &mut BeaconState, body: &BeaconBlockBody) -> Result<()> {
    ensure!(
        body.eth1_data.deposit_count >= state.eth1_deposit_index,
        Error::Eth1DepositCountRegressed {
            applied: state.eth1_deposit_index,
            in_block: body.eth1_data.deposit_count,
        },
    );

    state.eth1_data = body.eth1_data;

    Ok(())
}

pub fn process_operations(
    config: &Config,
    state: &mut BeaconState,
    body: &BeaconBlockBody,
) -> Result<()> {
    for attestation in &body.attestations {
        ensure!(
            attestation.slot < state.slot,
            Error::AttestationFromFuture {
                attestation_slot: attestation.slot,
                state_slot: state.slot,
            },
        );
    }

    let epoch = get_current_epoch(state);

    for slashing in body.slashings.iter().copied() {
        ensure!(
            is_slashable_validator(validator(state, slashing.index)?, epoch),
            Error::ValidatorNotSlashable {
                index: slashing.index,
                epoch,
            },
        );

        slash_validator(state, slashing.index)?;
    }

    // > Verify that outstanding deposits are processed up to the maximum
    let expected = MAX_DEPOSITS
        .min(body.eth1_data.deposit_count.saturating_sub(state.eth1_deposit_index));

    ensure!(
        body.deposits.len() as u64 == expected,
        Error::DepositCountMismatch {
            expected,
            in_block: body.deposits.len() as u64,
        },
    );

    for deposit in body.deposits.iter() {
        apply_deposit(config, state, deposit)?;
    }

    Ok(())
}

pub(crate) fn apply_deposit(
    config: &Config,
    state: &mut BeaconState,
    deposit: &Deposit,
) -> Result<()> {
    ensure!(
        deposit.index == state.eth1_deposit_index,
        Error::DepositIndexGap {
            expected: state.eth1_deposit_index,
            actual: deposit.index,
        },
    );

    state.eth1_deposit_index += 1;

    if let Some(index) = validator_index_by_pubkey(state, deposit.pubkey) {
        return increase_balance(state, index, deposit.amount).map_err(Into::into);
    }

    let message = DepositMessage {
        pubkey: deposit.pubkey,
        withdrawal_credentials: deposit.withdrawal_credentials,
        amount: deposit.amount,
    };

    // An invalid signature burns the deposit instead of failing the block.
    if let Err(error) = verify_signature(
        deposit.pubkey,
        deposit_signing_root(config, &message),
        deposit.signature,
        SignatureKind::Deposit,
    ) {
        debug!(
            "ignoring deposit {} with an unverifiable signature: {error}",
            deposit.index,
        );
        return Ok(());
    }

    add_validator_to_registry(state, deposit)
}

fn add_validator_to_registry(state: &mut BeaconState, deposit: &Deposit) -> Result<()> {
    let effective_balance = MAX_EFFECTIVE_BALANCE
        .min(deposit.amount - deposit.amount % EFFECTIVE_BALANCE_INCREMENT);

    let validator = Validator {
        pubkey: deposit.pubkey,
        withdrawal_credentials: deposit.withdrawal_credentials,
        effective_balance,
        slashed: false,
        activation_eligibility_epoch: FAR_FUTURE_EPOCH,
        activation_epoch: FAR_FUTURE_EPOCH,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    };

    ensure!(state.validators.push(validator).is_ok(), Error::RegistryFull);
    ensure!(
        state.balances.push(deposit.amount).is_ok(),
        Error::RegistryFull,
    );

    Ok(())
}

pub fn process_execution_payload(
    context: ProcessingContext,
    state: &mut BeaconState,
    payload: &ExecutionPayload,
    pre_block_mix: B256,
) -> Result<()> {
    if !context.skip_payload_verification {
        let latest = &state.latest_execution_payload_header;

        // > Verify consistency of the parent hash with respect to the
        // > previous execution payload header
        ensure!(
            payload.parent_hash == latest.block_hash,
            Error::PayloadParentHashMismatch {
                computed: latest.block_hash,
                in_block: payload.parent_hash,
            },
        );

        // > Verify prev_randao
        ensure!(
            payload.prev_randao == pre_block_mix,
            Error::PayloadPrevRandaoMismatch {
                computed: pre_block_mix,
                in_block: payload.prev_randao,
            },
        );

        // > Verify timestamp
        ensure!(
            payload.timestamp > latest.timestamp,
            Error::PayloadTimestampNotIncreasing {
                parent: latest.timestamp,
                in_block: payload.timestamp,
            },
        );
    }

    // > Cache execution payload header
    state.latest_execution_payload_header = payload.to_header();

    Ok(())
}

pub fn process_withdrawals(state: &mut BeaconState, payload: &ExecutionPayload) -> Result<()> {
    let expected = get_expected_withdrawals(state)?;

    ensure!(
        expected.len() == payload.withdrawals.len(),
        Error::WithdrawalCountMismatch {
            computed: expected.len(),
            in_block: payload.withdrawals.len(),
        },
    );

    for (position, (computed, in_block)) in
        expected.iter().zip(payload.withdrawals.iter()).enumerate()
    {
        ensure!(computed == in_block, Error::WithdrawalMismatch { position });

        decrease_balance(state, computed.validator_index, computed.amount)?;
    }

    // > Update the next withdrawal index if this block contained withdrawals
    if let Some(latest) = expected.last() {
        state.next_withdrawal_index = latest.index + 1;
    }

    // > Update the next validator index to start the next withdrawal sweep
    if expected.len() == MAX_WITHDRAWALS_PER_PAYLOAD {
        let latest = expected
            .last()
            .expect("MAX_WITHDRAWALS_PER_PAYLOAD is nonzero");

        state.next_withdrawal_validator_index =
            (latest.validator_index + 1) % state.validators.len() as u64;
    } else if !state.validators.is_empty() {
        let next = state.next_withdrawal_validator_index + MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP;
        state.next_withdrawal_validator_index = next % state.validators.len() as u64;
    }

    Ok(())
}

/// The withdrawal sweep. Depends only on the state, so replaying at the
/// same slot yields identical output.
pub fn get_expected_withdrawals(state: &BeaconState) -> Result<Vec<Withdrawal>> {
    let epoch = get_current_epoch(state);
    let total_validators = state.validators.len() as u64;
    let bound = total_validators.min(MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP);

    let mut withdrawal_index = state.next_withdrawal_index;
    let mut validator_index = state.next_withdrawal_validator_index;
    let mut withdrawals: Vec<Withdrawal> = vec![];

    for _ in 0..bound {
        let balance = helpers::accessors::balance(state, validator_index)?;
        let validator = validator(state, validator_index)?;

        let address = Address::from_slice(&validator.withdrawal_credentials[12..]);

        if is_fully_withdrawable_validator(validator, balance, epoch) {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address,
                amount: balance,
            });

            withdrawal_index = withdrawal_index
                .checked_add(1)
                .ok_or(Error::WithdrawalIndexOverflow)?;
        } else if is_partially_withdrawable_validator(validator, balance) {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address,
                amount: balance - MAX_EFFECTIVE_BALANCE,
            });

            withdrawal_index = withdrawal_index
                .checked_add(1)
                .ok_or(Error::WithdrawalIndexOverflow)?;
        }

        if withdrawals.len() == MAX_WITHDRAWALS_PER_PAYLOAD {
            break;
        }

        validator_index = (validator_index + 1) % total_validators;
    }

    Ok(withdrawals)
}

pub fn process_blob_kzg_commitments(
    config: &Config,
    state: &BeaconState,
    body: &BeaconBlockBody,
) -> Result<()> {
    let count = body.blob_kzg_commitments.len() as u64;

    match config.phase_at_slot(state.slot) {
        Phase::Capella => ensure!(count == 0, Error::CommitmentsBeforeDeneb),
        Phase::Deneb => ensure!(
            count <= MAX_BLOBS_PER_BLOCK,
            Error::TooManyCommitments {
                maximum: MAX_BLOBS_PER_BLOCK,
                in_block: count,
            },
        ),
    }

    Ok(())
}
