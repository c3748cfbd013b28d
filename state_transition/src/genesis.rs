use anyhow::{ensure, Result};
use ssz_types::VariableList;
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::{
        GENESIS_EPOCH, GENESIS_SLOT, MAX_EFFECTIVE_BALANCE, ValidatorRegistryLimit,
    },
    containers::{
        BeaconBlockBody, BeaconBlockHeader, Deposit, Eth1Data, ExecutionPayloadHeader, Fork,
    },
    primitives::Version,
};

use crate::{block_processing::apply_deposit, error::Error};

/// Seeds the pre-mined genesis state: enqueues the genesis deposits,
/// derives the initial validator set, and installs the execution payload
/// header the chain starts from.
pub fn initialize_premined_beacon_state_from_eth1(
    config: &Config,
    deposits: &[Deposit],
    payload_header: &ExecutionPayloadHeader,
    fork_version: Version,
) -> Result<BeaconState> {
    let fork = Fork {
        previous_version: fork_version,
        current_version: fork_version,
        epoch: GENESIS_EPOCH,
    };

    let deposit_root =
        VariableList::<Deposit, ValidatorRegistryLimit>::new(deposits.to_vec())
            .map_err(|_| Error::RegistryFull)?
            .tree_hash_root();

    let mut state = BeaconState {
        fork,
        slot: GENESIS_SLOT,
        latest_block_header: BeaconBlockHeader {
            slot: GENESIS_SLOT,
            body_root: BeaconBlockBody::default().tree_hash_root(),
            ..BeaconBlockHeader::default()
        },
        eth1_data: Eth1Data {
            deposit_root,
            deposit_count: deposits.len() as u64,
            block_hash: payload_header.block_hash,
        },
        ..BeaconState::default()
    };

    // Seed every mix from the execution block the chain anchors to.
    for mix in state.randao_mixes.iter_mut() {
        *mix = payload_header.block_hash;
    }

    for deposit in deposits {
        apply_deposit(config, &mut state, deposit)?;
    }

    // > Process activations
    let mut activated = 0_u64;

    for validator in state.validators.iter_mut() {
        if validator.effective_balance == MAX_EFFECTIVE_BALANCE {
            validator.activation_eligibility_epoch = GENESIS_EPOCH;
            validator.activation_epoch = GENESIS_EPOCH;
            activated += 1;
        }
    }

    ensure!(
        activated > 0,
        Error::NoGenesisValidators {
            required: MAX_EFFECTIVE_BALANCE,
        },
    );

    state.genesis_validators_root = state.validators.tree_hash_root();
    state.latest_execution_payload_header = payload_header.clone();

    Ok(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use helpers::signing::LocalSigner;
    use types::{
        containers::DepositMessage,
        primitives::{B256, ExecutionBlockHash},
    };

    use super::*;

    pub(crate) fn signed_deposit(config: &Config, seed: u8, index: u64) -> Deposit {
        let signer = LocalSigner::from_ikm(&[seed; 32]).unwrap();

        let message = DepositMessage {
            pubkey: signer.public_key(),
            withdrawal_credentials: B256::repeat_byte(seed),
            amount: MAX_EFFECTIVE_BALANCE,
        };

        let signature =
            signer.sign(helpers::signing::deposit_signing_root(config, &message));

        Deposit {
            pubkey: message.pubkey,
            withdrawal_credentials: message.withdrawal_credentials,
            amount: message.amount,
            signature,
            index,
        }
    }

    #[test]
    fn premined_genesis_activates_the_deposited_validators() {
        let config = Config::default();

        let deposits = (0..64)
            .map(|index| signed_deposit(&config, index as u8 + 1, index))
            .collect::<Vec<_>>();

        let payload_header = ExecutionPayloadHeader {
            block_hash: ExecutionBlockHash::repeat_byte(0xee),
            ..ExecutionPayloadHeader::default()
        };

        let state = initialize_premined_beacon_state_from_eth1(
            &config,
            &deposits,
            &payload_header,
            config.deneb_fork_version,
        )
        .unwrap();

        assert_eq!(state.slot, 0);
        assert_eq!(state.eth1_deposit_index, 64);
        assert_eq!(state.validators.len(), 64);
        assert_eq!(state.balances.len(), 64);
        assert!(state
            .validators
            .iter()
            .all(|validator| validator.activation_epoch == GENESIS_EPOCH));
        assert_ne!(state.genesis_validators_root, B256::ZERO);
        assert_eq!(
            state.latest_execution_payload_header.block_hash,
            payload_header.block_hash,
        );
        assert_eq!(state.randao_mixes[17], payload_header.block_hash);
    }

    #[test]
    fn genesis_fails_without_a_single_full_deposit() {
        let config = Config::default();

        let mut deposit = signed_deposit(&config, 1, 0);
        deposit.amount = MAX_EFFECTIVE_BALANCE / 2;

        // The amount is signed over, so halving it also invalidates the
        // signature and the deposit burns.
        let result = initialize_premined_beacon_state_from_eth1(
            &config,
            &[deposit],
            &ExecutionPayloadHeader::default(),
            config.deneb_fork_version,
        );

        result.unwrap_err();
    }
}
